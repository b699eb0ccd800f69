//! White balance estimation
//!
//! Estimates red and blue gains from the Bayer planes of one exposure. Green
//! is the reference channel and always keeps a gain of 1.0.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::BayerPlanes;

/// How red and blue gains are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WhiteBalanceStrategy {
    /// Scale red and blue so their means match the mean green level.
    #[default]
    GrayWorld,
    /// Identity gains.
    None,
}

impl WhiteBalanceStrategy {
    pub const ALL: [WhiteBalanceStrategy; 2] =
        [WhiteBalanceStrategy::GrayWorld, WhiteBalanceStrategy::None];

    /// Name used in configuration and in output file suffixes.
    pub fn as_str(self) -> &'static str {
        match self {
            WhiteBalanceStrategy::GrayWorld => "grayworld",
            WhiteBalanceStrategy::None => "none",
        }
    }

    pub fn estimate(self, planes: &BayerPlanes) -> Result<WhiteBalanceGains> {
        match self {
            WhiteBalanceStrategy::GrayWorld => gray_world(planes),
            WhiteBalanceStrategy::None => Ok(WhiteBalanceGains::IDENTITY),
        }
    }
}

impl fmt::Display for WhiteBalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhiteBalanceStrategy {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grayworld" => Ok(WhiteBalanceStrategy::GrayWorld),
            "none" => Ok(WhiteBalanceStrategy::None),
            other => Err(ConversionError::UnknownWhiteBalance(other.to_string())),
        }
    }
}

/// Per-channel multipliers. Green is implicitly 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteBalanceGains {
    pub r_scale: f32,
    pub b_scale: f32,
}

impl WhiteBalanceGains {
    pub const IDENTITY: WhiteBalanceGains = WhiteBalanceGains {
        r_scale: 1.0,
        b_scale: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        self.r_scale == 1.0 && self.b_scale == 1.0
    }

    /// Multiplies the red and blue planes in place.
    pub fn apply(&self, planes: &mut BayerPlanes) {
        if self.is_identity() {
            return;
        }
        planes.r *= self.r_scale;
        planes.b *= self.b_scale;
    }
}

fn mean(plane: &Array2<f32>) -> f64 {
    if plane.is_empty() {
        return f64::NAN;
    }
    plane.iter().map(|&v| v as f64).sum::<f64>() / plane.len() as f64
}

fn checked_mean(plane: &Array2<f32>, channel: &'static str) -> Result<f64> {
    let value = mean(plane);
    if value == 0.0 || !value.is_finite() {
        return Err(ConversionError::DegenerateChannel { channel, mean: value });
    }
    Ok(value)
}

fn gray_world(planes: &BayerPlanes) -> Result<WhiteBalanceGains> {
    let avg_g = (mean(&planes.g1) + mean(&planes.g2)) / 2.0;
    let avg_r = checked_mean(&planes.r, "r")?;
    let avg_b = checked_mean(&planes.b, "b")?;

    let gains = WhiteBalanceGains {
        r_scale: (avg_g / avg_r) as f32,
        b_scale: (avg_g / avg_b) as f32,
    };
    debug!(
        avg_r, avg_g, avg_b,
        r_scale = gains.r_scale,
        b_scale = gains.b_scale,
        "Gray-world gains"
    );
    Ok(gains)
}
