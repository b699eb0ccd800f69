//! Gamma encoding and 8-bit quantization.

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::ChannelOrder;
use crate::image_pipeline::debayer::DenseImage;

/// 8-bit, 3-channel image ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrgbImage {
    pub width: usize,
    pub height: usize,
    /// Interleaved samples, three per pixel, in `channel_order`
    pub data: Vec<u8>,
    pub channel_order: ChannelOrder,
}

impl SrgbImage {
    /// Samples at (x, y), or `None` outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        self.data.get(i..i + 3).map(|s| [s[0], s[1], s[2]])
    }
}

/// Applies `out = in^(1/gamma)`, scales to [0, 255] and truncates to u8.
#[derive(Debug, Clone, Copy)]
pub struct ToneMapper {
    inv_gamma: f64,
    channel_order: ChannelOrder,
}

impl ToneMapper {
    pub fn new(gamma: f32, channel_order: ChannelOrder) -> Result<Self> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(ConversionError::InvalidGamma(gamma));
        }
        Ok(Self {
            inv_gamma: 1.0 / gamma as f64,
            channel_order,
        })
    }

    pub fn map_value(&self, value: f64) -> u8 {
        (value.powf(self.inv_gamma) * 255.0).clamp(0.0, 255.0) as u8
    }

    pub fn apply(&self, image: &DenseImage) -> SrgbImage {
        let mut data: Vec<u8> = image.data.iter().map(|&v| self.map_value(v)).collect();
        if self.channel_order == ChannelOrder::Bgr {
            for pixel in data.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
        }
        SrgbImage {
            width: image.width(),
            height: image.height(),
            data,
            channel_order: self.channel_order,
        }
    }
}
