use ndarray::{Array2, ArrayD};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::types::RawExposure;

/// The four colour-filter planes of one exposure, each H×W.
///
/// Owned by a single conversion; white balance rescales `r` and `b` in place.
#[derive(Debug, Clone, PartialEq)]
pub struct BayerPlanes {
    pub b: Array2<f32>,
    pub g1: Array2<f32>,
    pub g2: Array2<f32>,
    pub r: Array2<f32>,
}

impl BayerPlanes {
    /// Copies planes out of a resolved exposure by fixed position
    /// (0=b, 1=g1, 2=g2, 3=r), whatever the tensor layout was.
    pub fn from_exposure(exposure: &RawExposure) -> Self {
        Self {
            b: exposure.bayer_plane(0).to_owned(),
            g1: exposure.bayer_plane(1).to_owned(),
            g2: exposure.bayer_plane(2).to_owned(),
            r: exposure.bayer_plane(3).to_owned(),
        }
    }

    /// Builds planes filled with constants, mostly useful for calibration
    /// targets and tests.
    pub fn uniform(height: usize, width: usize, b: f32, g1: f32, g2: f32, r: f32) -> Self {
        Self {
            b: Array2::from_elem((height, width), b),
            g1: Array2::from_elem((height, width), g1),
            g2: Array2::from_elem((height, width), g2),
            r: Array2::from_elem((height, width), r),
        }
    }

    /// Spatial size as (height, width).
    pub fn dims(&self) -> (usize, usize) {
        self.g1.dim()
    }

    /// Checks that all four planes share one shape.
    pub fn validate(&self) -> Result<()> {
        let dims = self.dims();
        for plane in [&self.b, &self.g2, &self.r] {
            if plane.dim() != dims {
                return Err(ConversionError::shape(
                    plane.shape(),
                    format!("plane does not match the {}x{} green plane", dims.0, dims.1),
                ));
            }
        }
        Ok(())
    }
}

/// Resolves the layout of a raw record and extracts its Bayer planes.
pub fn extract_planes(record: &ArrayD<f32>) -> Result<BayerPlanes> {
    let exposure = RawExposure::resolve(record)?;
    let (height, width) = exposure.spatial_dims();
    debug!(
        "Extracting {} planes ({:?}) at {}x{}",
        exposure.channels(),
        exposure.layout(),
        height,
        width
    );
    Ok(BayerPlanes::from_exposure(&exposure))
}
