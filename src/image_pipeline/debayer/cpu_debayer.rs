use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use ndarray::{Array2, Array3, s};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::debayer::types::{DenseImage, MosaicImage};
use crate::image_pipeline::raw::BayerPlanes;

/// Full scale of the 16-bit intermediate the interpolation runs on.
const U16_SCALE: f32 = 65535.0;

/// Bilinear demosaicing on the CPU.
///
/// The mosaic is quantized to 16 bits before interpolation and normalized
/// back afterwards, so results match reference output produced the same way.
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn new() -> Self {
        Self
    }

    /// Places each plane on its sub-grid of a (2H)×(2W) mosaic.
    ///
    /// The four sub-grids tile the mosaic exactly: every site is written once.
    pub fn assemble(&self, planes: &BayerPlanes) -> Result<MosaicImage> {
        planes.validate()?;
        let (height, width) = planes.dims();
        if height == 0 || width == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        let mut data = Array2::<f32>::zeros((height * 2, width * 2));
        data.slice_mut(s![1..;2, 1..;2]).assign(&planes.r);
        data.slice_mut(s![..;2, 1..;2]).assign(&planes.g2);
        data.slice_mut(s![1..;2, ..;2]).assign(&planes.g1);
        data.slice_mut(s![..;2, ..;2]).assign(&planes.b);

        Ok(MosaicImage { data })
    }

    /// Interpolates the mosaic into a dense RGB image.
    pub fn interpolate(&self, mosaic: &MosaicImage) -> Result<DenseImage> {
        let width = mosaic.width();
        let height = mosaic.height();
        debug!("Starting CPU debayering for mosaic {}x{}", width, height);

        let bayer_bytes: Vec<u8> = mosaic
            .data
            .iter()
            .flat_map(|&v| to_u16(v).to_le_bytes())
            .collect();

        // b sits at the top-left site, r one step down and right
        let mut output_buf = vec![0u8; width * height * 3 * 2];
        {
            let mut output_raster =
                RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);
            bayer::run_demosaic(
                &mut Cursor::new(&bayer_bytes[..]),
                BayerDepth::Depth16LE,
                CFA::BGGR,
                Demosaic::Linear,
                &mut output_raster,
            )
            .map_err(|e| ConversionError::DemosaicError(format!("{:?}", e)))?;
        }

        let rgb: Vec<f64> = output_buf
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]) as f64 / U16_SCALE as f64)
            .collect();
        let data = Array3::from_shape_vec((height, width, 3), rgb)
            .map_err(|e| ConversionError::DemosaicError(e.to_string()))?;

        Ok(DenseImage { data })
    }

    pub fn process(&self, planes: &BayerPlanes) -> Result<DenseImage> {
        let mosaic = self.assemble(planes)?;
        self.interpolate(&mosaic)
    }
}

impl Default for CpuDebayer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_u16(value: f32) -> u16 {
    (value * U16_SCALE).round().clamp(0.0, U16_SCALE) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn distinct_planes() -> BayerPlanes {
        BayerPlanes::uniform(4, 5, 0.1, 0.2, 0.3, 0.4)
    }

    #[test]
    fn test_quadrant_assignment() {
        let mosaic = CpuDebayer::new().assemble(&distinct_planes()).unwrap();
        assert_eq!((mosaic.height(), mosaic.width()), (8, 10));

        for ((y, x), &v) in mosaic.data.indexed_iter() {
            let expected = match (y % 2, x % 2) {
                (0, 0) => 0.1,
                (1, 0) => 0.2,
                (0, 1) => 0.3,
                _ => 0.4,
            };
            assert_eq!(v, expected, "site ({y}, {x})");
        }
    }

    #[test]
    fn test_doubles_resolution_with_three_channels() {
        let dense = CpuDebayer::new().process(&distinct_planes()).unwrap();
        assert_eq!(dense.data.dim(), (8, 10, 3));
        assert!(dense.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_uniform_mosaic_stays_uniform() {
        let planes = BayerPlanes::uniform(6, 6, 0.3, 0.3, 0.3, 0.3);
        let dense = CpuDebayer::new().process(&planes).unwrap();
        for &v in dense.data.iter() {
            assert_abs_diff_eq!(v, 0.3, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_interior_sites_interpolate_bilinearly() {
        let dense = CpuDebayer::new().process(&distinct_planes()).unwrap();
        let green = (0.2 + 0.3) / 2.0;

        // red site
        assert_abs_diff_eq!(dense.data[[3, 3, 0]], 0.4, epsilon = 1e-4);
        assert_abs_diff_eq!(dense.data[[3, 3, 1]], green, epsilon = 1e-4);
        assert_abs_diff_eq!(dense.data[[3, 3, 2]], 0.1, epsilon = 1e-4);

        // blue site
        assert_abs_diff_eq!(dense.data[[4, 4, 0]], 0.4, epsilon = 1e-4);
        assert_abs_diff_eq!(dense.data[[4, 4, 1]], green, epsilon = 1e-4);
        assert_abs_diff_eq!(dense.data[[4, 4, 2]], 0.1, epsilon = 1e-4);
    }

    #[test]
    fn test_quantization_clips_out_of_range_values() {
        assert_eq!(to_u16(-0.5), 0);
        assert_eq!(to_u16(1.5), u16::MAX);
        assert_eq!(to_u16(0.5), 32768);
    }

    #[test]
    fn test_empty_planes_are_rejected() {
        let planes = BayerPlanes::uniform(0, 4, 0.1, 0.1, 0.1, 0.1);
        let err = CpuDebayer::new().assemble(&planes).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidDimensions(4, 0)));
    }
}
