//! Types for debayering operations

use ndarray::{Array2, Array3};

/// Single-plane Bayer mosaic at twice the plane resolution.
///
/// Sites are tiled as
///
/// ```text
///        even col  odd col
/// even     b        g2
/// odd      g1       r
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicImage {
    pub data: Array2<f32>,
}

impl MosaicImage {
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }
}

/// Demosaiced image, (height, width, 3) in RGB order, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct DenseImage {
    pub data: Array3<f64>,
}

impl DenseImage {
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }
}
