//! Debayering module for reconstructing RGB images from Bayer planes

pub mod cpu_debayer;
pub mod types;

pub use cpu_debayer::CpuDebayer;
pub use types::{DenseImage, MosaicImage};
