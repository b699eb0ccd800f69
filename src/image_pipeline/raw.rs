//! RAW capture reading module
//!
//! This module decodes capture archives into exposure tensors and splits
//! each exposure into its Bayer channel planes.

mod reader;
mod npz_reader;
mod extractor;
pub mod types;

pub use reader::CaptureReader;
pub use npz_reader::NpzCaptureReader;
pub use extractor::{BayerPlanes, extract_planes};
pub use types::{ChannelLayout, ExposureKey, RawCapture, RawExposure};
