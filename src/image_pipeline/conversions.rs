//! Pipeline conversions module
//!
//! This module contains the orchestration of one raw exposure into one
//! written sRGB image, and the task records the batch scheduler hands out.

mod raw_to_srgb;
mod task;

#[cfg(test)]
mod tests;

pub use raw_to_srgb::RawToSrgbPipeline;
pub use task::{ConversionTask, TaskFailure, TaskOutcome, TaskSuccess, archive_base_name};
