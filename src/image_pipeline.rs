//! Image processing pipeline module
//!
//! This module provides a structured approach to turning raw multi-exposure
//! captures into sRGB PNGs, with separate modules for archive reading, white
//! balance, demosaicing, tone mapping, PNG writing and batch orchestration.

pub mod raw;
pub mod white_balance;
pub mod debayer;
pub mod tone;
pub mod png;
pub mod config;
pub mod timing;
pub mod conversions;
pub mod batch;
pub mod common;

pub use common::{
    ConversionError,
    ErrorKind,
    Result,
};

pub use config::{
    ChannelOrder,
    ConversionConfig,
    ConversionConfigBuilder,
    PngCompression,
};

pub use raw::{
    CaptureReader,
    ExposureKey,
    NpzCaptureReader,
    RawCapture,
};

pub use white_balance::WhiteBalanceStrategy;

pub use png::{
    ImageWriter,
    PngImageWriter,
};

pub use conversions::{
    ConversionTask,
    RawToSrgbPipeline,
    TaskOutcome,
};

pub use batch::{
    BatchConfig,
    BatchReport,
    BatchScheduler,
    BatchState,
    InterruptHandle,
};
