use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::RawCapture;

pub trait CaptureReader {
    /// Decodes a whole capture archive held in memory.
    fn read_capture(&self, base_name: &str, data: &[u8]) -> Result<RawCapture>;
}
