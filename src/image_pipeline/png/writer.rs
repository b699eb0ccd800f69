use std::io::Write;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::ConversionConfig;
use crate::image_pipeline::tone::SrgbImage;

pub trait ImageWriter {
    fn write_image(&self, image: &SrgbImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
