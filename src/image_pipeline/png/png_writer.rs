use std::io::Write;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::{ConversionConfig, PngCompression};
use crate::image_pipeline::png::writer::ImageWriter;
use crate::image_pipeline::tone::SrgbImage;

pub struct PngImageWriter;

impl ImageWriter for PngImageWriter {
    fn write_image(&self, image: &SrgbImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!("Encoding PNG image: {}x{}", image.width, image.height);

        let compression = match config.compression {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        };

        let (width, height) = match (u32::try_from(image.width), u32::try_from(image.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(ConversionError::InvalidDimensions(image.width, image.height)),
        };

        let expected = image.width * image.height * 3;
        if image.data.len() != expected {
            return Err(ConversionError::EncodeError(format!(
                "buffer holds {} bytes, expected {}",
                image.data.len(),
                expected
            )));
        }

        let mut buffer = Vec::new();
        PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive)
            .write_image(&image.data, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("PNG encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}
