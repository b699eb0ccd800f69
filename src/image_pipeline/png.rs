//! PNG writing module

mod writer;
mod png_writer;

pub use writer::ImageWriter;
pub use png_writer::PngImageWriter;
