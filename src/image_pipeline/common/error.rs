use thiserror::Error;

/// Coarse classification of a [`ConversionError`], used when folding task
/// failures into a batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Shape,
    Data,
    Io,
    Interrupted,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Shape => "shape",
            ErrorKind::Data => "data",
            ErrorKind::Io => "io",
            ErrorKind::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("unrecognized white balancing strategy: {0}")]
    UnknownWhiteBalance(String),

    #[error("Gamma factor must be a positive finite number, got {0}")]
    InvalidGamma(f32),

    #[error("Unsupported tensor shape {shape:?}: {reason}")]
    UnsupportedShape { shape: Vec<usize>, reason: String },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Channel '{channel}' has degenerate mean {mean}")]
    DegenerateChannel { channel: &'static str, mean: f64 },

    #[error("Archive has no '{0}' record")]
    MissingRecord(String),

    #[error("Record '{record}' has an unsupported element type ({detail})")]
    UnsupportedElementType { record: String, detail: String },

    #[error("Demosaic failed: {0}")]
    DemosaicError(String),

    #[error("Conversion panicked: {0}")]
    TaskPanicked(String),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to decode archive: {0}")]
    DecodeError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to encode PNG image: {0}")]
    EncodeError(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPoolError(String),

    #[error("Batch interrupted: {abandoned} conversions abandoned")]
    Interrupted { abandoned: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::UnknownWhiteBalance(_) | ConversionError::InvalidGamma(_) => {
                ErrorKind::Configuration
            }
            ConversionError::UnsupportedShape { .. } | ConversionError::InvalidDimensions(..) => {
                ErrorKind::Shape
            }
            ConversionError::DegenerateChannel { .. }
            | ConversionError::MissingRecord(_)
            | ConversionError::UnsupportedElementType { .. }
            | ConversionError::DemosaicError(_)
            | ConversionError::TaskPanicked(_) => ErrorKind::Data,
            ConversionError::InputReadError(_)
            | ConversionError::DecodeError(_)
            | ConversionError::OutputWriteError(_)
            | ConversionError::EncodeError(_)
            | ConversionError::WorkerPoolError(_)
            | ConversionError::IoError(_) => ErrorKind::Io,
            ConversionError::Interrupted { .. } => ErrorKind::Interrupted,
        }
    }

    pub(crate) fn shape(shape: &[usize], reason: impl Into<String>) -> Self {
        ConversionError::UnsupportedShape {
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
