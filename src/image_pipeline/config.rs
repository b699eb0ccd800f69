//! Conversion configuration types

/// Default gamma applied by the tone mapper.
pub const DEFAULT_GAMMA: f32 = 2.2;

/// PNG compression levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    /// Fast compression (larger files)
    Fast,
    /// Encoder default (balanced)
    Default,
    /// Best compression (slowest)
    Best,
}

/// Byte order of the three samples of each output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Red, green, blue
    Rgb,
    /// Blue, green, red. Matches PNGs produced by tools that wrote the
    /// interpolation routine's BGR buffer without reordering it.
    Bgr,
}

/// Configuration for a single raw to sRGB conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Gamma factor, output = input^(1/gamma)
    pub gamma: f32,
    /// PNG compression level
    pub compression: PngCompression,
    /// Sample order of the written pixels
    pub channel_order: ChannelOrder,
    /// Whether to reject exposures with an empty spatial axis before extraction
    pub validate_dimensions: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            compression: PngCompression::Default,
            channel_order: ChannelOrder::Rgb,
            validate_dimensions: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    gamma: Option<f32>,
    compression: Option<PngCompression>,
    channel_order: Option<ChannelOrder>,
    validate_dimensions: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn compression(mut self, compression: PngCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = Some(order);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            gamma: self.gamma.unwrap_or(default.gamma),
            compression: self.compression.unwrap_or(default.compression),
            channel_order: self.channel_order.unwrap_or(default.channel_order),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}
