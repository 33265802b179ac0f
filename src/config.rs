//! Encoder configuration and re-exports.
//!
//! [`EncodeConfig`] bundles the knobs an [`EncodeRequest`](crate::EncodeRequest)
//! hands to the `png` encoder.

/// PNG configuration types from the png crate.
pub mod png_codec {
    pub use png::{Compression, Filter};
}

/// Default zlib effort, on the 1..=9 scale.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 3;

/// Default requested sample depth in bits.
pub const DEFAULT_BIT_DEPTH: u32 = 16;

/// Encoder settings.
///
/// # Example
///
/// ```
/// use pngstream::config::{EncodeConfig, png_codec::Filter};
///
/// let config = EncodeConfig::default()
///     .with_compression_level(9)
///     .with_bit_depth(8)
///     .with_filter(Filter::Paeth);
/// assert_eq!(config.compression_level(), 9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeConfig {
    compression_level: u8,
    bit_depth: u32,
    filter: png::Filter,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            bit_depth: DEFAULT_BIT_DEPTH,
            filter: png::Filter::default(),
        }
    }
}

impl EncodeConfig {
    /// Set zlib effort. Values are clamped to 1..=9.
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level.clamp(1, 9);
        self
    }

    /// Request a sample depth. 16 keeps 16-bit samples; anything else writes 8.
    pub fn with_bit_depth(mut self, bits: u32) -> Self {
        self.bit_depth = bits;
        self
    }

    /// Set the row filter strategy.
    pub fn with_filter(mut self, filter: png::Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn compression_level(&self) -> u8 {
        self.compression_level
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    pub fn filter(&self) -> png::Filter {
        self.filter
    }

    /// `png` compression preset for the configured level.
    pub(crate) fn compression(&self) -> png::Compression {
        match self.compression_level {
            0..=2 => png::Compression::Fast,
            3..=6 => png::Compression::Balanced,
            _ => png::Compression::High,
        }
    }
}
