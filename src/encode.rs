//! Streaming PNG encode from a raster region.

use std::io::Write;

use crate::color;
use crate::config::EncodeConfig;
use crate::pixel::{BitDepth, PixelFormat};
use crate::raster::{Raster, Region};
use crate::stream::SinkStream;
use crate::{CodecError, Limits, negotiate};

/// Summary of a finished encode.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOutput {
    pub width: u32,
    pub height: u32,
    /// Format the rows were stored in.
    pub pixel_format: PixelFormat,
    /// Bytes handed to the sink.
    pub bytes_written: u64,
}

/// PNG encode request builder.
///
/// # Example
///
/// ```no_run
/// use pngstream::{EncodeRequest, PixelBuffer, PixelFormat};
/// use pngstream::pixel::{ImgVec, Rgba};
///
/// let pixels = ImgVec::new(vec![Rgba::new(0u8, 0, 0, 255); 100 * 100], 100, 100);
/// let buffer = PixelBuffer::from_rgba8(pixels.as_ref());
/// let png = EncodeRequest::new()
///     .with_compression_level(6)
///     .with_bit_depth(8)
///     .encode_to_vec(&buffer)?;
/// # Ok::<(), pngstream::CodecError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct EncodeRequest<'a> {
    config: EncodeConfig,
    region: Option<Region>,
    limits: Option<&'a Limits>,
}

impl<'a> EncodeRequest<'a> {
    /// Encode the whole raster with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all encoder settings.
    pub fn with_config(mut self, config: EncodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set zlib effort (1..=9).
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.config = self.config.with_compression_level(level);
        self
    }

    /// Request a sample depth; only 16 keeps 16-bit samples.
    pub fn with_bit_depth(mut self, bits: u32) -> Self {
        self.config = self.config.with_bit_depth(bits);
        self
    }

    /// Set the row filter strategy.
    pub fn with_filter(mut self, filter: png::Filter) -> Self {
        self.config = self.config.with_filter(filter);
        self
    }

    /// Encode only `region` of the source.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Encode into a byte vector.
    pub fn encode_to_vec<S: Raster + ?Sized>(&self, source: &S) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode(source, &mut out)?;
        Ok(out)
    }

    /// Encode `source` and write the complete PNG to `sink`.
    pub fn encode<S, W>(&self, source: &S, sink: &mut W) -> Result<EncodeOutput, CodecError>
    where
        S: Raster + ?Sized,
        W: Write,
    {
        let (raster_width, raster_height) = source.dimensions();
        let region = self
            .region
            .unwrap_or_else(|| Region::full(raster_width, raster_height));
        if region.is_empty() {
            return Err(CodecError::InvalidInput(format!(
                "empty region {}x{}",
                region.width, region.height
            )));
        }
        if !region.fits_within(raster_width, raster_height) {
            return Err(CodecError::InvalidInput(format!(
                "region {:?} outside {}x{} raster",
                region, raster_width, raster_height
            )));
        }

        let format = negotiate::encode_format(source.pixel_format(), self.config.bit_depth());
        let row_bytes = format.row_bytes(region.width);
        if let Some(limits) = self.limits {
            limits.check_header(region.width, region.height)?;
            limits.check_row_buffers(row_bytes as u64)?;
        }

        let plan = color::plan_chunks(&format.color_space, !format.layout.is_gray());
        log::debug!(
            "encoding {}x{} as {} at level {}, {} color chunks",
            region.width,
            region.height,
            format,
            self.config.compression_level(),
            plan.len()
        );

        let mut sink = SinkStream::new(sink);
        {
            let mut encoder = png::Encoder::new(&mut sink, region.width, region.height);
            encoder.set_color(negotiate::png_color_type(format.layout));
            encoder.set_depth(negotiate::png_bit_depth(format.depth));
            encoder.set_compression(self.config.compression());
            encoder.set_filter(self.config.filter());

            let mut writer = encoder.write_header().map_err(CodecError::from_encoding)?;
            for chunk in &plan {
                write_chunk(&mut writer, chunk.chunk_type(), &chunk.payload())?;
            }
            write_chunk(&mut writer, *b"bKGD", &white_background(&format))?;

            {
                let mut rows = writer
                    .stream_writer()
                    .map_err(CodecError::from_encoding)?;
                let mut row = vec![0u8; row_bytes];
                for y in 0..region.height {
                    source.read_row(region.x, region.y + i64::from(y), region.width, &format, &mut row)?;
                    if format.depth == BitDepth::Sixteen {
                        native_to_be(&mut row);
                    }
                    rows.write_all(&row)?;
                }
                rows.finish().map_err(CodecError::from_encoding)?;
            }
            writer.finish().map_err(CodecError::from_encoding)?;
        }
        sink.finish()?;

        Ok(EncodeOutput {
            width: region.width,
            height: region.height,
            pixel_format: format,
            bytes_written: sink.bytes_written(),
        })
    }
}

/// Encode `region` of `source` as a PNG into `sink`.
///
/// `compression_level` runs 1..=9; `bit_depth` 16 keeps 16-bit samples and
/// any other value writes 8.
pub fn encode<S, W>(
    source: &S,
    region: Region,
    sink: &mut W,
    compression_level: u8,
    bit_depth: u32,
) -> Result<(), CodecError>
where
    S: Raster + ?Sized,
    W: Write,
{
    EncodeRequest::new()
        .with_region(region)
        .with_compression_level(compression_level)
        .with_bit_depth(bit_depth)
        .encode(source, sink)?;
    Ok(())
}

fn write_chunk<W: Write>(
    writer: &mut png::Writer<W>,
    kind: [u8; 4],
    data: &[u8],
) -> Result<(), CodecError> {
    writer
        .write_chunk(png::chunk::ChunkType(kind), data)
        .map_err(CodecError::from_encoding)
}

/// bKGD payload for opaque white at the output depth.
fn white_background(format: &PixelFormat) -> Vec<u8> {
    let white: u16 = match format.depth {
        BitDepth::Eight => 0xFF,
        BitDepth::Sixteen => 0xFFFF,
    };
    let channels = if format.layout.is_gray() { 1 } else { 3 };
    (0..channels).flat_map(|_| white.to_be_bytes()).collect()
}

fn native_to_be(samples: &mut [u8]) {
    for pair in samples.chunks_exact_mut(2) {
        let v = u16::from_ne_bytes([pair[0], pair[1]]);
        pair.copy_from_slice(&v.to_be_bytes());
    }
}
