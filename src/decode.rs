//! Streaming PNG decode into a caller-supplied raster.

use std::io::{Read, Seek};

use crate::info::{ImageDescriptor, read_header};
use crate::interlace::PassPlan;
use crate::pixel::{BitDepth, PixelFormat, convert_row};
use crate::raster::Raster;
use crate::stream::SourceStream;
use crate::{CodecError, Limits, negotiate};

/// Result of a successful decode.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeOutput {
    /// Dimensions and the format rows were written in.
    pub descriptor: ImageDescriptor,
}

impl DecodeOutput {
    /// Image width in pixels (convenience accessor).
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Image height in pixels (convenience accessor).
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }
}

/// PNG decode request builder.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use pngstream::{DecodeRequest, PixelBuffer, PixelFormat};
///
/// let mut file = File::open("photo.png")?;
/// let mut dest = PixelBuffer::new(640, 480, PixelFormat::RGBA8);
/// let output = DecodeRequest::new(&mut file)
///     .with_target_format(PixelFormat::RGBA8)
///     .decode_into(&mut dest)?;
/// println!("{}x{}", output.width(), output.height());
/// # Ok::<(), pngstream::CodecError>(())
/// ```
pub struct DecodeRequest<'a, R> {
    stream: &'a mut R,
    offset: (i64, i64),
    target: Option<PixelFormat>,
    limits: Option<&'a Limits>,
}

impl<'a, R: Read + Seek> DecodeRequest<'a, R> {
    /// Decode from the current position of `stream`.
    ///
    /// Rows land at the destination origin in the negotiated format.
    pub fn new(stream: &'a mut R) -> Self {
        Self {
            stream,
            offset: (0, 0),
            target: None,
            limits: None,
        }
    }

    /// Place image row 0, column 0 at `(x, y)` of the destination.
    pub fn with_offset(mut self, x: i64, y: i64) -> Self {
        self.offset = (x, y);
        self
    }

    /// Write rows in `format` instead of the format negotiated from the header.
    pub fn with_target_format(mut self, format: PixelFormat) -> Self {
        self.target = Some(format);
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Decode every row into `destination`.
    ///
    /// On failure, rows already written stay written.
    pub fn decode_into<D: Raster + ?Sized>(
        self,
        destination: &mut D,
    ) -> Result<DecodeOutput, CodecError> {
        let mut source = SourceStream::new(&mut *self.stream);
        let start = source.position()?;
        let (_, mut descriptor) = read_header(&mut source, self.limits)?;

        let wire = descriptor.pixel_format.clone();
        let target = self.target.unwrap_or_else(|| wire.clone());
        let (width, height) = (descriptor.width, descriptor.height);

        let row_bytes = wire.row_bytes(width) as u64 + target.row_bytes(width) as u64 * 2;
        if let Some(limits) = self.limits {
            limits.check_row_buffers(row_bytes)?;
        }

        source.rewind_to(start)?;
        let mut decoder = png::Decoder::new_with_limits(
            source,
            self.limits.map(Limits::to_png).unwrap_or_default(),
        );
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder.read_info().map_err(CodecError::from_decoding)?;

        let (color_type, bit_depth) = reader.output_color_type();
        let wire_depth = match bit_depth {
            png::BitDepth::Sixteen => BitDepth::Sixteen,
            _ => BitDepth::Eight,
        };
        if negotiate::layout_of(color_type) != wire.layout || wire_depth != wire.depth {
            return Err(CodecError::bitstream(format!(
                "decoder produces {:?}/{:?}, header promised {}",
                color_type, bit_depth, wire
            )));
        }

        let plan = PassPlan::new(descriptor.interlaced);
        let (ox, oy) = self.offset;
        if ox.checked_add(i64::from(width)).is_none() || oy.checked_add(i64::from(height)).is_none() {
            return Err(CodecError::InvalidInput(format!(
                "offset ({}, {}) overflows for a {}x{} image",
                ox, oy, width, height
            )));
        }
        let target_bpp = target.bytes_per_pixel();

        let mut packed = vec![0u8; wire.row_bytes(width)];
        let mut converted = vec![0u8; target.row_bytes(width)];
        let mut row = vec![0u8; target.row_bytes(width)];
        let mut first = true;

        for pass in plan.passes() {
            if pass.is_empty(width, height) {
                continue;
            }
            let columns = pass.columns(width);
            log::trace!(
                "pass {}/{}: {} columns, {} rows",
                pass.index,
                plan.len(),
                columns,
                pass.rows(height)
            );

            for y in 0..height {
                let in_pass = pass.contains_row(y);
                if !first && !in_pass {
                    continue;
                }
                let dest_y = oy + i64::from(y);

                if first {
                    row.fill(0);
                } else {
                    destination.read_row(ox, dest_y, width, &target, &mut row)?;
                }

                if in_pass {
                    let sub = &mut packed[..wire.row_bytes(columns)];
                    reader
                        .read_row(sub)
                        .map_err(CodecError::from_decoding)?
                        .ok_or_else(|| CodecError::bitstream("image data ended early"))?;
                    if wire.depth == BitDepth::Sixteen {
                        be_to_native(sub);
                    }
                    let out = &mut converted[..target.row_bytes(columns)];
                    convert_row(&wire, sub, &target, out, columns);
                    pass.scatter(out, &mut row, target_bpp);
                }

                destination.write_row(ox, dest_y, width, &target, &row)?;
            }
            first = false;
        }

        reader.finish().map_err(CodecError::from_decoding)?;
        log::trace!("decoded {}x{} as {}", width, height, target);

        descriptor.pixel_format = target;
        Ok(DecodeOutput { descriptor })
    }
}

/// Decode a PNG stream into `destination` with its top-left pixel at `offset`.
///
/// `target` overrides the format rows are written in. Returns the image
/// width and height.
pub fn decode<R, D>(
    stream: &mut R,
    destination: &mut D,
    offset: (i64, i64),
    target: Option<PixelFormat>,
) -> Result<(u32, u32), CodecError>
where
    R: Read + Seek,
    D: Raster + ?Sized,
{
    let mut request = DecodeRequest::new(stream).with_offset(offset.0, offset.1);
    if let Some(format) = target {
        request = request.with_target_format(format);
    }
    let output = request.decode_into(destination)?;
    Ok((output.width(), output.height()))
}

/// Swap big-endian 16-bit samples to native order in place.
fn be_to_native(samples: &mut [u8]) {
    for pair in samples.chunks_exact_mut(2) {
        let v = u16::from_be_bytes([pair[0], pair[1]]);
        pair.copy_from_slice(&v.to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelBuffer;
    use std::io::Cursor;

    fn encode_gray8(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(pixels).unwrap();
        writer.finish().unwrap();
        out
    }

    #[test]
    fn builder_pattern() {
        let mut cursor = Cursor::new(Vec::new());
        let request = DecodeRequest::new(&mut cursor)
            .with_offset(3, -2)
            .with_target_format(PixelFormat::RGB8);
        assert_eq!(request.offset, (3, -2));
        assert_eq!(request.target, Some(PixelFormat::RGB8));
    }

    #[test]
    fn decodes_at_offset() {
        let png = encode_gray8(2, 2, &[1, 2, 3, 4]);
        let mut dest = PixelBuffer::new(4, 4, PixelFormat::GRAY8);
        let dims = decode(&mut Cursor::new(png), &mut dest, (1, 2), None).unwrap();
        assert_eq!(dims, (2, 2));
        assert_eq!(dest.row(2).unwrap(), &[0, 1, 2, 0]);
        assert_eq!(dest.row(3).unwrap(), &[0, 3, 4, 0]);
    }

    #[test]
    fn target_format_overrides() {
        let png = encode_gray8(2, 1, &[0, 255]);
        let mut dest = PixelBuffer::new(2, 1, PixelFormat::RGBA8);
        let out = DecodeRequest::new(&mut Cursor::new(png))
            .with_target_format(PixelFormat::RGBA8)
            .decode_into(&mut dest)
            .unwrap();
        assert_eq!(out.descriptor.pixel_format, PixelFormat::RGBA8);
        assert_eq!(dest.as_bytes(), &[0, 0, 0, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn out_of_bounds_destination_fails() {
        let png = encode_gray8(2, 2, &[1, 2, 3, 4]);
        let mut dest = PixelBuffer::new(2, 1, PixelFormat::GRAY8);
        let err = decode(&mut Cursor::new(png), &mut dest, (0, 0), None).unwrap_err();
        assert!(matches!(err, CodecError::Raster(_)));
        // First row was delivered before the failure.
        assert_eq!(dest.row(0).unwrap(), &[1, 2]);
    }

    #[test]
    fn overflowing_offset_is_rejected_before_writes() {
        let png = encode_gray8(2, 2, &[1, 2, 3, 4]);
        let mut dest = PixelBuffer::new(4, 4, PixelFormat::GRAY8);
        for offset in [(i64::MAX, 0), (0, i64::MAX - 1)] {
            let err = decode(&mut Cursor::new(&png), &mut dest, offset, None).unwrap_err();
            assert!(matches!(err, CodecError::InvalidInput(_)), "{:?}", offset);
        }
        assert!(dest.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn swaps_sixteen_bit_samples() {
        let mut samples = [0x12, 0x34, 0xAB, 0xCD];
        be_to_native(&mut samples);
        assert_eq!(u16::from_ne_bytes([samples[0], samples[1]]), 0x1234);
        assert_eq!(u16::from_ne_bytes([samples[2], samples[3]]), 0xABCD);
    }
}
