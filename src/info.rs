//! Image metadata probing without decoding pixels.

use std::io::{Read, Seek};

use crate::chunks::{self, HeaderChunks};
use crate::pixel::PixelFormat;
use crate::stream::SourceStream;
use crate::{CodecError, Limits, color, format, negotiate};

/// What a PNG stream contains, as seen from its header chunks.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    /// Format rows are produced in, color space included.
    pub pixel_format: PixelFormat,
    /// Adam7 interlaced.
    pub interlaced: bool,
}

/// Read the signature and header chunks of a PNG stream.
///
/// No pixel data is decoded. The stream is read ahead through a buffer, so
/// its position afterwards is unspecified.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// let mut file = File::open("photo.png")?;
/// let info = pngstream::query(&mut file)?;
/// println!("{}x{} {}", info.width, info.height, info.pixel_format);
/// # Ok::<(), pngstream::CodecError>(())
/// ```
pub fn query<R: Read + Seek>(stream: &mut R) -> Result<ImageDescriptor, CodecError> {
    let mut source = SourceStream::new(stream);
    let (_, descriptor) = read_header(&mut source, None)?;
    Ok(descriptor)
}

/// Signature, header scan, limits, format negotiation and color resolution.
pub(crate) fn read_header<R: Read + Seek>(
    source: &mut SourceStream<R>,
    limits: Option<&Limits>,
) -> Result<(HeaderChunks, ImageDescriptor), CodecError> {
    format::check_signature(source)?;
    let chunks = chunks::scan(source)?;
    let header = chunks.header;

    let wire = negotiate::decode_format(&header, chunks.has_transparency, Default::default())?;

    if let Some(limits) = limits {
        limits.check_header(header.width, header.height)?;
    }

    let color_space = color::resolve(&chunks.color)?;
    log::debug!(
        "png {}x{} type {} depth {}{} -> {}",
        header.width,
        header.height,
        header.color_type,
        header.bit_depth,
        if header.interlaced { " adam7" } else { "" },
        wire
    );

    let descriptor = ImageDescriptor {
        width: header.width,
        height: header.height,
        pixel_format: wire.with_color_space(color_space),
        interlaced: header.interlaced,
    };
    Ok((chunks, descriptor))
}
