//! Header and color-metadata chunk scanning.
//!
//! Walks the chunk sequence from IHDR up to the first IDAT, keeping only what
//! color negotiation needs. CRCs are not checked here; the bitstream reader
//! validates every chunk again when pixels are decoded.

use std::io::{Read, Seek};

use crate::CodecError;
use crate::stream::SourceStream;

/// Largest chunk length PNG allows.
const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// Upper bound on the compressed iCCP payload we are willing to buffer.
const MAX_ICCP_COMPRESSED: u32 = 16 << 20;

/// Upper bound on the inflated ICC profile.
const MAX_ICC_PROFILE: usize = 64 << 20;

/// Image header fields as declared in IHDR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RawHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlaced: bool,
}

/// An inflated iCCP payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EmbeddedIcc {
    pub name: String,
    pub profile: Vec<u8>,
}

/// Color metadata chunks found before the image data.
///
/// gAMA and cHRM values are kept in their on-disk fixed-point form
/// (value × 100000).
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ColorChunks {
    pub icc: Option<EmbeddedIcc>,
    pub srgb_intent: Option<u8>,
    pub gamma: Option<u32>,
    pub chromaticities: Option<[u32; 8]>,
}

/// Everything learned from the chunks preceding IDAT.
#[derive(Clone, Debug)]
pub(crate) struct HeaderChunks {
    pub header: RawHeader,
    pub color: ColorChunks,
    pub has_transparency: bool,
}

/// Scan from just after the signature up to (not including) the first IDAT.
pub(crate) fn scan<R: Read + Seek>(
    stream: &mut SourceStream<R>,
) -> Result<HeaderChunks, CodecError> {
    let (len, kind) = read_chunk_head(stream)?;
    if &kind != b"IHDR" || len != 13 {
        return Err(CodecError::bitstream("first chunk is not a valid IHDR"));
    }
    let mut ihdr = [0u8; 13];
    stream.read_exact(&mut ihdr)?;
    stream.skip(4)?;
    let header = parse_ihdr(&ihdr)?;

    let mut color = ColorChunks::default();
    let mut has_transparency = false;

    loop {
        let (len, kind) = read_chunk_head(stream)?;
        match &kind {
            b"IDAT" => break,
            b"IEND" => return Err(CodecError::bitstream("IEND before any image data")),
            b"gAMA" if len == 4 => {
                let mut buf = [0u8; 4];
                stream.read_exact(&mut buf)?;
                let value = u32::from_be_bytes(buf);
                if color.gamma.is_some() {
                    log::warn!("duplicate gAMA chunk ignored");
                } else if value == 0 {
                    log::warn!("gAMA of zero ignored");
                } else {
                    color.gamma = Some(value);
                }
            }
            b"cHRM" if len == 32 => {
                let mut buf = [0u8; 32];
                stream.read_exact(&mut buf)?;
                if color.chromaticities.is_some() {
                    log::warn!("duplicate cHRM chunk ignored");
                } else {
                    let mut values = [0u32; 8];
                    for (v, b) in values.iter_mut().zip(buf.chunks_exact(4)) {
                        *v = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
                    }
                    color.chromaticities = Some(values);
                }
            }
            b"sRGB" if len == 1 => {
                let mut buf = [0u8; 1];
                stream.read_exact(&mut buf)?;
                if color.srgb_intent.is_none() {
                    color.srgb_intent = Some(buf[0]);
                }
            }
            b"iCCP" => {
                if len > MAX_ICCP_COMPRESSED {
                    return Err(CodecError::LimitExceeded(format!(
                        "iCCP chunk of {} bytes",
                        len
                    )));
                }
                let mut buf = vec![0u8; len as usize];
                stream.read_exact(&mut buf)?;
                if color.icc.is_none() {
                    color.icc = Some(parse_iccp(&buf)?);
                } else {
                    log::warn!("duplicate iCCP chunk ignored");
                }
            }
            b"tRNS" => {
                has_transparency = true;
                stream.skip(u64::from(len))?;
            }
            b"gAMA" | b"cHRM" | b"sRGB" => {
                log::warn!(
                    "{} chunk with bad length {} ignored",
                    String::from_utf8_lossy(&kind),
                    len
                );
                stream.skip(u64::from(len))?;
            }
            _ => stream.skip(u64::from(len))?,
        }
        stream.skip(4)?;
    }

    Ok(HeaderChunks {
        header,
        color,
        has_transparency,
    })
}

fn read_chunk_head<R: Read + Seek>(
    stream: &mut SourceStream<R>,
) -> Result<(u32, [u8; 4]), CodecError> {
    let mut head = [0u8; 8];
    stream.read_exact(&mut head)?;
    let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
    if len > MAX_CHUNK_LEN {
        return Err(CodecError::bitstream(format!("chunk length {} out of range", len)));
    }
    let kind = [head[4], head[5], head[6], head[7]];
    if !kind.iter().all(u8::is_ascii_alphabetic) {
        return Err(CodecError::bitstream("invalid chunk type"));
    }
    Ok((len, kind))
}

fn parse_ihdr(data: &[u8; 13]) -> Result<RawHeader, CodecError> {
    let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    if width == 0 || height == 0 || width > MAX_CHUNK_LEN || height > MAX_CHUNK_LEN {
        return Err(CodecError::bitstream(format!(
            "invalid image dimensions {}x{}",
            width, height
        )));
    }
    if data[10] != 0 || data[11] != 0 {
        return Err(CodecError::bitstream(
            "unknown compression or filter method",
        ));
    }
    let interlaced = match data[12] {
        0 => false,
        1 => true,
        n => {
            return Err(CodecError::bitstream(format!("unknown interlace method {}", n)));
        }
    };
    Ok(RawHeader {
        width,
        height,
        bit_depth: data[8],
        color_type: data[9],
        interlaced,
    })
}

/// Split an iCCP payload into name and inflated profile.
fn parse_iccp(data: &[u8]) -> Result<EmbeddedIcc, CodecError> {
    let nul = data
        .iter()
        .take(80)
        .position(|&b| b == 0)
        .ok_or_else(|| CodecError::ColorSpace("iCCP profile name is not terminated".into()))?;
    if nul == 0 {
        return Err(CodecError::ColorSpace("iCCP profile name is empty".into()));
    }
    // Latin-1 maps byte-for-byte onto the first 256 code points.
    let name: String = data[..nul].iter().map(|&b| char::from(b)).collect();
    let method = *data
        .get(nul + 1)
        .ok_or_else(|| CodecError::ColorSpace("iCCP chunk truncated".into()))?;
    if method != 0 {
        return Err(CodecError::ColorSpace(format!(
            "unknown iCCP compression method {}",
            method
        )));
    }
    let profile =
        miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(&data[nul + 2..], MAX_ICC_PROFILE)
            .map_err(|e| CodecError::ColorSpace(format!("cannot inflate iCCP profile: {:?}", e)))?;
    Ok(EmbeddedIcc { name, profile })
}
