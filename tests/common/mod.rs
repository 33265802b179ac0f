//! Hand-built PNG fixtures and test rasters.
#![allow(dead_code)]

use pngstream::{PixelBuffer, PixelFormat, Raster, RasterError};

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const ADAM7: [(usize, usize, usize, usize); 7] = [
    (0, 0, 8, 8),
    (4, 0, 8, 8),
    (0, 4, 4, 8),
    (2, 0, 4, 4),
    (0, 2, 2, 4),
    (1, 0, 2, 2),
    (0, 1, 1, 2),
];

/// A chunk with a correct CRC.
pub fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = crc32fast::Hasher::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
    out
}

/// Describes a fixture image; samples are given unpacked, one `u16` per channel.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub width: usize,
    pub height: usize,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlaced: bool,
    /// Chunks inserted between IHDR and IDAT.
    pub extra: Vec<Vec<u8>>,
}

impl Fixture {
    pub fn new(width: usize, height: usize, bit_depth: u8, color_type: u8) -> Self {
        Self {
            width,
            height,
            bit_depth,
            color_type,
            interlaced: false,
            extra: Vec::new(),
        }
    }

    pub fn interlaced(mut self, interlaced: bool) -> Self {
        self.interlaced = interlaced;
        self
    }

    pub fn with_chunk(mut self, kind: &[u8; 4], data: &[u8]) -> Self {
        self.extra.push(chunk(kind, data));
        self
    }

    pub fn channels(&self) -> usize {
        match self.color_type {
            0 | 3 => 1,
            4 => 2,
            2 => 3,
            6 => 4,
            _ => 1,
        }
    }

    pub fn ihdr(&self) -> Vec<u8> {
        let mut d = (self.width as u32).to_be_bytes().to_vec();
        d.extend_from_slice(&(self.height as u32).to_be_bytes());
        d.extend_from_slice(&[
            self.bit_depth,
            self.color_type,
            0,
            0,
            u8::from(self.interlaced),
        ]);
        d
    }

    /// Full file from `samples` (row-major, `channels()` per pixel).
    pub fn build(&self, samples: &[u16]) -> Vec<u8> {
        let ch = self.channels();
        assert_eq!(samples.len(), self.width * self.height * ch);

        let mut raw = Vec::new();
        if self.interlaced {
            for (x0, y0, dx, dy) in ADAM7 {
                if self.width <= x0 || self.height <= y0 {
                    continue;
                }
                let xs: Vec<usize> = (x0..self.width).step_by(dx).collect();
                for y in (y0..self.height).step_by(dy) {
                    let row: Vec<u16> = xs
                        .iter()
                        .flat_map(|&x| {
                            let at = (y * self.width + x) * ch;
                            samples[at..at + ch].to_vec()
                        })
                        .collect();
                    raw.push(0);
                    raw.extend(pack(&row, self.bit_depth));
                }
            }
        } else {
            for row in samples.chunks(self.width * ch) {
                raw.push(0);
                raw.extend(pack(row, self.bit_depth));
            }
        }

        let mut out = SIGNATURE.to_vec();
        out.extend(chunk(b"IHDR", &self.ihdr()));
        for c in &self.extra {
            out.extend_from_slice(c);
        }
        out.extend(chunk(
            b"IDAT",
            &miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6),
        ));
        out.extend(chunk(b"IEND", &[]));
        out
    }
}

/// Pack samples MSB-first at `bit_depth`; wider samples are big-endian u16.
fn pack(samples: &[u16], bit_depth: u8) -> Vec<u8> {
    match bit_depth {
        8 => samples.iter().map(|&s| s as u8).collect(),
        bits @ (1 | 2 | 4) => {
            let per_byte = 8 / bits as usize;
            samples
                .chunks(per_byte)
                .map(|group| {
                    let mut byte = 0u8;
                    for (i, &s) in group.iter().enumerate() {
                        byte |= (s as u8) << (8 - bits as usize * (i + 1));
                    }
                    byte
                })
                .collect()
        }
        _ => samples.iter().flat_map(|s| s.to_be_bytes()).collect(),
    }
}

/// Chunk types of a PNG file, in order.
pub fn chunk_types(png: &[u8]) -> Vec<String> {
    let mut types = Vec::new();
    let mut at = 8;
    while at + 8 <= png.len() {
        let len = u32::from_be_bytes([png[at], png[at + 1], png[at + 2], png[at + 3]]) as usize;
        types.push(String::from_utf8_lossy(&png[at + 4..at + 8]).into_owned());
        at += 12 + len;
    }
    types
}

/// Payload of the first chunk of type `kind`.
pub fn chunk_data<'a>(png: &'a [u8], kind: &[u8; 4]) -> Option<&'a [u8]> {
    let mut at = 8;
    while at + 8 <= png.len() {
        let len = u32::from_be_bytes([png[at], png[at + 1], png[at + 2], png[at + 3]]) as usize;
        if &png[at + 4..at + 8] == kind {
            return Some(&png[at + 8..at + 8 + len]);
        }
        at += 12 + len;
    }
    None
}

/// Minimal ICC v4 display profile with a single-value `curv` TRC.
///
/// `space` is `b"RGB "` or `b"GRAY"`; `gamma_8_8` is the u8Fixed8 exponent.
pub fn icc_profile(space: &[u8; 4], gamma_8_8: u16) -> Vec<u8> {
    fn xyz(x: f64, y: f64, z: f64) -> Vec<u8> {
        let mut d = b"XYZ \0\0\0\0".to_vec();
        for v in [x, y, z] {
            d.extend_from_slice(&((v * 65536.0).round() as i32).to_be_bytes());
        }
        d
    }
    let mut curv = b"curv\0\0\0\0".to_vec();
    curv.extend_from_slice(&1u32.to_be_bytes());
    curv.extend_from_slice(&gamma_8_8.to_be_bytes());
    curv.extend_from_slice(&[0, 0]);

    let tags: Vec<(&[u8; 4], Vec<u8>)> = if space == b"GRAY" {
        vec![(b"wtpt", xyz(0.9642, 1.0, 0.8249)), (b"kTRC", curv)]
    } else {
        vec![
            (b"wtpt", xyz(0.9642, 1.0, 0.8249)),
            (b"rXYZ", xyz(0.4361, 0.2225, 0.0139)),
            (b"gXYZ", xyz(0.3851, 0.7169, 0.0971)),
            (b"bXYZ", xyz(0.1431, 0.0606, 0.7141)),
            (b"rTRC", curv.clone()),
            (b"gTRC", curv.clone()),
            (b"bTRC", curv),
        ]
    };

    let table_len = 4 + 12 * tags.len();
    let mut offset = 128 + table_len;
    let mut table = (tags.len() as u32).to_be_bytes().to_vec();
    let mut data = Vec::new();
    for (sig, body) in &tags {
        table.extend_from_slice(*sig);
        table.extend_from_slice(&(offset as u32).to_be_bytes());
        table.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(body);
        offset += body.len();
        while offset % 4 != 0 {
            data.push(0);
            offset += 1;
        }
    }

    let total = 128 + table.len() + data.len();
    let mut header = vec![0u8; 128];
    header[0..4].copy_from_slice(&(total as u32).to_be_bytes());
    header[8..12].copy_from_slice(&0x0430_0000u32.to_be_bytes());
    header[12..16].copy_from_slice(b"mntr");
    header[16..20].copy_from_slice(space);
    header[20..24].copy_from_slice(b"XYZ ");
    header[36..40].copy_from_slice(b"acsp");
    header[68..72].copy_from_slice(&0x0000_F6D6u32.to_be_bytes());
    header[72..76].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    header[76..80].copy_from_slice(&0x0000_D32Du32.to_be_bytes());

    let mut profile = header;
    profile.extend(table);
    profile.extend(data);
    profile
}

/// iCCP chunk payload.
pub fn iccp(name: &str, profile: &[u8]) -> Vec<u8> {
    let mut d = name.as_bytes().to_vec();
    d.extend_from_slice(&[0, 0]);
    d.extend(miniz_oxide::deflate::compress_to_vec_zlib(profile, 6));
    d
}

/// Raster that counts row writes.
pub struct Recording {
    pub inner: PixelBuffer,
    pub writes: usize,
}

impl Recording {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            inner: PixelBuffer::new(width, height, format),
            writes: 0,
        }
    }
}

impl Raster for Recording {
    fn pixel_format(&self) -> &PixelFormat {
        self.inner.pixel_format()
    }

    fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    fn read_row(
        &self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &mut [u8],
    ) -> Result<(), RasterError> {
        self.inner.read_row(x, y, width, format, row)
    }

    fn write_row(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &[u8],
    ) -> Result<(), RasterError> {
        self.writes += 1;
        self.inner.write_row(x, y, width, format, row)
    }
}

/// Native-endian u16 samples of a 16-bit buffer.
pub fn samples16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|p| u16::from_ne_bytes([p[0], p[1]]))
        .collect()
}
