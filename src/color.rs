//! Color space model and PNG color-metadata resolution.
//!
//! Decoding maps the iCCP / sRGB / gAMA / cHRM chunks onto a [`ColorSpace`];
//! encoding maps a [`ColorSpace`] back onto the chunks to emit. The
//! [`ColorSpace`] is a label for the external conversion layer; no pixel
//! values are transformed here.

use std::sync::Arc;

use moxcms::{ColorProfile, DataColorSpace, ToneReprCurve, Xyzd};

use crate::CodecError;
use crate::chunks::ColorChunks;

/// Name written into iCCP chunks whose profile name is missing or too long.
pub const ICC_NAME_PLACEHOLDER: &str = "ICC";

/// Longest profile name copied verbatim into an iCCP chunk.
const MAX_ICC_NAME: usize = 10;

/// gAMA value for an sRGB-like 1/2.2 encoding, in PNG fixed point.
const SRGB_FILE_GAMMA: u32 = 45455;

/// sRGB intent written with the sRGB chunk (relative colorimetric).
const SRGB_INTENT_RELATIVE: u8 = 1;

/// A CIE xy chromaticity coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chromaticity {
    pub x: f64,
    pub y: f64,
}

impl Chromaticity {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn from_scaled(x: u32, y: u32) -> Self {
        Self {
            x: f64::from(x) / 100_000.0,
            y: f64::from(y) / 100_000.0,
        }
    }

    fn scaled(self) -> [u32; 2] {
        [to_fixed(self.x), to_fixed(self.y)]
    }

    fn approx_eq(self, other: Self) -> bool {
        (self.x - other.x).abs() < 5e-4 && (self.y - other.y).abs() < 5e-4
    }
}

/// Nonlinear encoding applied to stored samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransferCurve {
    /// The piecewise IEC 61966-2-1 curve.
    Srgb,
    /// Samples are linear light.
    Linear,
    /// Pure power curve; the value is the decoding exponent (2.2 for typical content).
    Gamma(f64),
    /// Anything else (tabulated or parametric curves we do not classify).
    Other,
}

impl TransferCurve {
    /// Power curve with the given decoding exponent, folding 1.0 into [`Linear`](Self::Linear).
    pub fn power(exponent: f64) -> Self {
        if (exponent - 1.0).abs() < 1e-3 {
            TransferCurve::Linear
        } else {
            TransferCurve::Gamma(exponent)
        }
    }

    /// gAMA value (file gamma × 100000) announcing this curve.
    fn file_gamma(self) -> u32 {
        match self {
            TransferCurve::Linear => 100_000,
            TransferCurve::Gamma(exponent) if exponent > 0.0 => to_fixed(1.0 / exponent),
            TransferCurve::Gamma(_) | TransferCurve::Srgb | TransferCurve::Other => {
                SRGB_FILE_GAMMA
            }
        }
    }
}

/// A color space defined by primaries, white point and transfer curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChromaticitySpace {
    pub white: Chromaticity,
    pub red: Chromaticity,
    pub green: Chromaticity,
    pub blue: Chromaticity,
    pub transfer: TransferCurve,
}

impl ChromaticitySpace {
    pub const SRGB_WHITE: Chromaticity = Chromaticity::new(0.3127, 0.3290);
    pub const SRGB_RED: Chromaticity = Chromaticity::new(0.6400, 0.3300);
    pub const SRGB_GREEN: Chromaticity = Chromaticity::new(0.3000, 0.6000);
    pub const SRGB_BLUE: Chromaticity = Chromaticity::new(0.1500, 0.0600);

    /// sRGB primaries and white point with the given transfer curve.
    pub const fn with_srgb_primaries(transfer: TransferCurve) -> Self {
        Self {
            white: Self::SRGB_WHITE,
            red: Self::SRGB_RED,
            green: Self::SRGB_GREEN,
            blue: Self::SRGB_BLUE,
            transfer,
        }
    }

    /// Explicit sRGB.
    pub const fn srgb() -> Self {
        Self::with_srgb_primaries(TransferCurve::Srgb)
    }

    pub fn has_srgb_primaries(&self) -> bool {
        self.white.approx_eq(Self::SRGB_WHITE)
            && self.red.approx_eq(Self::SRGB_RED)
            && self.green.approx_eq(Self::SRGB_GREEN)
            && self.blue.approx_eq(Self::SRGB_BLUE)
    }

    fn from_chrm(values: &[u32; 8], transfer: TransferCurve) -> Self {
        Self {
            white: Chromaticity::from_scaled(values[0], values[1]),
            red: Chromaticity::from_scaled(values[2], values[3]),
            green: Chromaticity::from_scaled(values[4], values[5]),
            blue: Chromaticity::from_scaled(values[6], values[7]),
            transfer,
        }
    }

    fn chrm_payload(&self) -> Vec<u8> {
        [self.white, self.red, self.green, self.blue]
            .iter()
            .flat_map(|c| c.scaled())
            .flat_map(u32::to_be_bytes)
            .collect()
    }
}

/// Data color model declared by an ICC profile header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IccColorModel {
    Rgb,
    Gray,
    Cmyk,
    Other,
}

/// A parsed ICC profile, keeping the original bytes for re-embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct IccProfile {
    name: String,
    bytes: Arc<[u8]>,
    model: IccColorModel,
    transfer: TransferCurve,
    primaries: Option<[Chromaticity; 4]>,
}

impl IccProfile {
    /// Parse raw profile bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, CodecError> {
        Self::with_name(String::new(), bytes)
    }

    /// Parse raw profile bytes, remembering the profile name.
    pub fn with_name(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self, CodecError> {
        let bytes = bytes.into();
        let profile = ColorProfile::new_from_slice(&bytes)
            .map_err(|e| CodecError::ColorSpace(format!("invalid ICC profile: {:?}", e)))?;
        let model = match profile.color_space {
            DataColorSpace::Rgb => IccColorModel::Rgb,
            DataColorSpace::Gray => IccColorModel::Gray,
            DataColorSpace::Cmyk => IccColorModel::Cmyk,
            _ => IccColorModel::Other,
        };
        let curve = match model {
            IccColorModel::Gray => profile.gray_trc.as_ref(),
            _ => profile.red_trc.as_ref(),
        };
        let primaries = match model {
            IccColorModel::Rgb => colorant_primaries(&profile),
            _ => None,
        };
        Ok(Self {
            name: name.into(),
            bytes,
            model,
            transfer: classify_curve(curve),
            primaries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn model(&self) -> IccColorModel {
        self.model
    }

    pub fn transfer(&self) -> TransferCurve {
        self.transfer
    }

    /// White point and primaries of an RGB matrix profile, with the
    /// PCS chromatic adaptation undone.
    pub fn chromaticities(&self) -> Option<ChromaticitySpace> {
        let [white, red, green, blue] = self.primaries?;
        Some(ChromaticitySpace {
            white,
            red,
            green,
            blue,
            transfer: self.transfer,
        })
    }

    /// Name to write into an iCCP chunk.
    fn chunk_name(&self) -> &str {
        let usable = !self.name.is_empty()
            && self.name.chars().count() <= MAX_ICC_NAME
            && self
                .name
                .chars()
                .all(|c| matches!(c as u32, 0x21..=0x7E | 0xA1..=0xFF) || c == ' ')
            && !self.name.starts_with(' ')
            && !self.name.ends_with(' ');
        if usable {
            &self.name
        } else {
            ICC_NAME_PLACEHOLDER
        }
    }
}

fn colorant_primaries(profile: &ColorProfile) -> Option<[Chromaticity; 4]> {
    let unadapt = profile.chromatic_adaptation.map(|m| m.inverse());
    let source = |c: Xyzd| match &unadapt {
        Some(m) => {
            let v = m.v;
            [
                v[0][0] * c.x + v[0][1] * c.y + v[0][2] * c.z,
                v[1][0] * c.x + v[1][1] * c.y + v[1][2] * c.z,
                v[2][0] * c.x + v[2][1] * c.y + v[2][2] * c.z,
            ]
        }
        None => [c.x, c.y, c.z],
    };
    let red = source(profile.red_colorant);
    let green = source(profile.green_colorant);
    let blue = source(profile.blue_colorant);
    // The colorants sum to the adapted white.
    let white = [0, 1, 2].map(|i| red[i] + green[i] + blue[i]);

    let xy = |xyz: [f64; 3]| {
        let sum = xyz[0] + xyz[1] + xyz[2];
        (sum.is_finite() && sum > 0.0).then(|| Chromaticity::new(xyz[0] / sum, xyz[1] / sum))
    };
    Some([xy(white)?, xy(red)?, xy(green)?, xy(blue)?])
}

fn classify_curve(curve: Option<&ToneReprCurve>) -> TransferCurve {
    match curve {
        Some(ToneReprCurve::Lut(lut)) if lut.is_empty() => TransferCurve::Linear,
        Some(ToneReprCurve::Lut(lut)) if lut.len() == 1 => {
            // u8Fixed8Number
            TransferCurve::power(f64::from(lut[0]) / 256.0)
        }
        Some(ToneReprCurve::Parametric(p)) if p.len() == 1 => TransferCurve::power(f64::from(p[0])),
        Some(ToneReprCurve::Parametric(p))
            if p.len() >= 5 && (p[0] - 2.4).abs() < 1e-3 && (p[4] - 0.04045).abs() < 1e-3 =>
        {
            TransferCurve::Srgb
        }
        _ => TransferCurve::Other,
    }
}

/// The color space attached to a pixel format.
///
/// `Unspecified` means "treat as sRGB". An explicit sRGB
/// [`ChromaticitySpace`] is a different value but behaves identically.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ColorSpace {
    #[default]
    Unspecified,
    Icc(IccProfile),
    Chromaticity(ChromaticitySpace),
}

impl ColorSpace {
    /// True for `Unspecified` and for sRGB primaries with the sRGB curve.
    pub fn is_srgb(&self) -> bool {
        match self {
            ColorSpace::Unspecified => true,
            ColorSpace::Chromaticity(c) => {
                c.has_srgb_primaries() && c.transfer == TransferCurve::Srgb
            }
            ColorSpace::Icc(_) => false,
        }
    }

    pub fn is_cmyk(&self) -> bool {
        matches!(self, ColorSpace::Icc(p) if p.model == IccColorModel::Cmyk)
    }

    pub fn transfer(&self) -> TransferCurve {
        match self {
            ColorSpace::Unspecified => TransferCurve::Srgb,
            ColorSpace::Icc(p) => p.transfer,
            ColorSpace::Chromaticity(c) => c.transfer,
        }
    }

    pub fn icc_profile(&self) -> Option<&IccProfile> {
        match self {
            ColorSpace::Icc(p) => Some(p),
            _ => None,
        }
    }
}

/// Resolve the decode-side color space. First match wins:
/// iCCP, then sRGB, then gAMA (with cHRM primaries if present), else unspecified.
pub(crate) fn resolve(chunks: &ColorChunks) -> Result<ColorSpace, CodecError> {
    if let Some(icc) = &chunks.icc {
        let profile = IccProfile::with_name(icc.name.clone(), icc.profile.clone())?;
        log::debug!(
            "color space from iCCP '{}' ({} bytes, {:?})",
            icc.name,
            icc.profile.len(),
            profile.model
        );
        return Ok(ColorSpace::Icc(profile));
    }

    if chunks.srgb_intent.is_some() {
        if chunks.gamma.is_some() || chunks.chromaticities.is_some() {
            log::debug!("sRGB chunk present, gAMA/cHRM ignored");
        }
        return Ok(ColorSpace::Unspecified);
    }

    if let Some(gamma) = chunks.gamma {
        let exponent = 100_000.0 / f64::from(gamma);
        let transfer = TransferCurve::power(exponent);
        let space = match &chunks.chromaticities {
            Some(chrm) => ChromaticitySpace::from_chrm(chrm, transfer),
            None => ChromaticitySpace::with_srgb_primaries(transfer),
        };
        log::debug!("color space from gAMA {} (exponent {:.4})", gamma, exponent);
        return Ok(ColorSpace::Chromaticity(space));
    }

    if chunks.chromaticities.is_some() {
        log::debug!("cHRM without gAMA ignored");
    }
    Ok(ColorSpace::Unspecified)
}

/// An ancillary chunk to emit ahead of the image data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ColorChunk {
    Srgb(u8),
    Gamma(u32),
    Chromaticities(Vec<u8>),
    Icc { name: String, profile: Vec<u8> },
}

impl ColorChunk {
    pub(crate) fn chunk_type(&self) -> [u8; 4] {
        match self {
            ColorChunk::Srgb(_) => *b"sRGB",
            ColorChunk::Gamma(_) => *b"gAMA",
            ColorChunk::Chromaticities(_) => *b"cHRM",
            ColorChunk::Icc { .. } => *b"iCCP",
        }
    }

    pub(crate) fn payload(&self) -> Vec<u8> {
        match self {
            ColorChunk::Srgb(intent) => vec![*intent],
            ColorChunk::Gamma(g) => g.to_be_bytes().to_vec(),
            ColorChunk::Chromaticities(data) => data.clone(),
            ColorChunk::Icc { name, profile } => {
                let mut out: Vec<u8> = name.chars().map(|c| c as u32 as u8).collect();
                out.push(0);
                out.push(0);
                out.extend(miniz_oxide::deflate::compress_to_vec_zlib(profile, 6));
                out
            }
        }
    }
}

/// Chunks announcing `space` for an image with the given output color type.
///
/// Only RGB(A) output carries color metadata; gray output carries none.
pub(crate) fn plan_chunks(space: &ColorSpace, rgb_output: bool) -> Vec<ColorChunk> {
    if !rgb_output {
        return Vec::new();
    }

    match space {
        ColorSpace::Unspecified => srgb_plan(),
        ColorSpace::Chromaticity(_) if space.is_srgb() => srgb_plan(),
        ColorSpace::Chromaticity(c) => vec![
            ColorChunk::Chromaticities(c.chrm_payload()),
            ColorChunk::Gamma(c.transfer.file_gamma()),
        ],
        ColorSpace::Icc(profile) => {
            let mut chunks = Vec::with_capacity(3);
            if let Some(c) = profile.chromaticities() {
                chunks.push(ColorChunk::Chromaticities(c.chrm_payload()));
            }
            let gamma = if profile.model == IccColorModel::Cmyk {
                SRGB_FILE_GAMMA
            } else {
                profile.transfer.file_gamma()
            };
            chunks.push(ColorChunk::Gamma(gamma));
            if profile.model == IccColorModel::Cmyk {
                log::debug!("CMYK profile not embedded in PNG output");
            } else {
                let name = profile.chunk_name();
                if name != profile.name {
                    log::debug!("ICC profile name '{}' replaced by '{}'", profile.name, name);
                }
                chunks.push(ColorChunk::Icc {
                    name: name.to_owned(),
                    profile: profile.bytes.to_vec(),
                });
            }
            chunks
        }
    }
}

fn srgb_plan() -> Vec<ColorChunk> {
    vec![
        ColorChunk::Srgb(SRGB_INTENT_RELATIVE),
        ColorChunk::Gamma(SRGB_FILE_GAMMA),
        ColorChunk::Chromaticities(ChromaticitySpace::srgb().chrm_payload()),
    ]
}

fn to_fixed(value: f64) -> u32 {
    (value * 100_000.0).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::EmbeddedIcc;

    const SRGB_CHRM: [u32; 8] = [31270, 32900, 64000, 33000, 30000, 60000, 15000, 6000];
    const WIDE_CHRM: [u32; 8] = [34567, 35850, 73470, 26530, 11590, 82640, 15660, 1770];

    #[test]
    fn nothing_present_is_unspecified() {
        let space = resolve(&ColorChunks::default()).unwrap();
        assert_eq!(space, ColorSpace::Unspecified);
        assert!(space.is_srgb());
    }

    #[test]
    fn gamma_only_uses_srgb_primaries() {
        let chunks = ColorChunks {
            gamma: Some(45455),
            ..Default::default()
        };
        let ColorSpace::Chromaticity(c) = resolve(&chunks).unwrap() else {
            panic!("expected chromaticity space");
        };
        assert!(c.has_srgb_primaries());
        let TransferCurve::Gamma(exp) = c.transfer else {
            panic!("expected power curve");
        };
        assert!((exp - 2.2).abs() < 1e-3);
    }

    #[test]
    fn gamma_with_chrm_uses_chrm_primaries() {
        let chunks = ColorChunks {
            gamma: Some(100_000),
            chromaticities: Some(WIDE_CHRM),
            ..Default::default()
        };
        let ColorSpace::Chromaticity(c) = resolve(&chunks).unwrap() else {
            panic!("expected chromaticity space");
        };
        assert!(!c.has_srgb_primaries());
        assert_eq!(c.red, Chromaticity::new(0.7347, 0.2653));
        assert_eq!(c.transfer, TransferCurve::Linear);
    }

    #[test]
    fn srgb_wins_over_gamma_and_chrm() {
        let chunks = ColorChunks {
            srgb_intent: Some(0),
            gamma: Some(100_000),
            chromaticities: Some(WIDE_CHRM),
            ..Default::default()
        };
        assert_eq!(resolve(&chunks).unwrap(), ColorSpace::Unspecified);
    }

    #[test]
    fn chrm_alone_is_ignored() {
        let chunks = ColorChunks {
            chromaticities: Some(WIDE_CHRM),
            ..Default::default()
        };
        assert_eq!(resolve(&chunks).unwrap(), ColorSpace::Unspecified);
    }

    #[test]
    fn malformed_icc_fails() {
        let chunks = ColorChunks {
            icc: Some(EmbeddedIcc {
                name: "junk".into(),
                profile: vec![1, 2, 3, 4],
            }),
            srgb_intent: Some(0),
            ..Default::default()
        };
        assert!(matches!(resolve(&chunks), Err(CodecError::ColorSpace(_))));
    }

    #[test]
    fn srgb_plan_for_unspecified() {
        let plan = plan_chunks(&ColorSpace::Unspecified, true);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0], ColorChunk::Srgb(1));
        assert_eq!(plan[1], ColorChunk::Gamma(45455));
        let chrm: Vec<u8> = SRGB_CHRM.iter().flat_map(|v| v.to_be_bytes()).collect();
        assert_eq!(plan[2], ColorChunk::Chromaticities(chrm));
    }

    #[test]
    fn explicit_srgb_plans_like_unspecified() {
        let explicit = ColorSpace::Chromaticity(ChromaticitySpace::srgb());
        assert_ne!(explicit, ColorSpace::Unspecified);
        assert_eq!(
            plan_chunks(&explicit, true),
            plan_chunks(&ColorSpace::Unspecified, true)
        );
    }

    #[test]
    fn linear_space_emits_unit_gamma() {
        let space =
            ColorSpace::Chromaticity(ChromaticitySpace::with_srgb_primaries(TransferCurve::Linear));
        let plan = plan_chunks(&space, true);
        assert!(plan.contains(&ColorChunk::Gamma(100_000)));
        assert!(!plan.iter().any(|c| matches!(c, ColorChunk::Srgb(_))));
    }

    #[test]
    fn gamma_22_space_emits_22() {
        let space = ColorSpace::Chromaticity(ChromaticitySpace::with_srgb_primaries(
            TransferCurve::Gamma(2.2),
        ));
        assert!(plan_chunks(&space, true).contains(&ColorChunk::Gamma(45455)));
    }

    #[test]
    fn gray_output_has_no_color_chunks() {
        assert!(plan_chunks(&ColorSpace::Unspecified, false).is_empty());
    }

    #[test]
    fn gamma_roundtrips_through_chunks() {
        let chunks = ColorChunks {
            gamma: Some(35000),
            ..Default::default()
        };
        let space = resolve(&chunks).unwrap();
        let plan = plan_chunks(&space, true);
        assert!(plan.contains(&ColorChunk::Gamma(35000)));
    }

    #[test]
    fn iccp_payload_layout() {
        let chunk = ColorChunk::Icc {
            name: "abc".into(),
            profile: vec![7; 64],
        };
        let payload = chunk.payload();
        assert_eq!(&payload[..5], b"abc\0\0");
        let inflated = miniz_oxide::inflate::decompress_to_vec_zlib(&payload[5..]).unwrap();
        assert_eq!(inflated, vec![7; 64]);
    }
}
