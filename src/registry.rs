//! Routing from file extensions and MIME types to codecs.

use std::collections::HashMap;
use std::path::Path;

use crate::ImageFormat;

/// A normalized lookup key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Key {
    Extension(String),
    MimeType(String),
}

impl Key {
    /// Accepts `png`, `.png`, `some/path/photo.PNG` or `image/png`.
    fn parse(key: &str) -> Self {
        let key = key.trim();
        if let Some(ext) = key.strip_prefix('.') {
            return Key::Extension(ext.to_ascii_lowercase());
        }
        if let Some(ext) = Path::new(key).extension().and_then(|e| e.to_str()) {
            return Key::Extension(ext.to_ascii_lowercase());
        }
        if key.contains('/') {
            Key::MimeType(key.to_ascii_lowercase())
        } else {
            Key::Extension(key.to_ascii_lowercase())
        }
    }
}

/// Explicit table of which codec loads or saves which kind of file.
///
/// Built once by the application and passed to whatever routes files to
/// codecs; there is no global registry.
///
/// # Example
///
/// ```
/// use pngstream::{CodecRegistry, ImageFormat};
///
/// let registry = CodecRegistry::new().with_png();
/// assert_eq!(registry.loader_for("holiday/IMG_0001.PNG"), Some(ImageFormat::Png));
/// assert_eq!(registry.loader_for("image/png"), Some(ImageFormat::Png));
/// assert_eq!(registry.saver_for("image/png"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CodecRegistry {
    loaders: HashMap<Key, ImageFormat>,
    savers: HashMap<Key, ImageFormat>,
}

impl CodecRegistry {
    /// Nothing registered; caller must opt in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register PNG loading for `.png` and `image/png`, and saving for `.png`.
    pub fn with_png(mut self) -> Self {
        let png = ImageFormat::Png;
        for ext in png.extensions() {
            self.register_loader(ext, png);
            self.register_saver(ext, png);
        }
        self.register_loader(png.mime_type(), png);
        self
    }

    /// Route `key` (extension, path or MIME type) to `format` for loading.
    ///
    /// A later registration for the same key replaces the earlier one.
    pub fn register_loader(&mut self, key: &str, format: ImageFormat) {
        if let Some(previous) = self.loaders.insert(Key::parse(key), format) {
            log::debug!("loader for '{}' replaces {:?}", key, previous);
        }
    }

    /// Route `key` (extension, path or MIME type) to `format` for saving.
    pub fn register_saver(&mut self, key: &str, format: ImageFormat) {
        if let Some(previous) = self.savers.insert(Key::parse(key), format) {
            log::debug!("saver for '{}' replaces {:?}", key, previous);
        }
    }

    /// Codec that loads files matching `key`.
    pub fn loader_for(&self, key: &str) -> Option<ImageFormat> {
        self.loaders.get(&Key::parse(key)).copied()
    }

    /// Codec that saves files matching `key`.
    pub fn saver_for(&self, key: &str) -> Option<ImageFormat> {
        self.savers.get(&Key::parse(key)).copied()
    }

    /// Whether any key routes loading to `format`.
    pub fn can_decode(&self, format: ImageFormat) -> bool {
        self.loaders.values().any(|&f| f == format)
    }

    /// Whether any key routes saving to `format`.
    pub fn can_encode(&self, format: ImageFormat) -> bool {
        self.savers.values().any(|&f| f == format)
    }
}
