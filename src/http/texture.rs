//! Texture decoding and storage.
//!
//! # Responsibilities
//! - Route downloaded image bytes to a codec by URL suffix
//! - Decode into RGBA8 textures
//! - Hold textures fetched by id for later lookup
//!
//! # Design Decisions
//! - Routing looks at the URL only, never at the bytes
//! - Decoders sit behind a trait so callers can plug in platform codecs
//! - The store is a concurrent map; fetches may complete in any order

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use image::ImageFormat;

/// Decoded image in RGBA8 layout.
#[derive(Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Which decoder handled an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCodec {
    WebP,
    Native,
}

impl fmt::Display for ImageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCodec::WebP => f.write_str("webp"),
            ImageCodec::Native => f.write_str("native"),
        }
    }
}

/// Turns encoded image bytes into a texture.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Texture, String>;
}

/// WebP-only decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpImageDecoder;

impl ImageDecoder for WebpImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Texture, String> {
        image::load_from_memory_with_format(bytes, ImageFormat::WebP)
            .map(into_texture)
            .map_err(|e| e.to_string())
    }
}

/// Format-sniffing decoder for PNG and JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeImageDecoder;

impl ImageDecoder for NativeImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Texture, String> {
        image::load_from_memory(bytes)
            .map(into_texture)
            .map_err(|e| e.to_string())
    }
}

fn into_texture(img: image::DynamicImage) -> Texture {
    let rgba = img.to_rgba8();
    Texture {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }
}

/// The decoder pair used by the executor.
#[derive(Clone)]
pub struct TextureDecoders {
    pub webp: Arc<dyn ImageDecoder>,
    pub native: Arc<dyn ImageDecoder>,
}

impl Default for TextureDecoders {
    fn default() -> Self {
        Self {
            webp: Arc::new(WebpImageDecoder),
            native: Arc::new(NativeImageDecoder),
        }
    }
}

impl fmt::Debug for TextureDecoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextureDecoders")
    }
}

impl TextureDecoders {
    /// Decode `bytes` with the codec chosen for `url`.
    pub fn decode(&self, url: &str, bytes: &[u8]) -> Result<Texture, (ImageCodec, String)> {
        let codec = codec_for_url(url);
        let decoder = match codec {
            ImageCodec::WebP => &self.webp,
            ImageCodec::Native => &self.native,
        };
        decoder.decode(bytes).map_err(|reason| (codec, reason))
    }
}

/// Empty URLs and URLs containing "null" (any case) never reach the network.
pub fn is_unusable_url(url: &str) -> bool {
    url.trim().is_empty() || url.to_ascii_lowercase().contains("null")
}

/// Codec for a URL: `.webp` paths (query and fragment ignored) use WebP.
pub fn codec_for_url(url: &str) -> ImageCodec {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    if path.to_ascii_lowercase().ends_with(".webp") {
        ImageCodec::WebP
    } else {
        ImageCodec::Native
    }
}

/// Textures fetched by id.
#[derive(Debug, Clone, Default)]
pub struct TextureStore {
    inner: Arc<DashMap<i32, Arc<Texture>>>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the texture for `id`.
    pub fn insert(&self, id: i32, texture: Texture) {
        if self.inner.insert(id, Arc::new(texture)).is_some() {
            tracing::debug!(id, "Replaced stored texture");
        }
    }

    pub fn get(&self, id: i32) -> Option<Arc<Texture>> {
        self.inner.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn remove(&self, id: i32) -> Option<Arc<Texture>> {
        self.inner.remove(&id).map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}
