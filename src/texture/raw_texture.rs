//! Raw texture with single-pixel reads
//!
//! Pixel reads go through a 1x1 scratch context: the requested pixel is
//! copied into the scratch buffer and read back from there. The context is
//! created on the first read, lives as long as the texture, and is locked for
//! the duration of each read so overlapping reads never share it.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use image::{Rgba, RgbaImage};
use log::error;
use serde::{Deserialize, Serialize};

use super::Color;

/// How out-of-range coordinates are mapped back into the texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Tile the texture
    Repeat,
    /// Stick to the nearest edge pixel
    #[default]
    Clamp,
}

impl WrapMode {
    pub fn label(&self) -> &'static str {
        match self {
            WrapMode::Repeat => "repeat",
            WrapMode::Clamp => "clamp",
        }
    }

    /// Map one coordinate into `[0, dim)`; `dim` must be non-zero
    fn apply(&self, coord: i64, dim: u32) -> u32 {
        let dim = dim as i64;
        match self {
            WrapMode::Clamp => coord.clamp(0, dim - 1) as u32,
            WrapMode::Repeat => coord.rem_euclid(dim) as u32,
        }
    }
}

/// Sampling filter, carried for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
    Trilinear,
}

/// Error type for texture loading
#[derive(Debug)]
pub enum TextureError {
    DecodeError(image::ImageError),
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::DecodeError(e)
    }
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureError::DecodeError(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for TextureError {}

/// Why a pixel could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadDenied {
    /// Texture has dimensions but no pixel data
    NoPixelData,
    /// Texture is zero-sized
    Empty,
}

/// A decoded image plus wrap/filter settings
#[derive(Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub wrap_mode: WrapMode,
    pub filter_mode: FilterMode,
    /// Pixel data; `None` for textures restored from metadata only
    image: Option<RgbaImage>,
    /// Scratch read context, created on first read
    read_context: OnceLock<Mutex<RgbaImage>>,
}

impl Texture {
    /// Wrap decoded pixels
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            wrap_mode: WrapMode::default(),
            filter_mode: FilterMode::default(),
            image: Some(image),
            read_context: OnceLock::new(),
        }
    }

    /// Build from raw RGBA8 bytes; `None` if the length does not match
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(Self::from_image)
    }

    /// A texture that knows its size but has no readable pixels
    pub fn without_pixels(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            wrap_mode: WrapMode::default(),
            filter_mode: FilterMode::default(),
            image: None,
            read_context: OnceLock::new(),
        }
    }

    /// Decode an image file (PNG, JPEG, BMP)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self::from_image(image))
    }

    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    pub fn with_filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }

    /// Check if the pixel data is available for reads
    pub fn is_readable(&self) -> bool {
        self.image.is_some()
    }

    /// Check if the scratch read context has been created yet
    pub fn has_read_context(&self) -> bool {
        self.read_context.get().is_some()
    }

    /// Color of the pixel at `(x, y)`
    ///
    /// Out-of-range coordinates are wrapped per `wrap_mode`. A denied read
    /// is logged and returns [`Color::TRANSPARENT`].
    pub fn get_pixel(&self, x: i64, y: i64) -> Color {
        match self.read_pixel(x, y) {
            Ok(pixel) => Color::from_rgba8(pixel.0),
            Err(reason) => {
                error!(
                    "Cannot read pixel ({}, {}) of {}x{} texture: {:?}",
                    x, y, self.width, self.height, reason
                );
                Color::TRANSPARENT
            }
        }
    }

    fn read_pixel(&self, x: i64, y: i64) -> Result<Rgba<u8>, ReadDenied> {
        if self.width == 0 || self.height == 0 {
            return Err(ReadDenied::Empty);
        }
        let x = self.wrap_mode.apply(x, self.width);
        let y = self.wrap_mode.apply(y, self.height);

        let context = self
            .read_context
            .get_or_init(|| Mutex::new(RgbaImage::new(1, 1)));
        // A panic mid-read leaves at most one stale pixel, which is cleared below
        let mut scratch = context.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        scratch.put_pixel(0, 0, Rgba([0, 0, 0, 0]));

        let image = self.image.as_ref().ok_or(ReadDenied::NoPixelData)?;
        let source = image.get_pixel_checked(x, y).ok_or(ReadDenied::NoPixelData)?;
        scratch.put_pixel(0, 0, *source);
        Ok(*scratch.get_pixel(0, 0))
    }
}

impl Clone for Texture {
    /// Clones get their own read context
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            wrap_mode: self.wrap_mode,
            filter_mode: self.filter_mode,
            image: self.image.clone(),
            read_context: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 texture where pixel (x, y) has red = 10*x + y
    fn gradient(wrap_mode: WrapMode) -> Texture {
        let image = RgbaImage::from_fn(3, 2, |x, y| Rgba([(10 * x + y) as u8, 0, 0, 255]));
        Texture::from_image(image).with_wrap_mode(wrap_mode)
    }

    #[test]
    fn test_in_range_read() {
        let tex = gradient(WrapMode::Clamp);
        assert_eq!(tex.get_pixel(2, 1), Color::from_rgba8([21, 0, 0, 255]));
    }

    #[test]
    fn test_clamp() {
        let tex = gradient(WrapMode::Clamp);
        assert_eq!(tex.get_pixel(-1, -1), tex.get_pixel(0, 0));
        assert_eq!(tex.get_pixel(3, 2), tex.get_pixel(2, 1));
        assert_eq!(tex.get_pixel(100, -7), tex.get_pixel(2, 0));
    }

    #[test]
    fn test_repeat() {
        let tex = gradient(WrapMode::Repeat);
        assert_eq!(tex.get_pixel(-1, 0), tex.get_pixel(2, 0));
        assert_eq!(tex.get_pixel(-1, 1), tex.get_pixel(2, 1));
        // y wraps by height, not width
        assert_eq!(tex.get_pixel(0, 2), tex.get_pixel(0, 0));
        assert_eq!(tex.get_pixel(0, -3), tex.get_pixel(0, 1));
        assert_eq!(tex.get_pixel(7, 0), tex.get_pixel(1, 0));
    }

    #[test]
    fn test_denied_read_is_transparent() {
        let tex = Texture::without_pixels(4, 4);
        assert!(!tex.is_readable());
        assert_eq!(tex.get_pixel(1, 1), Color::TRANSPARENT);

        let empty = Texture::without_pixels(0, 0);
        assert_eq!(empty.get_pixel(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn test_read_context_created_lazily() {
        let tex = gradient(WrapMode::Clamp);
        assert!(!tex.has_read_context());
        tex.get_pixel(0, 0);
        assert!(tex.has_read_context());

        let copy = tex.clone();
        assert!(!copy.has_read_context());
    }

    #[test]
    fn test_overlapping_reads() {
        let tex = gradient(WrapMode::Repeat);
        std::thread::scope(|s| {
            for t in 0..4i64 {
                let tex = &tex;
                s.spawn(move || {
                    for i in 0..100i64 {
                        let (x, y) = (i + t, i * 3);
                        let expected = (10 * x.rem_euclid(3) + y.rem_euclid(2)) as u8;
                        assert_eq!(tex.get_pixel(x, y), Color::from_rgba8([expected, 0, 0, 255]));
                    }
                });
            }
        });
    }

    #[test]
    fn test_from_rgba_length_mismatch() {
        assert!(Texture::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Texture::from_rgba(2, 2, vec![0; 15]).is_none());
    }
}
