//! Atlas format decoders
//!
//! A decoder turns an atlas description file into geometry: the packed
//! image's size and path, plus one [`SpriteRegion`] per named sprite, in file
//! order. The decoder is the only source of sprite geometry; metas never
//! persist it.
//!
//! ## Supported Formats
//!
//! | Tag                    | Detected by                         |
//! |------------------------|-------------------------------------|
//! | `texture-packer-hash`  | `frames` is an object keyed by name |
//! | `texture-packer-array` | `frames` is an array of `filename`s |

mod texture_packer;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sprite_frame::{Size, SpriteRegion};

pub use texture_packer::{FORMAT_ARRAY, FORMAT_HASH};

/// One named sprite as decoded from an atlas file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame {
    pub name: String,
    pub region: SpriteRegion,
}

/// Decoded atlas geometry
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAtlas {
    /// Format discriminator (see module docs)
    pub format: String,
    /// Packed image dimensions
    pub size: Size,
    /// Packed image path, resolved against the atlas file's directory
    pub image: PathBuf,
    /// Sprites in file order
    pub frames: Vec<ParsedFrame>,
}

/// Error decoding an atlas file
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Atlas file could not be read
    Io(String),
    /// Not valid JSON, or JSON of the wrong shape
    Json(String),
    /// Valid JSON, but no known atlas layout
    Unrecognized(String),
    /// Recognized layout with inconsistent content
    Invalid(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io(msg) => write!(f, "cannot read atlas: {}", msg),
            FormatError::Json(msg) => write!(f, "malformed atlas JSON: {}", msg),
            FormatError::Unrecognized(msg) => write!(f, "unrecognized atlas format: {}", msg),
            FormatError::Invalid(msg) => write!(f, "invalid atlas: {}", msg),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<std::io::Error> for FormatError {
    fn from(e: std::io::Error) -> Self {
        FormatError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        FormatError::Json(e.to_string())
    }
}

/// Decode the atlas file at `path`
pub fn parse(path: &Path) -> Result<ParsedAtlas, FormatError> {
    let bytes = fs::read(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_bytes(&bytes, base_dir)
}

/// Decode atlas bytes, resolving the image path against `base_dir`
pub fn parse_bytes(bytes: &[u8], base_dir: &Path) -> Result<ParsedAtlas, FormatError> {
    let mut atlas = texture_packer::parse(bytes)?;
    atlas.image = base_dir.join(&atlas.image);
    validate(&atlas)?;
    Ok(atlas)
}

/// Enforce the decoder's side of the contract: unique names, in-bounds regions
fn validate(atlas: &ParsedAtlas) -> Result<(), FormatError> {
    let mut seen = std::collections::HashSet::new();
    for frame in &atlas.frames {
        if !seen.insert(frame.name.as_str()) {
            return Err(FormatError::Invalid(format!(
                "duplicate sprite name '{}'",
                frame.name
            )));
        }
        if !frame
            .region
            .footprint()
            .fits_within(atlas.size.width, atlas.size.height)
        {
            return Err(FormatError::Invalid(format!(
                "sprite '{}' lies outside the {}x{} image",
                frame.name, atlas.size.width, atlas.size.height
            )));
        }
    }
    Ok(())
}
