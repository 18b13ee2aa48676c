//! Asset Meta Records
//!
//! Every source asset has a `.meta` JSON record next to it holding its uuid
//! and import settings. An atlas meta additionally owns one sub-meta per
//! packed sprite, each with its own uuid, so every sprite is persisted as an
//! independent library artifact.
//!
//! ```text
//! AtlasMeta (hero.json.meta)
//! ├── uuid
//! ├── rawTextureUuid ──────────► hero.png
//! └── subMetas
//!     ├── "idle" ─► SpriteMeta { uuid, borders, importer: AtlasSpriteImporter }
//!     └── "walk" ─► SpriteMeta { uuid, borders, importer: AtlasSpriteImporter }
//! ```
//!
//! ## Import Strategies
//!
//! How a [`SpriteMeta`] imports depends on who owns it. A standalone sprite
//! imports its own image file ([`GenericSpriteImporter`]); a sprite inside an
//! atlas is cut from the shared atlas image ([`AtlasSpriteImporter`]). The
//! owning atlas injects its strategy into every sub-meta after deserializing
//! and again before each import.

mod atlas;
mod sprite;
mod sub_metas;

pub use atlas::{AtlasImport, AtlasMeta, AtlasSpriteImporter, ImportedSprite};
pub use sprite::{GenericSpriteImporter, SpriteMeta};
pub use sub_metas::SubMetas;

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::assetdb::{AssetDb, StorageError};
use crate::atlas_format::FormatError;
use crate::sprite_frame::{FrameError, SpriteFrame};

/// Meta record format version
pub const META_VERSION: &str = "1.0.2";

/// Generate a fresh asset uuid
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

pub(crate) fn meta_version() -> String {
    META_VERSION.to_string()
}

/// Error type for meta operations
#[derive(Debug)]
pub enum MetaError {
    /// Copying or persisting through the asset database failed
    Storage(StorageError),
    /// The atlas description could not be decoded
    Format(FormatError),
    /// A sprite frame could not be built
    Frame(FrameError),
    /// A meta record has the wrong shape
    Json(serde_json::Error),
    /// A raw image could not be probed
    Image(String),
    /// The packed image is not the size the atlas declares
    SizeMismatch {
        image: PathBuf,
        declared: (u32, u32),
        actual: (u32, u32),
    },
    /// Some sprites failed to import; the rest were persisted
    SubImports(Vec<(String, MetaError)>),
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::Storage(e) => write!(f, "Storage error: {}", e),
            MetaError::Format(e) => write!(f, "Format error: {}", e),
            MetaError::Frame(e) => write!(f, "Sprite frame error: {}", e),
            MetaError::Json(e) => write!(f, "Meta record error: {}", e),
            MetaError::Image(msg) => write!(f, "Image error: {}", msg),
            MetaError::SizeMismatch {
                image,
                declared,
                actual,
            } => write!(
                f,
                "{} is {}x{} but the atlas declares {}x{}",
                image.display(),
                actual.0,
                actual.1,
                declared.0,
                declared.1
            ),
            MetaError::SubImports(failures) => {
                write!(f, "{} sprite(s) failed to import:", failures.len())?;
                for (name, e) in failures {
                    write!(f, " [{}: {}]", name, e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MetaError {}

impl From<StorageError> for MetaError {
    fn from(e: StorageError) -> Self {
        MetaError::Storage(e)
    }
}

impl From<FormatError> for MetaError {
    fn from(e: FormatError) -> Self {
        MetaError::Format(e)
    }
}

impl From<FrameError> for MetaError {
    fn from(e: FrameError) -> Self {
        MetaError::Frame(e)
    }
}

impl From<serde_json::Error> for MetaError {
    fn from(e: serde_json::Error) -> Self {
        MetaError::Json(e)
    }
}

/// The packed image backing a set of sprites
///
/// Passed explicitly into every sprite import so sub-metas never read
/// dimensions off their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub path: PathBuf,
    pub uuid: Option<Uuid>,
    pub width: u32,
    pub height: u32,
}

impl RawImage {
    /// Describe an image file by reading its header
    pub fn probe(path: &Path, uuid: Option<Uuid>) -> Result<Self, MetaError> {
        let (width, height) = image::image_dimensions(path)
            .map_err(|e| MetaError::Image(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path: path.to_path_buf(),
            uuid,
            width,
            height,
        })
    }
}

/// Which strategy a sub-meta is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterKind {
    GenericSprite,
    AtlasSprite,
}

/// Sprite import strategy
///
/// Builds a sprite frame for `meta` out of `raw` and persists it under the
/// sub-meta's own uuid.
pub trait SubMetaImporter: fmt::Debug + Sync {
    fn kind(&self) -> ImporterKind;

    fn import(
        &self,
        name: &str,
        meta: &SpriteMeta,
        raw: &RawImage,
        db: &dyn AssetDb,
    ) -> Result<SpriteFrame, MetaError>;
}
