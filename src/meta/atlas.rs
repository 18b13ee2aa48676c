//! Atlas meta - a packed sprite sheet and the sprites inside it
//!
//! Import runs in two phases:
//! 1. Copy the atlas description into the library under the atlas uuid,
//!    decode it into geometry and check the packed image against it.
//! 2. Cut one sprite frame per sub-meta out of the shared image and persist
//!    it under that sub-meta's own uuid.
//!
//! Sprite imports are independent: one failing sprite is logged and
//! reported, and its siblings are still imported.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::sprite::persist_frame;
use super::{meta_version, ImporterKind, MetaError, RawImage, SpriteMeta, SubMetaImporter, SubMetas};
use crate::assetdb::{append_extension, AssetDb};
use crate::atlas_format::{self, FormatError, ParsedAtlas};
use crate::sprite_frame::{create_sprite_frame, Size, SpriteFrame};

/// Strategy for sprites cut from an atlas image
#[derive(Debug)]
pub struct AtlasSpriteImporter;

pub(crate) static ATLAS_SPRITE_IMPORTER: AtlasSpriteImporter = AtlasSpriteImporter;

impl SubMetaImporter for AtlasSpriteImporter {
    fn kind(&self) -> ImporterKind {
        ImporterKind::AtlasSprite
    }

    fn import(
        &self,
        name: &str,
        meta: &SpriteMeta,
        raw: &RawImage,
        db: &dyn AssetDb,
    ) -> Result<SpriteFrame, MetaError> {
        let frame = create_sprite_frame(
            name,
            meta.region(),
            meta.borders,
            raw.uuid,
            raw.width,
            raw.height,
        )?;
        persist_frame(&meta.uuid, &frame, db)?;
        Ok(frame)
    }
}

/// One sprite persisted by an atlas import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSprite {
    pub name: String,
    pub uuid: Uuid,
    pub frame: SpriteFrame,
}

/// Result of a successful atlas import
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasImport {
    /// Library copy of the atlas description
    pub library_path: PathBuf,
    /// Persisted sprites in sub-meta order
    pub sprites: Vec<ImportedSprite>,
}

/// Persisted shape of an atlas meta (read side)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtlasRecord {
    #[serde(default = "meta_version")]
    ver: String,
    #[serde(default)]
    uuid: Option<Uuid>,
    #[serde(default)]
    raw_texture_uuid: Option<Uuid>,
    #[serde(default, rename = "type")]
    format: String,
    #[serde(default)]
    size: Size,
    #[serde(default)]
    sub_metas: Map<String, Value>,
}

/// Persisted shape of an atlas meta (write side)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AtlasRecordRef<'a> {
    ver: &'a str,
    uuid: &'a Uuid,
    raw_texture_uuid: &'a Option<Uuid>,
    #[serde(rename = "type")]
    format: &'a str,
    size: &'a Size,
    sub_metas: &'a SubMetas,
}

/// Meta for a packed sprite atlas
#[derive(Debug, Clone)]
pub struct AtlasMeta {
    pub ver: String,
    /// Atlas identity
    pub uuid: Uuid,
    /// Packed image, as resolved by the last parse
    pub raw_texture_path: PathBuf,
    pub raw_texture_uuid: Option<Uuid>,
    /// Packed image dimensions
    pub size: Size,
    /// Format discriminator reported by the decoder
    pub format: String,
    sub_metas: SubMetas,
}

impl AtlasMeta {
    /// Create an empty atlas meta for a freshly discovered atlas
    pub fn new(uuid: Uuid) -> Self {
        Self {
            ver: meta_version(),
            uuid,
            raw_texture_path: PathBuf::new(),
            raw_texture_uuid: None,
            size: Size::default(),
            format: String::new(),
            sub_metas: SubMetas::new(),
        }
    }

    /// Rebuild this meta from a persisted record
    ///
    /// Every `subMetas` entry becomes a new [`SpriteMeta`] under the same
    /// name, then all of them are bound to the atlas sprite importer. A
    /// missing `subMetas` gives an empty set; a missing `uuid` keeps the
    /// current one.
    pub fn deserialize(&mut self, record: &Value) -> Result<(), MetaError> {
        let record = AtlasRecord::deserialize(record)?;

        // Build everything first so a bad sub-record leaves `self` untouched
        let mut sub_metas = SubMetas::new();
        for (name, data) in &record.sub_metas {
            let mut meta = SpriteMeta::new();
            meta.deserialize(data)?;
            sub_metas.insert(name.clone(), meta);
        }

        self.ver = record.ver;
        if let Some(uuid) = record.uuid {
            self.uuid = uuid;
        }
        self.raw_texture_uuid = record.raw_texture_uuid;
        self.format = record.format;
        self.size = record.size;
        self.sub_metas = sub_metas;

        self.bind_sub_importers();
        Ok(())
    }

    /// Persisted form of this meta
    pub fn serialize(&self) -> Result<Value, MetaError> {
        let record = AtlasRecordRef {
            ver: &self.ver,
            uuid: &self.uuid,
            raw_texture_uuid: &self.raw_texture_uuid,
            format: &self.format,
            size: &self.size,
            sub_metas: &self.sub_metas,
        };
        Ok(serde_json::to_value(record)?)
    }

    /// Load a meta record from a `.meta` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MetaError> {
        let bytes = fs::read(path.as_ref()).map_err(crate::assetdb::StorageError::from)?;
        let record: Value = serde_json::from_slice(&bytes)?;
        let mut meta = Self::new(super::generate_uuid());
        meta.deserialize(&record)?;
        Ok(meta)
    }

    /// Write the meta record as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MetaError> {
        let json = serde_json::to_string_pretty(&self.serialize()?)?;
        fs::write(path.as_ref(), json).map_err(crate::assetdb::StorageError::from)?;
        Ok(())
    }

    pub fn sub_metas(&self) -> &SubMetas {
        &self.sub_metas
    }

    pub fn sub_metas_mut(&mut self) -> &mut SubMetas {
        &mut self.sub_metas
    }

    /// Point every sub-meta at the atlas sprite importer
    pub fn bind_sub_importers(&mut self) {
        for (_, meta) in self.sub_metas.iter_mut() {
            meta.bind_importer(&ATLAS_SPRITE_IMPORTER);
        }
    }

    /// Library path of the atlas itself
    ///
    /// Always exactly one path; sprite artifacts are listed by `sub_dests`.
    pub fn dest(&self, db: &dyn AssetDb) -> Vec<PathBuf> {
        vec![append_extension(db.uuid_to_import_path_no_ext(&self.uuid), "json")]
    }

    /// Library paths of every sprite artifact, in sub-meta order
    pub fn sub_dests(&self, db: &dyn AssetDb) -> Vec<PathBuf> {
        self.sub_metas.iter().map(|(_, meta)| meta.dest(db)).collect()
    }

    /// Import the atlas described by `raw_file_path`
    ///
    /// Only `.json` descriptions are accepted. Copy, parse and image failures
    /// abort before any sprite is imported; the packed image must exist and
    /// match the declared size. A copy that succeeded is left in the library
    /// when a later step fails.
    pub fn import(&mut self, raw_file_path: &Path, db: &dyn AssetDb) -> Result<AtlasImport, MetaError> {
        info!("Importing atlas {} ({})", raw_file_path.display(), self.uuid);

        let is_json = raw_file_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            return Err(MetaError::Format(FormatError::Unrecognized(format!(
                "{} is not a .json atlas description",
                raw_file_path.display()
            ))));
        }

        let library_path = db.copy_asset_to_library(&self.uuid, raw_file_path)?;
        let parsed = atlas_format::parse(raw_file_path)?;

        // Regions were checked against the declared size; the real image must match it
        let probed = RawImage::probe(&parsed.image, None)?;
        if (probed.width, probed.height) != (parsed.size.width, parsed.size.height) {
            return Err(MetaError::SizeMismatch {
                image: parsed.image,
                declared: (parsed.size.width, parsed.size.height),
                actual: (probed.width, probed.height),
            });
        }

        self.apply_parsed(parsed, db);
        self.bind_sub_importers();

        let raw = RawImage {
            uuid: self.raw_texture_uuid,
            ..probed
        };
        let mut sprites = Vec::with_capacity(self.sub_metas.len());
        let mut failures = Vec::new();
        for (name, meta) in self.sub_metas.iter() {
            match meta.import(name, &raw, db) {
                Ok(frame) => sprites.push(ImportedSprite {
                    name: name.to_string(),
                    uuid: meta.uuid,
                    frame,
                }),
                Err(e) => {
                    error!("Failed to import sprite '{}': {}", name, e);
                    failures.push((name.to_string(), e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(MetaError::SubImports(failures));
        }

        info!("Imported {} sprite(s) from {}", sprites.len(), raw_file_path.display());
        Ok(AtlasImport {
            library_path,
            sprites,
        })
    }

    /// Callback-style import: `callback` runs exactly once, after every
    /// sprite import has finished
    pub fn import_with<F>(&mut self, raw_file_path: &Path, db: &dyn AssetDb, callback: F)
    where
        F: FnOnce(Result<AtlasImport, MetaError>),
    {
        callback(self.import(raw_file_path, db));
    }

    /// Take decoded geometry, rebuilding sub-metas as a set
    ///
    /// Sprites that keep their name keep their meta (uuid, borders); new
    /// names get fresh metas; names no longer in the atlas are dropped.
    fn apply_parsed(&mut self, parsed: ParsedAtlas, db: &dyn AssetDb) {
        self.format = parsed.format;
        self.size = parsed.size;

        match db.fspath_to_uuid(&parsed.image) {
            Some(uuid) => self.raw_texture_uuid = Some(uuid),
            None => warn!(
                "Atlas image {} is not registered, keeping texture uuid {:?}",
                parsed.image.display(),
                self.raw_texture_uuid
            ),
        }
        self.raw_texture_path = parsed.image;

        let mut previous: HashMap<String, SpriteMeta> =
            std::mem::take(&mut self.sub_metas).into_iter().collect();
        for frame in parsed.frames {
            let mut meta = previous.remove(&frame.name).unwrap_or_default();
            meta.set_region(frame.region);
            self.sub_metas.insert(frame.name, meta);
        }
        for name in previous.keys() {
            debug!("Dropping sub-meta '{}' no longer in atlas", name);
        }
    }
}
