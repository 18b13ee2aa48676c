//! Sprite meta - one sprite, standalone or packed inside an atlas

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

use super::{generate_uuid, meta_version, ImporterKind, MetaError, RawImage, SubMetaImporter};
use crate::assetdb::{append_extension, AssetDb};
use crate::sprite_frame::{create_sprite_frame, Borders, SpriteFrame, SpriteRegion};

/// Strategy for sprites that own their image file
#[derive(Debug)]
pub struct GenericSpriteImporter;

pub(crate) static GENERIC_SPRITE_IMPORTER: GenericSpriteImporter = GenericSpriteImporter;

fn default_importer() -> &'static dyn SubMetaImporter {
    &GENERIC_SPRITE_IMPORTER
}

impl SubMetaImporter for GenericSpriteImporter {
    fn kind(&self) -> ImporterKind {
        ImporterKind::GenericSprite
    }

    /// The whole image is the sprite; any decoded geometry is ignored
    fn import(
        &self,
        name: &str,
        meta: &SpriteMeta,
        raw: &RawImage,
        db: &dyn AssetDb,
    ) -> Result<SpriteFrame, MetaError> {
        let region = SpriteRegion::full(raw.width, raw.height);
        let frame = create_sprite_frame(name, &region, meta.borders, raw.uuid, raw.width, raw.height)?;
        persist_frame(&meta.uuid, &frame, db)?;
        Ok(frame)
    }
}

/// Save a built frame under a sprite's own uuid
pub(crate) fn persist_frame(
    uuid: &Uuid,
    frame: &SpriteFrame,
    db: &dyn AssetDb,
) -> Result<PathBuf, MetaError> {
    let artifact = frame.to_artifact()?;
    let path = db.save_asset_to_library(uuid, &artifact)?;
    debug!("Persisted sprite '{}' as {}", frame.name, uuid);
    Ok(path)
}

/// Meta for a single sprite
///
/// Only identity and user-editable settings are persisted. Geometry comes
/// from decoding the raw image every time and is never read from the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteMeta {
    #[serde(default = "meta_version")]
    pub ver: String,

    /// Stable identity; independent of any owning atlas
    #[serde(default = "generate_uuid")]
    pub uuid: Uuid,

    /// Nine-slice insets
    #[serde(flatten)]
    pub borders: Borders,

    /// Decoded geometry (not persisted)
    #[serde(skip)]
    region: SpriteRegion,

    /// Import strategy (not persisted)
    #[serde(skip, default = "default_importer")]
    importer: &'static dyn SubMetaImporter,
}

impl SpriteMeta {
    /// Create a sprite meta with a fresh uuid and the generic importer
    pub fn new() -> Self {
        Self::with_uuid(generate_uuid())
    }

    /// Create a sprite meta with a known uuid
    pub fn with_uuid(uuid: Uuid) -> Self {
        Self {
            ver: meta_version(),
            uuid,
            borders: Borders::default(),
            region: SpriteRegion::default(),
            importer: default_importer(),
        }
    }

    /// Overwrite persisted fields from a sub-record
    ///
    /// Geometry and the bound importer are left untouched. Unknown keys are
    /// ignored; a missing uuid gets a fresh one.
    pub fn deserialize(&mut self, record: &Value) -> Result<(), MetaError> {
        let parsed = SpriteMeta::deserialize_record(record)?;
        self.ver = parsed.ver;
        self.uuid = parsed.uuid;
        self.borders = parsed.borders;
        Ok(())
    }

    fn deserialize_record(record: &Value) -> Result<SpriteMeta, serde_json::Error> {
        <SpriteMeta as Deserialize>::deserialize(record)
    }

    /// Persisted form of this meta
    pub fn serialize(&self) -> Result<Value, MetaError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decoded geometry
    pub fn region(&self) -> &SpriteRegion {
        &self.region
    }

    pub fn set_region(&mut self, region: SpriteRegion) {
        self.region = region;
    }

    /// Strategy this meta currently imports with
    pub fn importer_kind(&self) -> ImporterKind {
        self.importer.kind()
    }

    /// Replace the import strategy
    pub fn bind_importer(&mut self, importer: &'static dyn SubMetaImporter) {
        self.importer = importer;
    }

    /// Build and persist this sprite's frame from `raw`
    pub fn import(&self, name: &str, raw: &RawImage, db: &dyn AssetDb) -> Result<SpriteFrame, MetaError> {
        self.importer.import(name, self, raw, db)
    }

    /// Library path of this sprite's frame artifact
    pub fn dest(&self, db: &dyn AssetDb) -> PathBuf {
        append_extension(db.uuid_to_import_path_no_ext(&self.uuid), "json")
    }
}

impl Default for SpriteMeta {
    fn default() -> Self {
        Self::new()
    }
}
