//! Library Database - filesystem-backed [`AssetDb`]
//!
//! Keeps a uuid ↔ source path registry in memory and writes imported
//! artifacts under `<library_dir>/<imports_dir>/<uuid[0..2]>/`.
//! Source paths are stored exactly as registered; callers that mix relative
//! and absolute paths must normalize them first.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{append_extension, AssetDb, StorageError};
use crate::config::LibraryConfig;
use crate::meta::{generate_uuid, META_VERSION};

/// The identity part of any meta record
///
/// Every `.meta` file carries at least these two fields, whatever the asset
/// type; the registry only needs the uuid.
#[derive(Debug, Serialize, Deserialize)]
struct IdentityRecord {
    #[serde(default)]
    ver: String,
    uuid: Uuid,
}

/// Filesystem asset database
#[derive(Debug)]
pub struct LibraryDb {
    /// Library root
    library_dir: PathBuf,
    /// Subdirectory of the root that holds imported artifacts
    imports_dir: String,
    /// Uuid -> source path
    by_uuid: HashMap<Uuid, PathBuf>,
    /// Source path -> uuid
    by_path: HashMap<PathBuf, Uuid>,
}

impl LibraryDb {
    /// Create an empty database rooted at `library_dir`
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
            imports_dir: LibraryConfig::default().imports_dir,
            by_uuid: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// Create an empty database using the layout from a config
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self {
            library_dir: config.library_dir.clone(),
            imports_dir: config.imports_dir.clone(),
            by_uuid: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// Register a source path under a uuid
    ///
    /// Re-registering either side replaces the old mapping.
    pub fn register(&mut self, uuid: Uuid, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(old_path) = self.by_uuid.remove(&uuid) {
            self.by_path.remove(&old_path);
        }
        if let Some(old_uuid) = self.by_path.remove(&path) {
            self.by_uuid.remove(&old_uuid);
        }
        self.by_uuid.insert(uuid, path.clone());
        self.by_path.insert(path, uuid);
    }

    /// Remove a registration
    pub fn unregister(&mut self, uuid: &Uuid) -> Option<PathBuf> {
        let path = self.by_uuid.remove(uuid)?;
        self.by_path.remove(&path);
        Some(path)
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.by_uuid.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.by_uuid.is_empty()
    }

    /// Library root directory
    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// Directory holding all imported artifacts
    pub fn imports_root(&self) -> PathBuf {
        self.library_dir.join(&self.imports_dir)
    }

    /// Return the uuid recorded in `<path>.<meta_ext>`, creating the meta if needed
    ///
    /// The source is registered either way. A meta record that exists but
    /// cannot be parsed is an error rather than silently getting a new uuid,
    /// since that would orphan every artifact imported under the old one.
    pub fn assign_uuid(&mut self, path: &Path, meta_ext: &str) -> Result<Uuid, StorageError> {
        let meta_path = append_extension(path, meta_ext);

        let uuid = if meta_path.exists() {
            let bytes = fs::read(&meta_path)?;
            let record: IdentityRecord = serde_json::from_slice(&bytes)?;
            record.uuid
        } else {
            let record = IdentityRecord {
                ver: META_VERSION.to_string(),
                uuid: generate_uuid(),
            };
            write_file(&meta_path, serde_json::to_string_pretty(&record)?.as_bytes())?;
            info!("Assigned {} to {}", record.uuid, path.display());
            record.uuid
        };

        self.register(uuid, path);
        Ok(uuid)
    }

    /// Read back an artifact persisted with `save_asset_to_library`
    pub fn load_asset_from_library(&self, uuid: &Uuid) -> Result<Value, StorageError> {
        let path = append_extension(self.uuid_to_import_path_no_ext(uuid), "json");
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Check if an artifact exists for `uuid`
    pub fn artifact_exists(&self, uuid: &Uuid) -> bool {
        append_extension(self.uuid_to_import_path_no_ext(uuid), "json").exists()
    }
}

impl AssetDb for LibraryDb {
    fn uuid_to_fspath(&self, uuid: &Uuid) -> Option<PathBuf> {
        self.by_uuid.get(uuid).cloned()
    }

    fn fspath_to_uuid(&self, path: &Path) -> Option<Uuid> {
        self.by_path.get(path).copied()
    }

    fn uuid_to_import_path_no_ext(&self, uuid: &Uuid) -> PathBuf {
        let name = uuid.hyphenated().to_string();
        self.imports_root().join(&name[..2]).join(name)
    }

    fn copy_asset_to_library(&self, uuid: &Uuid, source: &Path) -> Result<PathBuf, StorageError> {
        let no_ext = self.uuid_to_import_path_no_ext(uuid);
        let dest = match source.extension() {
            Some(ext) => append_extension(no_ext, ext),
            None => no_ext,
        };

        if !source.is_file() {
            return Err(StorageError::NotFound(source.display().to_string()));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &dest)?;
        debug!("Copied {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    fn save_asset_to_library(&self, uuid: &Uuid, artifact: &Value) -> Result<PathBuf, StorageError> {
        let dest = append_extension(self.uuid_to_import_path_no_ext(uuid), "json");
        let json = serde_json::to_string_pretty(artifact)?;
        write_file(&dest, json.as_bytes())?;
        debug!("Saved artifact {}", dest.display());
        Ok(dest)
    }
}

/// Write a file, creating parent directories first
fn write_file(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_test_db() -> (TempDir, LibraryDb) {
        let dir = TempDir::new().unwrap();
        let db = LibraryDb::new(dir.path().join("library"));
        (dir, db)
    }

    #[test]
    fn test_register_and_resolve() {
        let (_dir, mut db) = setup_test_db();
        let uuid = generate_uuid();

        db.register(uuid, "assets/hero.json");
        assert_eq!(db.len(), 1);
        assert_eq!(db.uuid_to_fspath(&uuid), Some(PathBuf::from("assets/hero.json")));
        assert_eq!(db.fspath_to_uuid(Path::new("assets/hero.json")), Some(uuid));

        // Moving the source replaces the old path mapping
        db.register(uuid, "assets/renamed.json");
        assert_eq!(db.len(), 1);
        assert_eq!(db.fspath_to_uuid(Path::new("assets/hero.json")), None);

        assert_eq!(db.unregister(&uuid), Some(PathBuf::from("assets/renamed.json")));
        assert!(db.is_empty());
    }

    #[test]
    fn test_import_path_layout() {
        let (dir, db) = setup_test_db();
        let uuid = Uuid::parse_str("3f2a8c1e-0000-4000-8000-000000000001").unwrap();

        let path = db.uuid_to_import_path_no_ext(&uuid);
        assert_eq!(
            path,
            dir.path()
                .join("library/imports/3f/3f2a8c1e-0000-4000-8000-000000000001")
        );
    }

    #[test]
    fn test_copy_keeps_extension() {
        let (dir, db) = setup_test_db();
        let source = dir.path().join("hero.json");
        fs::write(&source, b"{}").unwrap();
        let uuid = generate_uuid();

        let dest = db.copy_asset_to_library(&uuid, &source).unwrap();
        assert_eq!(dest.extension().unwrap(), "json");
        assert_eq!(fs::read(&dest).unwrap(), b"{}");
    }

    #[test]
    fn test_copy_missing_source() {
        let (dir, db) = setup_test_db();
        let result = db.copy_asset_to_library(&generate_uuid(), &dir.path().join("missing.json"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!db.imports_root().exists());
    }

    #[test]
    fn test_save_and_load_artifact() {
        let (_dir, db) = setup_test_db();
        let uuid = generate_uuid();
        assert!(!db.artifact_exists(&uuid));

        let artifact = json!({ "__type__": "SpriteFrame", "name": "hero_idle" });
        db.save_asset_to_library(&uuid, &artifact).unwrap();

        assert!(db.artifact_exists(&uuid));
        assert_eq!(db.load_asset_from_library(&uuid).unwrap(), artifact);
    }

    #[test]
    fn test_assign_uuid_is_stable() {
        let (dir, mut db) = setup_test_db();
        let image = dir.path().join("hero.png");
        fs::write(&image, b"not really a png").unwrap();

        let first = db.assign_uuid(&image, "meta").unwrap();
        assert!(dir.path().join("hero.png.meta").exists());

        let mut other = LibraryDb::new(dir.path().join("library"));
        let second = other.assign_uuid(&image, "meta").unwrap();
        assert_eq!(first, second);
        assert_eq!(other.fspath_to_uuid(&image), Some(first));
    }
}
