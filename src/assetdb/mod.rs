//! Asset Database Binding
//!
//! The import pipeline never touches the library directory on its own. Everything
//! it needs from the outside goes through [`AssetDb`]:
//! - uuid ↔ source path resolution
//! - copying raw source files into the library (`copy_asset_to_library`)
//! - persisting derived artifacts such as sprite frames (`save_asset_to_library`)
//!
//! ## Library Layout
//!
//! ```text
//! library/
//! └── imports/
//!     └── 3f/                      # first two characters of the uuid
//!         ├── 3f2a...c1.json       # copied raw file (source extension kept)
//!         └── ...
//! ```

mod library;

pub use library::LibraryDb;

use serde_json::Value;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Storage error types
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// File or directory not found
    NotFound(String),
    /// Permission denied
    PermissionDenied(String),
    /// I/O error
    IoError(String),
    /// Serialization/deserialization error
    SerdeError(String),
    /// Other error
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(path) => write!(f, "not found: {}", path),
            StorageError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StorageError::SerdeError(msg) => write!(f, "serialization error: {}", msg),
            StorageError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(e.to_string()),
            _ => StorageError::IoError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerdeError(e.to_string())
    }
}

/// Everything the import pipeline needs from an asset database
///
/// Implementations own uuid assignment and the on-disk library layout.
/// Metas only ever talk to the database through this trait, so tests can
/// swap in a recording implementation.
pub trait AssetDb {
    /// Source path registered for `uuid`, if any
    fn uuid_to_fspath(&self, uuid: &Uuid) -> Option<PathBuf>;

    /// Uuid registered for a source path, if any
    fn fspath_to_uuid(&self, path: &Path) -> Option<Uuid>;

    /// Library path for `uuid` without a file extension
    fn uuid_to_import_path_no_ext(&self, uuid: &Uuid) -> PathBuf;

    /// Copy a raw source file into the library under `uuid`
    ///
    /// The source file's extension is kept. Returns the library path written.
    fn copy_asset_to_library(&self, uuid: &Uuid, source: &Path) -> Result<PathBuf, StorageError>;

    /// Persist a derived artifact under `uuid` as `<uuid>.json`
    ///
    /// Returns the library path written.
    fn save_asset_to_library(&self, uuid: &Uuid, artifact: &Value) -> Result<PathBuf, StorageError>;
}

/// Append `.ext` to a path without replacing anything already after a dot
///
/// Uuid-based library paths never carry an extension, but sprite names can
/// contain dots, so `Path::with_extension` is not safe here.
pub fn append_extension(path: impl Into<PathBuf>, ext: impl AsRef<OsStr>) -> PathBuf {
    let mut os = path.into().into_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}
