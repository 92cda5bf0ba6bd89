//! services/web/src/adapters/fs_store.rs
//!
//! This module contains the storage adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. Every save becomes a new
//! timestamped JSON file in a per-user directory; nothing is ever deleted.

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;
use visit_core::domain::Document;
use visit_core::ports::{DocumentStore, PortError, PortResult};

use crate::web::protocol::document_fields;

/// `strftime` pattern for the file name of a saved document.
const FILE_NAME_FORMAT: &str = "%y%m%d_%H%M%S.json";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document store rooted at the configured save directory.
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Creates a new `FsDocumentStore`. The root is expected to exist already.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding every saved version for `user_id`.
    pub fn user_dir(&self, user_id: i64) -> PathBuf {
        self.root.join(format!("{:05}", user_id))
    }
}

//=========================================================================================
// On-Disk Record Struct
//=========================================================================================

/// The JSON shape of a stored document file. Unknown fields are ignored when
/// reading so hand-edited files still load.
#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct DocumentRecord {
    #[serde(rename = "UserId")]
    user_id: i64,
    #[serde(rename = "UserName")]
    user_name: String,
    #[serde(rename = "Version")]
    version: u64,
    #[serde(rename = "Data")]
    data: Option<Map<String, Value>>,
}

impl DocumentRecord {
    fn from_domain(doc: &Document) -> Self {
        Self {
            user_id: doc.owner_id,
            user_name: doc.owner_name.clone(),
            version: doc.version,
            data: doc.payload.clone(),
        }
    }

    fn to_domain(self) -> Document {
        Document {
            owner_id: self.user_id,
            owner_name: self.user_name,
            version: self.version,
            payload: self.data,
        }
    }
}

/// Parses a stored file, matching field names regardless of ASCII case.
fn decode_document(bytes: &[u8]) -> Result<Document, serde_json::Error> {
    let record: DocumentRecord = serde_json::from_value(Value::Object(document_fields(bytes)?))?;
    Ok(record.to_domain())
}

/// Serializes a document the way it is written to disk: one-space indented
/// JSON followed by a newline.
pub fn encode_document(doc: &Document) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    DocumentRecord::from_domain(doc).serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

//=========================================================================================
// Directory Scan
//=========================================================================================

/// Returns the regular file in `dir` with the newest modification time.
///
/// Entries are visited in file-name order and only a strictly newer mtime
/// replaces the current pick, so ties go to the smallest name.
pub async fn latest_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            files.push((entry.file_name(), metadata.modified()?));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut latest: Option<(std::ffi::OsString, SystemTime)> = None;
    for (name, modified) in files {
        match &latest {
            Some((_, newest)) if modified <= *newest => {}
            _ => latest = Some((name, modified)),
        }
    }
    Ok(latest.map(|(name, _)| dir.join(name)))
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load_latest(&self, user_id: i64) -> PortResult<Option<Document>> {
        let dir = self.user_dir(user_id);
        match tokio::fs::metadata(&dir).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PortError::Storage(format!("{}: {}", dir.display(), e))),
        }

        let path = match latest_file(&dir).await {
            Ok(Some(path)) => path,
            Ok(None) => return Ok(None),
            Err(e) => {
                return Err(PortError::Storage(format!(
                    "unable to read directory {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        info!("Loading document data from: {}", path.display());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| PortError::Storage(format!("{}: {}", path.display(), e)))?;
        let document = decode_document(&bytes)
            .map_err(|e| PortError::Malformed(format!("{}: {}", path.display(), e)))?;

        Ok(Some(document))
    }

    async fn save(&self, document: &Document) -> PortResult<PathBuf> {
        let dir = self.user_dir(document.owner_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PortError::Storage(format!("unable to create directory {}: {}", dir.display(), e))
        })?;

        let path = dir.join(Local::now().format(FILE_NAME_FORMAT).to_string());
        let bytes = encode_document(document)
            .map_err(|e| PortError::Unexpected(format!("unable to encode document: {}", e)))?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            PortError::Storage(format!("unable to write {}: {}", path.display(), e))
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn set_mtime(path: &Path, secs_after_epoch: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
            .unwrap();
    }

    fn doc(owner_id: i64, owner_name: &str, version: u64, payload: Value) -> Document {
        Document {
            owner_id,
            owner_name: owner_name.to_string(),
            version,
            payload: payload.as_object().cloned(),
        }
    }

    #[test]
    fn test_user_dir_is_zero_padded() {
        let store = FsDocumentStore::new("/data");
        assert_eq!(store.user_dir(42), PathBuf::from("/data/00042"));
        assert_eq!(store.user_dir(123456), PathBuf::from("/data/123456"));
    }

    #[test]
    fn test_encode_document_uses_wire_field_names() {
        let bytes = encode_document(&doc(42, "Alice", 1, json!({"x": 1}))).unwrap();

        assert!(bytes.ends_with(b"\n"));
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({"UserId": 42, "UserName": "Alice", "Version": 1, "Data": {"x": 1}})
        );
    }

    #[tokio::test]
    async fn test_load_latest_without_history_is_none() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        assert!(store.load_latest(42).await.unwrap().is_none());

        std::fs::create_dir(store.user_dir(42)).unwrap();
        assert!(store.load_latest(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_latest() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        let path = store.save(&doc(42, "Alice", 2, json!({"x": 1}))).await.unwrap();

        assert_eq!(path.parent().unwrap(), store.user_dir(42));
        assert!(path.extension().is_some_and(|ext| ext == "json"));
        let loaded = store.load_latest(42).await.unwrap().unwrap();
        assert_eq!(loaded, doc(42, "Alice", 2, json!({"x": 1})));
    }

    #[tokio::test]
    async fn test_load_latest_picks_newest_mtime_not_name() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let user_dir = store.user_dir(7);
        std::fs::create_dir_all(&user_dir).unwrap();

        let older = user_dir.join("991231_235959.json");
        let newer = user_dir.join("000101_000000.json");
        std::fs::write(&older, br#"{"UserId":7,"Version":1,"Data":{"v":"old"}}"#).unwrap();
        std::fs::write(&newer, br#"{"UserId":7,"Version":2,"Data":{"v":"new"}}"#).unwrap();
        set_mtime(&older, 1_000);
        set_mtime(&newer, 2_000);
        std::fs::create_dir(user_dir.join("zz_subdir")).unwrap();

        let loaded = store.load_latest(7).await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.payload.unwrap().get("v"), Some(&json!("new")));
    }

    #[test]
    fn test_encode_document_keeps_null_data() {
        let mut document = doc(42, "Alice", 1, json!({}));
        document.payload = None;

        let value: Value = serde_json::from_slice(&encode_document(&document).unwrap()).unwrap();
        assert_eq!(value["Data"], Value::Null);
    }

    #[tokio::test]
    async fn test_load_latest_accepts_hand_edited_field_names() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        std::fs::create_dir_all(store.user_dir(3)).unwrap();
        std::fs::write(
            store.user_dir(3).join("edited.json"),
            br#"{"userid":3,"USERNAME":"Cy","version":4,"data":{"k":true},"note":"ignored"}"#,
        )
        .unwrap();

        let loaded = store.load_latest(3).await.unwrap().unwrap();
        assert_eq!(loaded, doc(3, "Cy", 4, json!({"k": true})));
    }

    #[tokio::test]
    async fn test_load_latest_keeps_null_data() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        std::fs::create_dir_all(store.user_dir(8)).unwrap();
        std::fs::write(store.user_dir(8).join("a.json"), br#"{"Version":1,"Data":null}"#)
            .unwrap();

        let loaded = store.load_latest(8).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.payload.is_none());
    }

    #[tokio::test]
    async fn test_latest_file_ties_go_to_smallest_name() {
        let dir = tempdir().unwrap();
        for name in ["b.json", "a.json", "c.json"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"{}").unwrap();
            set_mtime(&path, 5_000);
        }

        let latest = latest_file(dir.path()).await.unwrap().unwrap();
        assert_eq!(latest, dir.path().join("a.json"));
    }

    #[tokio::test]
    async fn test_load_latest_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        std::fs::create_dir_all(store.user_dir(9)).unwrap();
        std::fs::write(store.user_dir(9).join("x.json"), b"not json").unwrap();

        let err = store.load_latest(9).await.unwrap_err();
        assert!(matches!(err, PortError::Malformed(_)));

        std::fs::write(store.user_dir(9).join("x.json"), b"[1, 2]").unwrap();
        let err = store.load_latest(9).await.unwrap_err();
        assert!(matches!(err, PortError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_save_fails_when_user_dir_is_a_file() {
        let dir = tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        std::fs::write(store.user_dir(5), b"in the way").unwrap();

        let err = store.save(&doc(5, "Dan", 1, json!({}))).await.unwrap_err();
        assert!(matches!(err, PortError::Storage(_)));
    }
}
