//! Publish receipts.
//!
//! The publish stage's only output is a remote identifier. Writing it to
//! `{item_key}_{publish_receipt}` gives that stage an artifact like every
//! other, so an uploaded video is never uploaded twice.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use filingcast_shared::{FilingcastError, ItemKey, Result, Visibility};

/// Confirmation of one successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub item_key: ItemKey,
    /// Identifier returned by the publishing service.
    pub content_id: String,
    pub title: String,
    pub visibility: Visibility,
    /// SHA-256 of the uploaded video file.
    pub video_sha256: String,
    pub published_at: DateTime<Utc>,
}

impl PublishReceipt {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| FilingcastError::parse(format!("serialize receipt: {e}")))?;
        std::fs::write(path, json).map_err(|e| FilingcastError::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FilingcastError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            FilingcastError::parse(format!("invalid receipt {}: {e}", path.display()))
        })
    }
}

/// Hex SHA-256 digest of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| FilingcastError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| FilingcastError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_known_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("v.mp4");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn receipt_persists_to_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Acme_20250512_published.json");
        let receipt = PublishReceipt {
            item_key: ItemKey::new("Acme", None),
            content_id: "dQw4w9WgXcQ".into(),
            title: "Acme 決算サマリー".into(),
            visibility: Visibility::Private,
            video_sha256: "00".repeat(32),
            published_at: Utc::now(),
        };
        receipt.write(&path).unwrap();

        let loaded = PublishReceipt::read(&path).unwrap();
        assert_eq!(loaded, receipt);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"visibility\": \"private\""));
    }

    #[test]
    fn corrupt_receipt_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("r.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            PublishReceipt::read(&path),
            Err(FilingcastError::Parse { .. })
        ));
    }
}
