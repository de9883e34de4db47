//! Item enumeration from the output directory.

use chrono::NaiveDate;
use tracing::{debug, instrument};

use filingcast_shared::{FilingcastError, Item, Result};

use crate::naming::{ArtifactKind, ArtifactPaths};

/// List every item that has an artifact of `kind` in the output directory.
///
/// Items are returned sorted by file name so that discovery order is stable
/// across platforms. A missing directory yields no items.
#[instrument(skip(paths), fields(dir = %paths.dir().display()))]
pub fn discover_items(paths: &ArtifactPaths, kind: ArtifactKind) -> Result<Vec<Item>> {
    let dir = paths.dir();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("output directory missing, nothing to discover");
            return Ok(Vec::new());
        }
        Err(e) => return Err(FilingcastError::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FilingcastError::io(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    let items: Vec<Item> = names
        .iter()
        .filter_map(|name| paths.item_from_file_name(name, kind))
        .collect();

    debug!(kind = %kind, count = items.len(), "items discovered");
    Ok(items)
}

/// Keep only items published on `date`. Undated items never match.
pub fn filter_by_date(items: Vec<Item>, date: NaiveDate) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| item.publication_date == Some(date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use filingcast_shared::SuffixConfig;

    fn touch(dir: &std::path::Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn discovers_raw_documents_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Zeta_20250512_qualitative.htm");
        touch(tmp.path(), "Acme_20250512_qualitative.htm");
        touch(tmp.path(), "Acme_20250512_output.mp3");
        touch(tmp.path(), "notes.txt");
        std::fs::create_dir(tmp.path().join("Dir_20250512_qualitative.htm")).unwrap();

        let paths = ArtifactPaths::new(tmp.path(), SuffixConfig::default());
        let items = discover_items(&paths, ArtifactKind::RawDocument).unwrap();
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["Acme_20250512", "Zeta_20250512"]);
    }

    #[test]
    fn discovers_by_other_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Acme_20250512_output.mp3");
        let paths = ArtifactPaths::new(tmp.path(), SuffixConfig::default());
        let items = discover_items(&paths, ArtifactKind::Audio).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].entity_name, "Acme");
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(tmp.path().join("absent"), SuffixConfig::default());
        assert!(discover_items(&paths, ArtifactKind::RawDocument).unwrap().is_empty());
    }

    #[test]
    fn date_filter_excludes_other_and_undated_items() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();
        let items = vec![
            Item::new("Acme", Some(day), "a"),
            Item::new("Beta", NaiveDate::from_ymd_opt(2025, 5, 13), "b"),
            Item::new("Gamma", None, "c"),
        ];
        let kept = filter_by_date(items, day);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].entity_name, "Acme");
    }
}
