//! Downloaded filing bundles.
//!
//! Acquirers may leave `*.zip` bundles in the download directory rather than
//! raw documents. The first member of each bundle whose name ends with the
//! raw-document suffix is copied into the output directory as
//! `{item_key}_{raw_suffix}`, the item key being taken from the bundle's name:
//! `{entity}_{YYYYMMDD}_{anything}.zip` or `{entity}_{anything}.zip`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use filingcast_shared::{FilingcastError, ItemKey, Result};

use crate::naming::{ArtifactKind, ArtifactPaths, parse_date_token};

/// Extension of downloaded bundles.
const BUNDLE_EXTENSION: &str = "zip";

/// Extension used while a member is being copied out.
const PARTIAL_EXTENSION: &str = "part";

enum Unpacked {
    Written(PathBuf),
    AlreadyPresent(PathBuf),
    NoDocument,
}

/// Unpack every bundle in `download_dir` into `paths`' directory.
///
/// Returns the number of raw documents written by this call. Bundles whose
/// document is already present are left alone; corrupt bundles are logged
/// and skipped. A missing download directory counts as empty.
#[instrument(skip_all, fields(download_dir = %download_dir.display(), dest = %paths.dir().display()))]
pub fn unpack_bundles(download_dir: &Path, paths: &ArtifactPaths) -> Result<usize> {
    let entries = match std::fs::read_dir(download_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(FilingcastError::io(download_dir, e)),
    };

    let mut bundles: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_bundle(p))
        .collect();
    if bundles.is_empty() {
        debug!("no bundles to unpack");
        return Ok(0);
    }
    bundles.sort();

    std::fs::create_dir_all(paths.dir()).map_err(|e| FilingcastError::io(paths.dir(), e))?;

    let mut unpacked = 0;
    for bundle in &bundles {
        match unpack_one(bundle, paths) {
            Ok(Unpacked::Written(dest)) => {
                debug!(bundle = %bundle.display(), dest = %dest.display(), "document unpacked");
                unpacked += 1;
            }
            Ok(Unpacked::AlreadyPresent(dest)) => {
                debug!(dest = %dest.display(), "document already unpacked");
            }
            Ok(Unpacked::NoDocument) => {
                warn!(bundle = %bundle.display(), "bundle holds no source document");
            }
            Err(e) => {
                warn!(bundle = %bundle.display(), error = %e, "could not unpack bundle");
            }
        }
    }

    info!(bundles = bundles.len(), unpacked, "bundles unpacked");
    Ok(unpacked)
}

/// Item key for the document inside a bundle named `{stem}.zip`.
pub fn bundle_item_key(stem: &str) -> ItemKey {
    let mut tokens = stem.splitn(3, '_');
    match tokens.next() {
        Some(entity) if !entity.is_empty() => {
            let date = tokens.next().and_then(parse_date_token);
            ItemKey::new(entity, date)
        }
        _ => ItemKey::new(stem, None),
    }
}

pub(crate) fn is_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BUNDLE_EXTENSION))
}

fn unpack_one(bundle: &Path, paths: &ArtifactPaths) -> Result<Unpacked> {
    let stem = bundle
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            FilingcastError::validation(format!("bundle name is not UTF-8: {}", bundle.display()))
        })?;
    let dest = paths.path_for(&bundle_item_key(stem), ArtifactKind::RawDocument);
    if dest.exists() {
        return Ok(Unpacked::AlreadyPresent(dest));
    }

    let file = File::open(bundle).map_err(|e| FilingcastError::io(bundle, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| corrupt(bundle, e))?;

    let suffix = paths.suffix(ArtifactKind::RawDocument).to_lowercase();
    let Some(index) = (0..archive.len()).find(|&i| {
        archive
            .by_index(i)
            .is_ok_and(|m| !m.is_dir() && m.name().to_lowercase().ends_with(&suffix))
    }) else {
        return Ok(Unpacked::NoDocument);
    };
    let mut member = archive.by_index(index).map_err(|e| corrupt(bundle, e))?;

    // Copy to a side file first: a half-written document would count as done.
    let partial = dest.with_extension(PARTIAL_EXTENSION);
    let copied = File::create(&partial)
        .and_then(|mut out| io::copy(&mut member, &mut out))
        .and_then(|_| std::fs::rename(&partial, &dest));
    if let Err(e) = copied {
        let _ = std::fs::remove_file(&partial);
        return Err(FilingcastError::io(&dest, e));
    }
    Ok(Unpacked::Written(dest))
}

fn corrupt(bundle: &Path, e: ZipError) -> FilingcastError {
    FilingcastError::parse(format!("corrupt bundle {}: {e}", bundle.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use chrono::NaiveDate;
    use filingcast_shared::SuffixConfig;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_bundle(path: &Path, members: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in members {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn setup() -> (tempfile::TempDir, PathBuf, ArtifactPaths) {
        let tmp = tempfile::tempdir().unwrap();
        let downloads = tmp.path().join("downloads");
        std::fs::create_dir_all(&downloads).unwrap();
        let paths = ArtifactPaths::new(tmp.path().join("processed"), SuffixConfig::default());
        (tmp, downloads, paths)
    }

    #[test]
    fn source_documents_are_unpacked_and_counted() {
        let (_tmp, downloads, paths) = setup();
        write_bundle(
            &downloads.join("Acme_20250512_tdnet0001.zip"),
            &[
                ("Summary/tse-acedjpsm-72030.htm", "<p>summary</p>"),
                ("Attachment/0101010-qcfr01-tse-qcedjpfr-72030-qualitative.htm", "<p>acme</p>"),
            ],
        );
        write_bundle(
            &downloads.join("Beta_tdnet0002.zip"),
            &[("Attachment/QUALITATIVE.HTM", "<p>beta</p>")],
        );
        write_bundle(&downloads.join("Gamma_20250512_x.zip"), &[("summary.htm", "<p/>")]);
        std::fs::write(downloads.join("Broken_20250512.zip"), b"not a zip").unwrap();
        std::fs::write(downloads.join("notes.txt"), b"ignored").unwrap();

        let count = unpack_bundles(&downloads, &paths).unwrap();

        assert_eq!(count, 2);
        let acme = paths.dir().join("Acme_20250512_qualitative.htm");
        assert_eq!(std::fs::read_to_string(acme).unwrap(), "<p>acme</p>");
        let beta = paths.dir().join("Beta_qualitative.htm");
        assert_eq!(std::fs::read_to_string(beta).unwrap(), "<p>beta</p>");
        assert!(!paths.dir().join("Gamma_20250512_qualitative.htm").exists());
        assert!(!paths.dir().join("Broken_20250512_qualitative.htm").exists());
    }

    #[test]
    fn existing_documents_are_not_rewritten() {
        let (_tmp, downloads, paths) = setup();
        write_bundle(
            &downloads.join("Acme_20250512_tdnet.zip"),
            &[("qualitative.htm", "<p>from bundle</p>")],
        );
        assert_eq!(unpack_bundles(&downloads, &paths).unwrap(), 1);

        let dest = paths.dir().join("Acme_20250512_qualitative.htm");
        std::fs::write(&dest, "<p>edited</p>").unwrap();
        assert_eq!(unpack_bundles(&downloads, &paths).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "<p>edited</p>");
    }

    #[test]
    fn missing_download_dir_unpacks_nothing() {
        let (tmp, _downloads, paths) = setup();
        let count = unpack_bundles(&tmp.path().join("absent"), &paths).unwrap();
        assert_eq!(count, 0);
        assert!(!paths.dir().exists());
    }

    #[test]
    fn item_key_from_bundle_name() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 12);
        assert_eq!(bundle_item_key("Acme_20250512_tdnet0001"), ItemKey::new("Acme", date));
        assert_eq!(bundle_item_key("Acme_20250512"), ItemKey::new("Acme", date));
        assert_eq!(bundle_item_key("Acme_tdnet0001"), ItemKey::new("Acme", None));
        assert_eq!(bundle_item_key("Acme"), ItemKey::new("Acme", None));
        assert_eq!(bundle_item_key("_odd"), ItemKey::new("_odd", None));
    }
}
