//! Reset: move every artifact out of the output directory.
//!
//! Files are grouped by kind under `{archive_root}/{kind_dir}/`. Downloaded
//! bundles (`*.zip`), whether left in the output directory or still in the
//! download directory, go to `{archive_root}/zip/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use filingcast_shared::{FilingcastError, Result};

use crate::bundle::is_bundle;
use crate::naming::{ArtifactKind, ArtifactPaths};

const BUNDLE_DIR: &str = "zip";

/// Outcome of [`archive_all`].
#[derive(Debug, Default)]
pub struct ArchiveReport {
    /// Files moved, per archive sub-directory.
    pub moved: BTreeMap<&'static str, usize>,
    /// Files that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl ArchiveReport {
    pub fn total_moved(&self) -> usize {
        self.moved.values().sum()
    }
}

/// Move all artifacts, and all bundles in `download_dir`, into the archive.
/// Per-file failures are recorded and the sweep continues.
#[instrument(skip(paths), fields(dir = %paths.dir().display(), archive = %archive_root.display()))]
pub fn archive_all(
    paths: &ArtifactPaths,
    download_dir: &Path,
    archive_root: &Path,
) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::default();

    sweep(paths.dir(), archive_root, &mut report, |name| {
        archive_dir_for(paths, name)
    })?;
    if download_dir != paths.dir() {
        sweep(download_dir, archive_root, &mut report, |name| {
            is_bundle(Path::new(name)).then_some(BUNDLE_DIR)
        })?;
    }

    info!(
        moved = report.total_moved(),
        failed = report.failures.len(),
        "reset complete"
    );
    Ok(report)
}

/// Move the files of `dir` that `target` assigns an archive sub-directory.
fn sweep(
    dir: &Path,
    archive_root: &Path,
    report: &mut ArchiveReport,
    target: impl Fn(&str) -> Option<&'static str>,
) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FilingcastError::io(dir, e)),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(target_dir) = target(name) else {
            continue;
        };

        let dest_dir = archive_root.join(target_dir);
        let dest = dest_dir.join(name);
        match move_file(&file, &dest_dir, &dest) {
            Ok(()) => *report.moved.entry(target_dir).or_default() += 1,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "could not archive file");
                report.failures.push((file.clone(), e.to_string()));
            }
        }
    }
    Ok(())
}

fn archive_dir_for(paths: &ArtifactPaths, file_name: &str) -> Option<&'static str> {
    let kind_dir = ArtifactKind::ALL.iter().find_map(|kind| {
        let marker = format!("_{}", paths.suffix(*kind));
        file_name.ends_with(&marker).then(|| kind.archive_dir_name())
    });

    kind_dir.or_else(|| is_bundle(Path::new(file_name)).then_some(BUNDLE_DIR))
}

fn move_file(src: &Path, dest_dir: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir).map_err(|e| FilingcastError::io(dest_dir, e))?;

    if std::fs::rename(src, dest).is_ok() {
        return Ok(());
    }

    // rename fails across filesystems; fall back to copy + remove.
    std::fs::copy(src, dest).map_err(|e| FilingcastError::io(dest, e))?;
    std::fs::remove_file(src).map_err(|e| FilingcastError::io(src, e))
}
