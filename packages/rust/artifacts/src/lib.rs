//! On-disk artifact layout for the pipeline.
//!
//! Every item's files live side by side in one output directory and are named
//! `{item_key}_{suffix}`. The existence of a file is the only signal used to
//! decide whether a stage still has work to do.
//!
//! - [`naming`]: item keys from source file names, artifact paths from keys
//! - [`discover`]: item enumeration and date filtering
//! - [`receipt`]: the publish stage's on-disk confirmation
//! - [`bundle`]: unpacking downloaded `*.zip` bundles into raw documents
//! - [`archive`]: moving every artifact aside (reset)

pub mod archive;
pub mod bundle;
pub mod discover;
pub mod naming;
pub mod receipt;

pub use archive::{ArchiveReport, archive_all};
pub use bundle::{bundle_item_key, unpack_bundles};
pub use discover::{discover_items, filter_by_date};
pub use naming::{
    ArtifactKind, ArtifactPaths, ItemName, StageArtifact, parse_date_token, parse_source_filename,
};
pub use receipt::{PublishReceipt, sha256_file};
