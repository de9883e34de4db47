//! Shared types, error model, and configuration for Filingcast.
//!
//! This crate is the foundation depended on by all other Filingcast crates.
//! It provides:
//! - [`FilingcastError`], the unified error type
//! - Domain types ([`Item`], [`ItemKey`], [`Stage`], [`StockMetrics`], [`RunId`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchConfig, CommandSpec, ExtractionConfig, PathsConfig, PublishConfig,
    QuoteConfig, StagesConfig, SuffixConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from,
};
pub use error::{FilingcastError, Result};
pub use types::{DATE_TOKEN_FORMAT, Item, ItemKey, RunId, Stage, StockMetrics, Visibility};
