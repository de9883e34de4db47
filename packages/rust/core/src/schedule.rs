//! Persisted settings for unattended runs.
//!
//! The record `{enabled, time, item_limit}` is read and written whole through
//! a [`ScheduleStore`]. A missing or unreadable record is replaced by the
//! defaults. Registering the run with the host scheduler is left to the
//! operator; [`ScheduleConfig::cron_hint`] prints a suitable crontab line.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use filingcast_shared::{FilingcastError, Result};

const TIME_FORMAT: &str = "%H:%M";

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

/// Wall-clock time serialised as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn parse(s: &str) -> Result<Self> {
        NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
            .map(Self)
            .map_err(|_| FilingcastError::validation(format!("time must be HH:MM, got '{s}'")))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = FilingcastError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

/// Settings for automatic mode. Loaded once per run and never mutated by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub enabled: bool,
    #[serde(alias = "time_of_day")]
    pub time: TimeOfDay,
    #[serde(alias = "company_limit")]
    pub item_limit: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time: TimeOfDay(NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN)),
            item_limit: 10,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.item_limit == 0 {
            return Err(FilingcastError::validation("item_limit must be at least 1"));
        }
        Ok(())
    }

    /// Weekday crontab line that triggers one automatic run.
    pub fn cron_hint(&self, command: &str) -> String {
        format!(
            "{} {} * * 1-5 {command} --auto",
            self.time.minute(),
            self.time.hour()
        )
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Whole-record persistence for [`ScheduleConfig`].
pub trait ScheduleStore: Send + Sync {
    /// `Ok(None)` when no record exists yet.
    fn load(&self) -> Result<Option<ScheduleConfig>>;
    fn save(&self, config: &ScheduleConfig) -> Result<()>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonScheduleStore {
    path: PathBuf,
}

impl JsonScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonScheduleStore {
    fn load(&self) -> Result<Option<ScheduleConfig>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FilingcastError::io(&self.path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| FilingcastError::Schedule(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, config: &ScheduleConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| FilingcastError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| FilingcastError::Schedule(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| FilingcastError::io(&self.path, e))
    }
}

/// Load the record, creating or repairing it with defaults when needed.
///
/// Never fails: if even the repair cannot be written, the defaults are
/// returned for this run and the problem is logged.
pub fn load_or_init(store: &dyn ScheduleStore) -> ScheduleConfig {
    let problem = match store.load() {
        Ok(Some(config)) => match config.validate() {
            Ok(()) => return config,
            Err(e) => e.to_string(),
        },
        Ok(None) => {
            info!("no schedule record, writing defaults");
            String::new()
        }
        Err(e) => e.to_string(),
    };

    if !problem.is_empty() {
        warn!(error = %problem, "schedule record unusable, resetting to defaults");
    }

    let defaults = ScheduleConfig::default();
    if let Err(e) = store.save(&defaults) {
        warn!(error = %e, "could not persist default schedule");
    }
    defaults
}

// ---------------------------------------------------------------------------
// Settings operations
// ---------------------------------------------------------------------------

fn update(
    store: &dyn ScheduleStore,
    change: impl FnOnce(&mut ScheduleConfig),
) -> Result<ScheduleConfig> {
    let mut config = load_or_init(store);
    change(&mut config);
    config.validate()?;
    store.save(&config)?;
    Ok(config)
}

pub fn toggle_enabled(store: &dyn ScheduleStore) -> Result<ScheduleConfig> {
    update(store, |c| c.enabled = !c.enabled)
}

pub fn set_enabled(store: &dyn ScheduleStore, enabled: bool) -> Result<ScheduleConfig> {
    update(store, |c| c.enabled = enabled)
}

pub fn set_time(store: &dyn ScheduleStore, time: &str) -> Result<ScheduleConfig> {
    let time = TimeOfDay::parse(time)?;
    update(store, |c| c.time = time)
}

pub fn set_item_limit(store: &dyn ScheduleStore, limit: usize) -> Result<ScheduleConfig> {
    if limit == 0 {
        return Err(FilingcastError::validation("item_limit must be at least 1"));
    }
    update(store, |c| c.item_limit = limit)
}
