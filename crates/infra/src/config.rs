//! Store configuration.
//!
//! Values come from defaults, then the process environment, then (in the CLI)
//! command-line flags.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use coldstore_core::{DomainError, DomainResult};
use coldstore_inventory::ChangeKind;

pub const DATABASE_URL_ENV: &str = "COLDSTORE_DATABASE_URL";
pub const HISTORY_ENV: &str = "COLDSTORE_HISTORY";
pub const REJECT_REVERSED_ENV: &str = "COLDSTORE_REJECT_REVERSED";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://inventory.db";
pub const IN_MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// Which mutations append to the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// No audit trail.
    Off,
    /// Only updates are logged.
    #[default]
    Updates,
    /// Create, update and delete are all logged.
    All,
}

impl HistoryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPolicy::Off => "off",
            HistoryPolicy::Updates => "updates",
            HistoryPolicy::All => "all",
        }
    }

    /// Whether a mutation of this kind should be logged.
    pub fn logs(&self, change: ChangeKind) -> bool {
        match self {
            HistoryPolicy::Off => false,
            HistoryPolicy::Updates => change == ChangeKind::Updated,
            HistoryPolicy::All => true,
        }
    }
}

impl core::fmt::Display for HistoryPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(HistoryPolicy::Off),
            "updates" => Ok(HistoryPolicy::Updates),
            "all" => Ok(HistoryPolicy::All),
            other => Err(DomainError::validation(format!(
                "history policy must be one of: off, updates, all (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// sqlx SQLite URL, e.g. `sqlite://inventory.db` or `sqlite::memory:`.
    pub database_url: String,
    pub history: HistoryPolicy,
    /// Refuse submissions whose end date precedes the start date instead of
    /// storing a negative bill.
    pub reject_reversed_intervals: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            history: HistoryPolicy::default(),
            reject_reversed_intervals: false,
        }
    }
}

impl StoreConfig {
    /// Configuration for a throwaway in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_url: IN_MEMORY_DATABASE_URL.to_string(),
            ..Self::default()
        }
    }

    /// Load from `COLDSTORE_*` environment variables, falling back to defaults.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.database_url = url;
        }
        if let Some(policy) = lookup(HISTORY_ENV) {
            config.history = policy.parse()?;
        }
        if let Some(flag) = lookup(REJECT_REVERSED_ENV) {
            config.reject_reversed_intervals = parse_flag(REJECT_REVERSED_ENV, &flag)?;
        }

        Ok(config)
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }

    pub fn with_reject_reversed_intervals(mut self, reject: bool) -> Self {
        self.reject_reversed_intervals = reject;
        self
    }
}

fn parse_flag(key: &str, value: &str) -> DomainResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DomainError::validation(format!(
            "{key} must be a boolean (got {other:?})"
        ))),
    }
}
