//! Query filter descriptor

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sort order for query results; every key sorts descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first, by timestamp string
    #[default]
    Time,
    /// Longest running first
    Duration,
    /// Highest exit code first
    Exit,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Time => write!(f, "time"),
            SortKey::Duration => write!(f, "duration"),
            SortKey::Exit => write!(f, "exit"),
        }
    }
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    /// Unknown keys fall back to `Time`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "duration" => SortKey::Duration,
            "exit" => SortKey::Exit,
            _ => SortKey::Time,
        })
    }
}

/// Query filter; every set criterion must match
///
/// Empty strings are treated the same as unset criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Exact user name
    pub user: Option<String>,
    /// Case-sensitive substring of the command
    pub command: Option<String>,
    /// Case-insensitive substring of command, stdout or stderr
    pub grep: Option<String>,
    /// Only entries with a non-zero exit code
    pub failed_only: bool,
    /// Lower date bound, `YYYY-MM-DD`
    pub since: Option<String>,
    /// Upper date bound, `YYYY-MM-DD`
    pub until: Option<String>,
    /// Only entries timestamped on the current local date
    pub today: bool,
    /// Maximum number of results, 0 for unlimited
    pub limit: usize,
    pub sort_by: SortKey,
}

impl Filter {
    /// Create a filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn grep(mut self, pattern: impl Into<String>) -> Self {
        self.grep = Some(pattern.into());
        self
    }

    pub fn failed_only(mut self) -> Self {
        self.failed_only = true;
        self
    }

    pub fn since(mut self, date: impl Into<String>) -> Self {
        self.since = Some(date.into());
        self
    }

    pub fn until(mut self, date: impl Into<String>) -> Self {
        self.until = Some(date.into());
        self
    }

    pub fn today(mut self) -> Self {
        self.today = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort_by = key;
        self
    }
}
