//! Log entry types for the command audit log
//!
//! A `LogEntry` is one line of a segment file. Entries are produced from a
//! `CommandRecord` handed over by the execution wrapper, after redaction and
//! ID/timestamp assignment.

use serde::{Deserialize, Serialize};

/// Marker stored in place of a command that contained a sensitive keyword
pub const REDACTED_COMMAND: &str = "[REDACTED - contains sensitive keywords]";

/// Marker stored in place of captured output of a redacted command
pub const REDACTED_OUTPUT: &str = "[REDACTED]";

/// Keywords that cause a command to be redacted (matched case-insensitively)
pub const SENSITIVE_KEYWORDS: [&str; 5] = ["password", "secret", "token", "api_key", "apikey"];

/// A single command execution as persisted in a segment
///
/// Missing fields deserialize to their zero values so that older or partial
/// records remain readable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Unique, monotonically increasing entry ID
    pub id: i64,

    /// RFC3339 timestamp with offset, assigned at submit time
    pub timestamp: String,

    pub user: String,
    pub host: String,
    pub cwd: String,

    /// Raw invocation text, or [`REDACTED_COMMAND`]
    pub command: String,

    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

impl LogEntry {
    /// Build an entry from a record with an assigned ID and timestamp
    pub fn from_record(record: CommandRecord, id: i64, timestamp: String) -> Self {
        Self {
            id,
            timestamp,
            user: record.user,
            host: record.host,
            cwd: record.cwd,
            command: record.command,
            exit_code: record.exit_code,
            stdout: record.stdout,
            stderr: record.stderr,
            duration_ms: record.duration_ms,
        }
    }

    /// Whether the command exited with a non-zero status
    pub fn failed(&self) -> bool {
        self.exit_code != 0
    }

    /// Calendar date part of the timestamp (`YYYY-MM-DD`), if present
    pub fn date_str(&self) -> Option<&str> {
        self.timestamp.get(..10)
    }

    /// Serialize entry to a JSON string (one JSONL line, without newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize entry from a JSON line
    pub fn from_json_line(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }
}

/// What the execution wrapper knows about a finished command
///
/// ID and timestamp are not part of the record; the store assigns them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandRecord {
    pub user: String,
    pub host: String,
    pub cwd: String,
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

impl CommandRecord {
    /// Create a record for a command with empty output
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Whether the command text contains any sensitive keyword
    pub fn is_sensitive(&self) -> bool {
        let lower = self.command.to_lowercase();
        SENSITIVE_KEYWORDS.iter().any(|k| lower.contains(k))
    }

    /// Replace command and captured output with redaction markers if the
    /// command is sensitive. Returns true when the record was redacted.
    pub fn redact(&mut self) -> bool {
        if !self.is_sensitive() {
            return false;
        }
        self.command = REDACTED_COMMAND.to_string();
        self.stdout = REDACTED_OUTPUT.to_string();
        self.stderr = REDACTED_OUTPUT.to_string();
        true
    }
}
