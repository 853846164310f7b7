//! Time and host identity helpers

use std::env;
use std::process::Command;

use chrono::{Local, NaiveDate, SecondsFormat, Utc};

/// Current local time as RFC3339 with offset, second precision
///
/// Fixed width for a given offset, so timestamps from the same machine
/// sort chronologically as plain strings.
pub fn now_rfc3339() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC calendar date (names the active segment)
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Current local calendar date as `YYYY-MM-DD`
pub fn local_today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Get current OS user
pub fn get_current_user() -> String {
    if let Some(user) = env::var("USER")
        .ok()
        .or_else(|| env::var("USERNAME").ok())
        .filter(|u| !u.is_empty())
    {
        return user;
    }

    command_output("whoami").unwrap_or_else(|| "unknown".to_string())
}

/// Get host name from the environment or the `hostname` command
pub fn get_hostname() -> String {
    if let Some(host) = env::var("HOSTNAME")
        .ok()
        .or_else(|| env::var("COMPUTERNAME").ok())
        .filter(|h| !h.is_empty())
    {
        return host;
    }

    command_output("hostname").unwrap_or_else(|| "unknown".to_string())
}

/// Get current working directory as a string
pub fn get_cwd() -> String {
    env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn command_output(program: &str) -> Option<String> {
    let output = Command::new(program).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
