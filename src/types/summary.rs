//! Summary types for command history statistics

use std::collections::HashMap;

use chrono::{DateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::LogEntry;

/// Number of rows kept in each ranked table
pub const TOP_N: usize = 10;

/// Usage count of a base command (first word of the invocation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStat {
    pub command: String,
    pub count: usize,
}

/// Number of commands started in a given hour of the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourStat {
    pub hour: u32,
    pub count: usize,
}

/// Number of commands run from a working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirStat {
    pub directory: String,
    pub count: usize,
}

/// Aggregate statistics over a set of entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    pub total_commands: usize,
    pub failed_commands: usize,
    /// Percentage of successful commands, 0 when there are none
    pub success_rate: f64,
    pub most_used_commands: Vec<CommandStat>,
    pub activity_by_hour: Vec<HourStat>,
    pub top_directories: Vec<DirStat>,
    pub longest_commands: Vec<LogEntry>,
}

impl Summary {
    /// Compute statistics for the given entries
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let total = entries.len();
        let failed = entries.iter().filter(|e| e.failed()).count();

        Self {
            from_date: None,
            to_date: None,
            total_commands: total,
            failed_commands: failed,
            success_rate: (total - failed) as f64 / total as f64 * 100.0,
            most_used_commands: most_used_commands(entries),
            activity_by_hour: activity_by_hour(entries),
            top_directories: top_directories(entries),
            longest_commands: longest_commands(entries),
        }
    }

    /// Attach the date range the summary was computed over
    pub fn with_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }
}

/// Count descending, then key ascending
fn ranked(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut rows: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(TOP_N);
    rows
}

fn most_used_commands(entries: &[LogEntry]) -> Vec<CommandStat> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        if let Some(base) = entry.command.split_whitespace().next() {
            *counts.entry(base).or_default() += 1;
        }
    }

    ranked(counts)
        .into_iter()
        .map(|(command, count)| CommandStat { command, count })
        .collect()
}

fn activity_by_hour(entries: &[LogEntry]) -> Vec<HourStat> {
    let mut buckets = [0usize; 24];
    for entry in entries {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&entry.timestamp) {
            buckets[ts.hour() as usize] += 1;
        }
    }

    buckets
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourStat {
            hour: hour as u32,
            count,
        })
        .collect()
}

fn top_directories(entries: &[LogEntry]) -> Vec<DirStat> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.cwd.as_str()).or_default() += 1;
    }

    ranked(counts)
        .into_iter()
        .map(|(directory, count)| DirStat { directory, count })
        .collect()
}

fn longest_commands(entries: &[LogEntry]) -> Vec<LogEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
    sorted.truncate(TOP_N);
    sorted
}
