//! memlog - Binary Entry Point
//!
//! # Commands
//!
//! - `exec` - Run a command and record it
//! - `list` - Query recorded commands
//! - `show` - Display one entry by ID
//! - `rotate`, `compress`, `clean`, `maintain` - Segment lifecycle
//! - `size` - Total segment size
//! - `summary` - History statistics

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use memlog::executor::{self, OutputMode};
use memlog::logging::{init_logging, LogFormat};
use memlog::store::{LogStore, MaintenanceReport, StoreConfig};
use memlog::types::{Filter, LogEntry, SortKey};

/// Local command-execution audit log.
#[derive(Parser)]
#[command(name = "memlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store root (defaults to $MEMLOG_HOME or ~/.memlog)
    #[arg(global = true, short, long)]
    root: Option<PathBuf>,

    /// Enable verbose diagnostics
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Diagnostic output format (text, json)
    #[arg(global = true, long, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a shell command and record it
    Exec {
        /// Do not echo the command's output
        #[arg(short, long)]
        quiet: bool,

        /// Command line to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// List recorded commands
    List {
        /// Only this user
        #[arg(short, long)]
        user: Option<String>,

        /// Command contains this text (case-sensitive)
        #[arg(short, long)]
        command: Option<String>,

        /// Command or output contains this text (case-insensitive)
        #[arg(short, long)]
        grep: Option<String>,

        /// Only commands with a non-zero exit code
        #[arg(short, long)]
        failed: bool,

        /// From this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Up to this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Only today's commands
        #[arg(long)]
        today: bool,

        /// Maximum number of entries, 0 for all
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Sort key (time, duration, exit)
        #[arg(short, long, default_value = "time")]
        sort: SortKey,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one entry with its captured output
    Show {
        id: i64,

        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compress segments larger than the threshold
    Rotate {
        /// Threshold in megabytes (defaults to the configured value)
        #[arg(short, long)]
        max_size_mb: Option<u64>,
    },

    /// Compress segments untouched for more than a day
    Compress,

    /// Delete segments older than the retention window
    Clean {
        /// Retention in days (defaults to the configured value)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Rotate, compress and clean with the configured thresholds
    Maintain,

    /// Show the total size of all segments
    Size,

    /// Summarize command history
    Summary {
        /// From this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Up to this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    init_logging(level, cli.log_format);

    let config = match cli.root {
        Some(root) => {
            let env = StoreConfig::from_env();
            StoreConfig { root, ..env }
        }
        None => StoreConfig::from_env(),
    };
    let store = LogStore::open(config)?;

    match cli.command {
        Commands::Exec { quiet, command } => {
            let mode = if quiet {
                OutputMode::Captured
            } else {
                OutputMode::Interactive
            };
            let outcome = executor::execute(&store, &command.join(" "), mode)?;
            store.close();
            return Ok(ExitCode::from(outcome.exit_code.clamp(0, 255) as u8));
        }
        Commands::List {
            user,
            command,
            grep,
            failed,
            since,
            until,
            today,
            limit,
            sort,
            json,
        } => {
            let filter = Filter {
                user,
                command,
                grep,
                failed_only: failed,
                since,
                until,
                today,
                limit,
                sort_by: sort,
            };
            let entries = store.read_logs(&filter)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{}", format_line(entry));
                }
            }
        }
        Commands::Show { id, json } => {
            let entry = store.get_by_id(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                print_entry(&entry);
            }
        }
        Commands::Rotate { max_size_mb } => {
            let threshold = max_size_mb.unwrap_or(store.config().max_size_mb);
            print_report("compressed", &store.rotate_if_needed(threshold)?);
        }
        Commands::Compress => {
            print_report("compressed", &store.compress_old_logs()?);
        }
        Commands::Clean { days } => {
            let days = days.unwrap_or(store.config().retention_days);
            print_report("removed", &store.clean_old_logs(days)?);
        }
        Commands::Maintain => {
            let summary = store.run_maintenance()?;
            print_report("rotated", &summary.rotated);
            print_report("compressed", &summary.compressed);
            print_report("removed", &summary.cleaned);
        }
        Commands::Size => {
            let bytes = store.segments().total_size_bytes()?;
            println!("{} MB ({} bytes)", store.total_size_mb()?, bytes);
        }
        Commands::Summary { since, until } => {
            let summary = store.summarize(since.as_deref(), until.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    store.close();
    Ok(ExitCode::SUCCESS)
}

fn format_line(entry: &LogEntry) -> String {
    format!(
        "#{:<6} {}  exit={:<3} {:>7}ms  {}@{}  {}  {}",
        entry.id,
        entry.timestamp,
        entry.exit_code,
        entry.duration_ms,
        entry.user,
        entry.host,
        entry.cwd,
        entry.command
    )
}

fn print_entry(entry: &LogEntry) {
    println!("ID:        {}", entry.id);
    println!("Time:      {}", entry.timestamp);
    println!("User:      {}@{}", entry.user, entry.host);
    println!("Directory: {}", entry.cwd);
    println!("Command:   {}", entry.command);
    println!("Exit code: {}", entry.exit_code);
    println!("Duration:  {} ms", entry.duration_ms);
    if !entry.stdout.is_empty() {
        println!("--- stdout ---\n{}", entry.stdout.trim_end());
    }
    if !entry.stderr.is_empty() {
        println!("--- stderr ---\n{}", entry.stderr.trim_end());
    }
}

fn print_report(action: &str, report: &MaintenanceReport) {
    for path in &report.processed {
        println!("{}: {}", action, path.display());
    }
    for (path, error) in &report.failures {
        eprintln!("failed: {}: {}", path.display(), error);
    }
}
