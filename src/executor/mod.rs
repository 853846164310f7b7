//! Command execution wrapper
//!
//! Runs a command through the platform shell, captures its output and exit
//! status, and submits the result to the store.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::store::{LogStore, StoreResult};
use crate::types::CommandRecord;
use crate::utils::{get_current_user, get_cwd, get_hostname};

/// Exit code recorded when the command produced none (spawn failure, signal)
pub const FALLBACK_EXIT_CODE: i32 = 1;

/// How captured output is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Capture only
    #[default]
    Captured,
    /// Capture and echo to this process's stdout/stderr as it arrives
    Interactive,
}

/// Result of running a command
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub exit_code: i32,
    /// ID the store assigned to the record
    pub id: i64,
}

/// Run `command` in the shell, record it in `store`, and return its exit code
pub fn execute(store: &LogStore, command: &str, mode: OutputMode) -> StoreResult<ExecOutcome> {
    let record = run(command, mode);
    let exit_code = record.exit_code;
    let id = store.submit(record)?;

    Ok(ExecOutcome { exit_code, id })
}

/// Run `command` and describe it as a record, without submitting it
pub fn run(command: &str, mode: OutputMode) -> CommandRecord {
    let start = Instant::now();

    let (exit_code, stdout, stderr) = match spawn_and_capture(command, mode) {
        Ok(result) => result,
        Err(e) => {
            warn!(command, error = %e, "failed to run command");
            (FALLBACK_EXIT_CODE, String::new(), e.to_string())
        }
    };

    let duration_ms = start.elapsed().as_millis() as i64;
    debug!(exit_code, duration_ms, "command finished");

    CommandRecord::new(command)
        .with_user(get_current_user())
        .with_host(get_hostname())
        .with_cwd(get_cwd())
        .with_exit_code(exit_code)
        .with_output(stdout, stderr)
        .with_duration_ms(duration_ms)
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("powershell");
        cmd.args(["-Command", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

fn spawn_and_capture(command: &str, mode: OutputMode) -> io::Result<(i32, String, String)> {
    let mut child = shell_command(command)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let echo = mode == OutputMode::Interactive;
    let stdout = child.stdout.take().map(|pipe| pump(pipe, echo.then(io::stdout)));
    let stderr = child.stderr.take().map(|pipe| pump(pipe, echo.then(io::stderr)));

    let status = child.wait()?;
    let stdout = join_pump(stdout);
    let stderr = join_pump(stderr);

    Ok((status.code().unwrap_or(FALLBACK_EXIT_CODE), stdout, stderr))
}

/// Drain a pipe on its own thread, optionally echoing each chunk
fn pump<R, W>(mut pipe: R, mut echo: Option<W>) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        let mut captured = Vec::new();
        let mut buf = [0u8; 8 * 1024];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    captured.extend_from_slice(&buf[..n]);
                    if let Some(out) = echo.as_mut() {
                        let _ = out.write_all(&buf[..n]);
                        let _ = out.flush();
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        captured
    })
}

fn join_pump(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
