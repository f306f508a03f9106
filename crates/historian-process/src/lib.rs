//! Subprocess execution for the external indexer: spawning, bounded waiting,
//! and output capture.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Result of executing a command.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Combined stdout output.
    pub output: String,
    /// Captured stderr output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr_output: String,
    /// Last non-empty line or truncated output (max 200 chars).
    pub summary: String,
    /// Exit code (1 if signal-killed).
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Short description of a failed run, preferring stderr.
    pub fn failure_reason(&self) -> String {
        let stderr_summary = extract_summary(&self.stderr_output);
        if stderr_summary.is_empty() {
            format!("exit code {}: {}", self.exit_code, self.summary)
        } else {
            format!("exit code {}: {}", self.exit_code, stderr_summary)
        }
    }
}

/// Spawn a process without waiting for it to complete.
///
/// - Captures stdout and stderr (piped)
/// - Closes stdin so the child never blocks on input
/// - Isolates the child in its own process group (via setsid)
/// - Enables kill_on_drop so a dropped future (e.g. on timeout) reaps the child
pub async fn spawn_tool(mut cmd: Command) -> Result<tokio::process::Child> {
    cmd.stdin(std::process::Stdio::null());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.kill_on_drop(true);

    // SAFETY: setsid() is async-signal-safe and we call it before exec,
    // so no Rust runtime state exists in the child yet.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    cmd.spawn().context("Failed to spawn command")
}

/// Wait for a spawned child process and capture its output.
///
/// Drains stdout and stderr to EOF concurrently, then waits for exit. The
/// child's stdout must be piped.
pub async fn wait_and_capture(mut child: tokio::process::Child) -> Result<ExecutionResult> {
    let stdout = child.stdout.take().context("Failed to capture stdout")?;
    let stderr = child.stderr.take();

    let read_stdout = async move {
        let mut buf = Vec::new();
        let mut reader = BufReader::new(stdout);
        if let Err(e) = reader.read_to_end(&mut buf).await {
            warn!("Failed to read child stdout: {e}");
        }
        buf
    };
    let read_stderr = async move {
        let mut buf = Vec::new();
        if let Some(stderr) = stderr {
            let mut reader = BufReader::new(stderr);
            if let Err(e) = reader.read_to_end(&mut buf).await {
                warn!("Failed to read child stderr: {e}");
            }
        }
        buf
    };
    let (stdout_bytes, stderr_bytes) = tokio::join!(read_stdout, read_stderr);

    let output = String::from_utf8_lossy(&stdout_bytes).into_owned();
    let stderr_output = String::from_utf8_lossy(&stderr_bytes).into_owned();
    for line in stderr_output.lines() {
        debug!(line, "child stderr");
    }

    let status = child.wait().await.context("Failed to wait for command")?;

    let exit_code = status.code().unwrap_or_else(|| {
        warn!("Process terminated by signal, using exit code 1");
        1
    });

    let summary = extract_summary(&output);

    Ok(ExecutionResult {
        output,
        stderr_output,
        summary,
        exit_code,
    })
}

/// Execute a command and capture output.
pub async fn run_and_capture(cmd: Command) -> Result<ExecutionResult> {
    let child = spawn_tool(cmd).await?;
    wait_and_capture(child).await
}

/// Execute a command with a bounded wait.
///
/// Expiry is reported as an error; the child is killed when its handle drops.
pub async fn run_with_timeout(cmd: Command, timeout: Duration) -> Result<ExecutionResult> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    match tokio::time::timeout(timeout, run_and_capture(cmd)).await {
        Ok(result) => result,
        Err(_) => anyhow::bail!(
            "'{}' timed out after {}s",
            program,
            timeout.as_secs_f64()
        ),
    }
}

/// Check if a tool is installed by locating it on PATH.
pub fn check_tool_installed(executable: &str) -> Result<PathBuf> {
    which::which(executable)
        .with_context(|| format!("Tool '{}' is not installed or not in PATH", executable))
}

/// Extract summary from output (last non-empty line, truncated to 200 chars).
fn extract_summary(output: &str) -> String {
    let last_line = output
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if last_line.chars().nth(200).is_none() {
        last_line.to_string()
    } else {
        let truncated: String = last_line.chars().take(197).collect();
        format!("{}...", truncated)
    }
}
