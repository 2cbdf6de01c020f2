//! Running user-configured commands (LM backends, token helpers).
//!
//! Commands are given as a single shell-style string, split with
//! `shell-words`, and executed directly without a shell.
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Split a configured command line into argv.
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let args = shell_words::split(command).with_context(|| format!("parse command: {command}"))?;
    if args.is_empty() {
        return Err(anyhow!("command is empty"));
    }
    Ok(args)
}

/// Locate the program a command line would run.
pub fn resolve_program(command: &str) -> Result<PathBuf> {
    let args = split_command(command)?;
    which::which(&args[0]).with_context(|| format!("program not found on PATH: {}", args[0]))
}

/// Run `command`, feed `input` on stdin, and return stdout as UTF-8.
///
/// A non-zero exit is an error carrying the trimmed stderr.
pub fn run_command(command: &str, input: Option<&str>) -> Result<String> {
    let args = split_command(command)?;

    let start = Instant::now();
    let mut child = Command::new(&args[0])
        .args(&args[1..])
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn command: {}", args[0]))?;

    if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("write stdin of {}", args[0]))?;
    }

    let output = child
        .wait_with_output()
        .with_context(|| format!("wait for {}", args[0]))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::debug!(
        program = %args[0],
        elapsed_ms,
        input_bytes = input.map_or(0, str::len),
        output_bytes = output.stdout.len(),
        "command complete"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} failed with status {}: {}",
            args[0],
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8(output.stdout).with_context(|| format!("decode stdout of {}", args[0]))
}
