//! The only place in this crate that launches subprocesses.
//!
//! Every other component — the partition prober, machine identity, the
//! backup store, the planner and the sequencer — reaches external helpers
//! (`fdisk`, `ntfsinfo`, `ntfsclone`, `dmidecode`, `mount`/`umount`)
//! exclusively through the `ToolDriver` trait, so tests can substitute a
//! fake that never actually spawns anything.

use crate::domain::error::{DiskVaultError, Result};
use crate::domain::repositories::{ProcessOutput, StdioMode, ToolDriver};
use std::io::{Read, Write};
use std::process::{Child, Command};
use std::thread;

const CHUNK_SIZE: usize = 16 * 1024 * 1024;

pub struct ProcessToolDriver;

impl ProcessToolDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessToolDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDriver for ProcessToolDriver {
    fn run_collecting(&self, argv: &[&str]) -> Result<ProcessOutput> {
        let (program, args) = split_argv(argv)?;
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| tool_failed(program, e.to_string()))?;

        log_stderr(program, &output.stderr);

        if !output.status.success() {
            return Err(tool_failed(
                program,
                format!("exit status {:?}", output.status.code()),
            ));
        }

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn spawn_stream(&self, argv: &[&str], stdin: StdioMode, stdout: StdioMode) -> Result<Child> {
        let (program, args) = split_argv(argv)?;
        log::debug!("spawning {program} {args:?}");
        Command::new(program)
            .args(args)
            .stdin(stdin.into_stdio())
            .stdout(stdout.into_stdio())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| tool_failed(program, e.to_string()))
    }
}

fn split_argv<'a>(argv: &'a [&'a str]) -> Result<(&'a str, &'a [&'a str])> {
    argv.split_first()
        .ok_or_else(|| DiskVaultError::ToolFailed {
            tool: String::new(),
            reason: "empty argv".to_string(),
        })
}

fn tool_failed(tool: &str, reason: String) -> DiskVaultError {
    DiskVaultError::ToolFailed {
        tool: tool.to_string(),
        reason,
    }
}

fn log_stderr(tool: &str, stderr: &[u8]) {
    if stderr.is_empty() {
        return;
    }
    for line in String::from_utf8_lossy(stderr).lines() {
        log::warn!("[{tool}] {line}");
    }
}

/// Waits for a child to exit, surfacing a non-zero exit as `ToolFailed`.
/// Also drains and logs the child's stderr pipe, since it was opened
/// piped by `spawn_stream`.
pub fn reap(tool: &str, mut child: Child) -> Result<()> {
    let mut stderr = child.stderr.take();
    let status = child.wait().map_err(|e| tool_failed(tool, e.to_string()))?;

    if let Some(mut pipe) = stderr.take() {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        log_stderr(tool, &buf);
    }

    if !status.success() {
        return Err(tool_failed(tool, format!("exit status {:?}", status.code())));
    }
    Ok(())
}

/// Pumps bytes from `reader` into the child's stdin on a dedicated thread,
/// closing stdin (dropping the handle) once `reader` is exhausted so the
/// child observes EOF and can drain. Returns a join handle the caller
/// must join before declaring the record complete, per the no-deadlock
/// contract: the calling thread is expected to pump the child's stdout
/// concurrently.
pub fn spawn_stdin_pump<R>(mut stdin: std::process::ChildStdin, mut reader: R) -> thread::JoinHandle<Result<()>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || -> Result<()> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            stdin.write_all(&buf[..n])?;
        }
        // stdin is dropped here, closing the pipe so the child sees EOF.
        Ok(())
    })
}
