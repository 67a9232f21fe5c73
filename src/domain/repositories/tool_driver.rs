//! External-tool driver trait.
//!
//! The core never calls `std::process::Command` directly outside of the
//! single infrastructure adapter that implements this trait; every other
//! component (partition prober, machine identity, backup store, the
//! backup planner and restore sequencer) takes a `&dyn ToolDriver` so
//! tests can substitute a fake that never spawns a real process.

use crate::domain::error::Result;
use std::process::{Child, Stdio};

/// Collected output of a short-lived helper invocation.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// How a spawned child's stdio should be wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    Piped,
    Null,
    Inherit,
}

impl StdioMode {
    pub fn into_stdio(self) -> Stdio {
        match self {
            StdioMode::Piped => Stdio::piped(),
            StdioMode::Null => Stdio::null(),
            StdioMode::Inherit => Stdio::inherit(),
        }
    }
}

pub trait ToolDriver: Send + Sync {
    /// Runs a short-lived helper to completion and collects its output.
    /// A non-zero exit (or a launch failure) is reported as `ToolFailed`.
    fn run_collecting(&self, argv: &[&str]) -> Result<ProcessOutput>;

    /// Spawns a long-running helper with the given stdio wiring, without
    /// waiting for it. Callers pump bytes through the returned child's
    /// pipes and are responsible for waiting on it.
    fn spawn_stream(&self, argv: &[&str], stdin: StdioMode, stdout: StdioMode) -> Result<Child>;
}
