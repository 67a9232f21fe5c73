//! Application layer
//!
//! Use cases that orchestrate domain traits: planning and writing a
//! backup, and sequencing a restore back onto a device.

pub mod backup_planner;
pub mod restore_sequencer;

pub use backup_planner::BackupPlanner;
pub use restore_sequencer::RestoreSequencer;
