//! CLI commands using clap.
//!
//! The bare, no-subcommand invocation drops into the interactive menu
//! (backup / restore / exit) that the original tool exposed as its only
//! surface. The subcommands below are additive scripting ergonomics.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// diskvault - whole-disk backup and restore tool
#[derive(Parser)]
#[command(name = "diskvault")]
#[command(version = "0.1.0")]
#[command(about = "Back up and restore whole disks, with NTFS-aware partition cloning", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true, default_value = "diskvault.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Back up a device non-interactively
    Backup {
        /// Path to the device to back up (e.g. /dev/sda)
        #[arg(short, long)]
        device: String,

        /// Short description, stored in the backup's filename
        #[arg(short = 'n', long)]
        description: String,

        /// Directory to write the backup into (overrides config)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Restore a backup onto a device non-interactively
    Restore {
        /// Path to the device to restore onto (e.g. /dev/sda)
        #[arg(short, long)]
        device: String,

        /// Backup filename (relative to the store directory) to restore
        #[arg(short, long)]
        backup: String,

        /// Directory the backup lives in (overrides config)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// List this machine's backups
    List {
        /// Directory to list backups from (overrides config)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}
