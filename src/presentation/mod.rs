//! Presentation layer
//!
//! The CLI surface (clap) and the interactive menu that runs when no
//! subcommand is given.

pub mod cli;
pub mod menu;
