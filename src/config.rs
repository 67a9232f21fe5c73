//! Application configuration.
//!
//! Loaded from an optional TOML file (`diskvault.toml` in the current
//! directory, or a path given on the command line); every field has a
//! default so the tool runs with no config file present at all.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the device path the interactive menu operates on.
    pub backup_device: Option<String>,
    /// Directory backups are written to and listed from when
    /// `discover_via_mount` is false.
    pub backup_store_path: PathBuf,
    /// Read/write chunk size for device and compressor I/O.
    pub chunk_size: usize,
    /// zlib compression level, 0 (none) through 9 (best).
    pub compression_level: u32,
    /// Binary names for the external tools, overridable for environments
    /// where they're not on `PATH` under their usual names.
    pub tools: ToolNames,
    /// When true, `BackupStore::discover` mounts each unmounted candidate
    /// partition looking for a `backup.drive` marker instead of trusting
    /// `backup_store_path` directly. Off by default.
    pub discover_via_mount: bool,
    /// Delay around the post-restore kernel partition rescan.
    pub rescan_settle_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolNames {
    pub fdisk: String,
    pub ntfsinfo: String,
    pub ntfsclone: String,
    pub dmidecode: String,
    pub mount: String,
    pub umount: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            fdisk: "fdisk".to_string(),
            ntfsinfo: "ntfsinfo".to_string(),
            ntfsclone: "ntfsclone".to_string(),
            dmidecode: "dmidecode".to_string(),
            mount: "mount".to_string(),
            umount: "umount".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backup_device: None,
            backup_store_path: PathBuf::from("/var/lib/diskvault/backups"),
            chunk_size: 16 * 1024 * 1024,
            compression_level: 6,
            tools: ToolNames::default(),
            discover_via_mount: false,
            rescan_settle_delay_secs: 3,
        }
    }
}

impl AppConfig {
    /// Loads config from `path`, falling back to defaults for any field
    /// the file doesn't set. A missing file is not an error - it's
    /// equivalent to an empty one.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let cfg = AppConfig::load("/nonexistent/diskvault.toml").unwrap();
        assert!(!cfg.discover_via_mount);
        assert_eq!(cfg.tools.fdisk, "fdisk");
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "discover_via_mount = true\ncompression_level = 9\n").unwrap();
        let cfg = AppConfig::load(tmp.path()).unwrap();
        assert!(cfg.discover_via_mount);
        assert_eq!(cfg.compression_level, 9);
        assert_eq!(cfg.chunk_size, 16 * 1024 * 1024);
    }
}
