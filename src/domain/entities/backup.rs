//! The `Backup` entity: a container plus the metadata parsed from its
//! filename and header.

use super::record::ContainerRecordRef;
use std::path::PathBuf;

/// Filename grammar: `backup_<machine_id>_<description>_<epoch_seconds>`.
pub const FILENAME_PREFIX: &str = "backup_";

/// Description grammar per the container format: `[A-Za-z0-9 \-]{1,24}`.
pub fn is_valid_description(desc: &str) -> bool {
    if desc.is_empty() || desc.len() > 24 {
        return false;
    }
    desc.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

/// Parsed filename fields, before the container itself has been opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFilename {
    pub machine_id: String,
    pub description: String,
    pub epoch_seconds: u64,
}

impl BackupFilename {
    /// Parses `backup_<machine_id>_<description>_<epoch_seconds>`.
    ///
    /// The description itself may contain spaces but not underscores (the
    /// grammar excludes `_`), so splitting on `_` unambiguously separates
    /// the three fields once the leading `backup` token is stripped.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(FILENAME_PREFIX)?;
        let mut parts = rest.splitn(3, '_');
        let machine_id = parts.next()?.to_string();
        let remainder = parts.next()?;
        let trailing = parts.next()?;

        // remainder_trailing was split at the first two underscores from
        // the left, but the description might have had its own content
        // in `trailing` too if `rest` contained exactly 3 fields; since
        // splitn(3, '_') stops after the 3rd field, `trailing` already
        // holds "description_epoch" when there were extra underscores.
        // The grammar forbids '_' in description, so the last underscore
        // in `trailing` (if any) is the description/epoch boundary.
        let (description, epoch_str) = match trailing.rfind('_') {
            Some(idx) => (format!("{remainder}_{}", &trailing[..idx]), &trailing[idx + 1..]),
            None => (remainder.to_string(), trailing),
        };

        let epoch_seconds = epoch_str.parse().ok()?;

        Some(Self {
            machine_id,
            description,
            epoch_seconds,
        })
    }

    pub fn format(machine_id: &str, description: &str, epoch_seconds: u64) -> String {
        format!("{FILENAME_PREFIX}{machine_id}_{description}_{epoch_seconds}")
    }
}

/// A Container plus metadata parsed from its filename and the 8-byte
/// creation-time header.
///
/// A `Backup` is `valid` iff the filename parses, the 8-byte header is
/// present, and every record header fully parses with a recognized kind.
#[derive(Debug, Clone)]
pub struct Backup {
    pub path: PathBuf,
    pub filename: BackupFilename,
    pub header_time: u64,
    pub records: Vec<ContainerRecordRef>,
    pub valid: bool,
}

impl Backup {
    pub fn machine_id(&self) -> &str {
        &self.filename.machine_id
    }

    pub fn description(&self) -> &str {
        &self.filename.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Daily - 2024", true)]
    #[case("My/Backup", false)]
    #[case("", false)]
    #[case("Weekly_Full", false)] // underscore is the filename field separator, not allowed in the grammar
    fn validates_descriptions(#[case] desc: &str, #[case] expected: bool) {
        assert_eq!(is_valid_description(desc), expected);
    }

    #[test]
    fn accepts_description() {
        assert!(is_valid_description("Daily - 2024"));
        assert!(!is_valid_description(&"x".repeat(25)));
    }

    #[test]
    fn filename_round_trips() {
        let name = BackupFilename::format("DMIabc-123", "Daily - 2024", 1_700_000_000);
        let parsed = BackupFilename::parse(&name).unwrap();
        assert_eq!(parsed.machine_id, "DMIabc-123");
        assert_eq!(parsed.description, "Daily - 2024");
        assert_eq!(parsed.epoch_seconds, 1_700_000_000);
    }

    #[test]
    fn rejects_non_backup_prefix() {
        assert!(BackupFilename::parse("not_a_backup_file").is_none());
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(BackupFilename::parse("backup_onlymachine").is_none());
    }
}
