//! End-to-end backup/restore scenarios against plain files standing in
//! for block devices, with external tools driven through a fake
//! `ToolDriver` so no real `fdisk`/`ntfsinfo`/`ntfsclone` binaries are
//! needed to run these.

use diskvault::application::{BackupPlanner, RestoreSequencer};
use diskvault::domain::entities::{is_valid_description, Device, RecordKind};
use diskvault::domain::error::{DiskVaultError, Result};
use diskvault::domain::repositories::{ProcessOutput, StdioMode, ToolDriver};
use diskvault::infrastructure::container::read_backup_strict;
use std::io::{Read, Write};
use std::process::Child;
use std::time::Duration;

/// Answers `fdisk -l` with a fixed table and `dmidecode`/`ntfsinfo` with
/// canned output; never actually spawns a process.
struct FakeDriver {
    fdisk_output: String,
    ntfs_partitions: Vec<String>,
}

impl ToolDriver for FakeDriver {
    fn run_collecting(&self, argv: &[&str]) -> Result<ProcessOutput> {
        match argv.first() {
            Some(&"fdisk") => Ok(ProcessOutput {
                stdout: self.fdisk_output.clone().into_bytes(),
                stderr: Vec::new(),
            }),
            Some(&"dmidecode") => Ok(ProcessOutput {
                stdout: b"UUID: TESTHOST\n".to_vec(),
                stderr: Vec::new(),
            }),
            Some(&"ntfsinfo") => {
                let dev = argv[2];
                let is_ntfs = self.ntfs_partitions.iter().any(|p| p == dev);
                let stdout = if is_ntfs {
                    b"Free Clusters: 1000\n".to_vec()
                } else {
                    b"not ntfs\n".to_vec()
                };
                Ok(ProcessOutput { stdout, stderr: Vec::new() })
            }
            _ => Ok(ProcessOutput::default()),
        }
    }

    /// Emulates `ntfsclone` with real `cat`/`sh` processes: a save
    /// invocation (`-s -o -`) streams the source partition file to
    /// stdout, a restore invocation (`- -r --overwrite <dev>`) streams
    /// stdin into the target device file. Good enough to exercise the
    /// pump-thread plumbing without a real ntfsclone binary.
    fn spawn_stream(&self, argv: &[&str], _stdin: StdioMode, _stdout: StdioMode) -> Result<Child> {
        let to_tool_failed = |e: std::io::Error| DiskVaultError::ToolFailed {
            tool: "ntfsclone".to_string(),
            reason: e.to_string(),
        };

        if argv.get(1) == Some(&"-") {
            let target = argv.last().unwrap();
            std::process::Command::new("sh")
                .arg("-c")
                .arg(format!("cat > {target}"))
                .stdin(std::process::Stdio::piped())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::piped())
                .spawn()
                .map_err(to_tool_failed)
        } else {
            let source = argv[1];
            std::process::Command::new("cat")
                .arg(source)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped())
                .spawn()
                .map_err(to_tool_failed)
        }
    }
}

fn no_partitions() -> FakeDriver {
    FakeDriver {
        fdisk_output: String::new(),
        ntfs_partitions: Vec::new(),
    }
}

#[test]
fn scenario_empty_device_round_trips_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let device_path = dir.path().join("device.img");
    std::fs::write(&device_path, vec![0u8; 4096]).unwrap();

    let driver = no_partitions();
    let planner = BackupPlanner::new(&driver);
    let device = Device::new(&device_path, 4096, 512);

    let backup_path = planner
        .plan_and_write(&device, dir.path(), "Daily", 1_700_000_000)
        .unwrap();

    let parsed = read_backup_strict(&backup_path).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].kind, RecordKind::RawGap);
    assert_eq!(parsed.records[0].target_offset, 0);

    let restored_path = dir.path().join("restored.img");
    std::fs::write(&restored_path, vec![0xFFu8; 4096]).unwrap();

    let sequencer = RestoreSequencer::new(&driver, Duration::from_millis(1));
    sequencer.restore(&backup_path, &restored_path).unwrap();

    let restored = std::fs::read(&restored_path).unwrap();
    assert_eq!(restored, vec![0u8; 4096]);
}

#[test]
fn scenario_one_opaque_partition() {
    let dir = tempfile::tempdir().unwrap();
    let device_path = dir.path().join("device.img");
    let partition_path = dir.path().join("device.img1");

    let leading: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
    let partition_content: Vec<u8> = (0..(1024 * 1024 - 1024)).map(|i| (i % 199) as u8).collect();

    let mut full = leading.clone();
    full.extend_from_slice(&partition_content);
    std::fs::write(&device_path, &full).unwrap();
    std::fs::write(&partition_path, &partition_content).unwrap();

    let fdisk_output = format!(
        "Units = sectors of 1 * 512 = 512 bytes\n{} 2 2047 2046 511K 83 Linux\n",
        partition_path.display()
    );
    let driver = FakeDriver {
        fdisk_output,
        ntfs_partitions: Vec::new(),
    };

    let planner = BackupPlanner::new(&driver);
    let device = Device::new(&device_path, full.len() as u64, 512);
    let backup_path = planner
        .plan_and_write(&device, dir.path(), "Daily", 1_700_000_000)
        .unwrap();

    let parsed = read_backup_strict(&backup_path).unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[0].kind, RecordKind::RawGap);
    assert_eq!(parsed.records[0].target_offset, 0);
    assert_eq!(parsed.records[1].kind, RecordKind::OpaquePart);

    // Restore onto fresh target files and check exact byte-for-byte parity.
    let restored_device = dir.path().join("restored.img");
    let restored_partition = dir.path().join("restored.img1");
    std::fs::write(&restored_device, vec![0u8; full.len()]).unwrap();
    std::fs::write(&restored_partition, vec![0u8; partition_content.len()]).unwrap();

    let sequencer = RestoreSequencer::new(&driver, Duration::from_millis(1));
    sequencer.restore(&backup_path, &restored_device).unwrap();

    let restored_device_bytes = std::fs::read(&restored_device).unwrap();
    assert_eq!(&restored_device_bytes[..1024], &leading[..]);

    let restored_partition_bytes = std::fs::read(&restored_partition).unwrap();
    assert_eq!(restored_partition_bytes, partition_content);
}

#[test]
fn scenario_restores_specialized_ntfs_partition() {
    let dir = tempfile::tempdir().unwrap();
    let device_path = dir.path().join("device.img");
    let partition_path = dir.path().join("device.img1");

    let leading: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
    let partition_content: Vec<u8> = (0..(1024 * 1024 - 1024)).map(|i| (i % 197) as u8).collect();

    let mut full = leading.clone();
    full.extend_from_slice(&partition_content);
    std::fs::write(&device_path, &full).unwrap();
    std::fs::write(&partition_path, &partition_content).unwrap();

    let fdisk_output = format!(
        "Units = sectors of 1 * 512 = 512 bytes\n{} 2 2047 2046 511K 7 HPFS/NTFS/exFAT\n",
        partition_path.display()
    );
    let driver = FakeDriver {
        fdisk_output,
        ntfs_partitions: vec![partition_path.to_string_lossy().to_string()],
    };

    let planner = BackupPlanner::new(&driver);
    let device = Device::new(&device_path, full.len() as u64, 512);
    let backup_path = planner
        .plan_and_write(&device, dir.path(), "Daily", 1_700_000_004)
        .unwrap();

    let parsed = read_backup_strict(&backup_path).unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[1].kind, RecordKind::Specialized);

    // Restore drives ntfsclone's stdin pump: the FakeDriver's restore-side
    // spawn_stream pipes decompressed bytes through `sh -c "cat > <target>"`.
    let restored_device = dir.path().join("restored.img");
    let restored_partition = dir.path().join("restored.img1");
    std::fs::write(&restored_device, vec![0u8; full.len()]).unwrap();
    std::fs::write(&restored_partition, vec![0u8; partition_content.len()]).unwrap();

    let sequencer = RestoreSequencer::new(&driver, Duration::from_millis(1));
    sequencer.restore(&backup_path, &restored_device).unwrap();

    let restored_device_bytes = std::fs::read(&restored_device).unwrap();
    assert_eq!(&restored_device_bytes[..1024], &leading[..]);

    let restored_partition_bytes = std::fs::read(&restored_partition).unwrap();
    assert_eq!(restored_partition_bytes, partition_content);
}

#[test]
fn scenario_two_partitions_with_interior_gap() {
    let dir = tempfile::tempdir().unwrap();
    let device_size = 20_u64 * 1024;
    let device_path = dir.path().join("device.img");
    let p1_path = dir.path().join("device.img1");
    let p2_path = dir.path().join("device.img2");

    let p1 = vec![0xAAu8; 4096]; // [1024, 5120)
    let p2 = vec![0xBBu8; 8192]; // [8192, 16384)

    let mut full = vec![0u8; device_size as usize];
    full[1024..1024 + p1.len()].copy_from_slice(&p1);
    full[8192..8192 + p2.len()].copy_from_slice(&p2);
    std::fs::write(&device_path, &full).unwrap();
    std::fs::write(&p1_path, &p1).unwrap();
    std::fs::write(&p2_path, &p2).unwrap();

    // start units * 512: p1 -> 2..10 (2*512=1024, 9*512+511=5119 -> end should be 5119, length 4096)
    // p2 -> 16..31 (16*512=8192, 31*512+511=16383)
    let fdisk_output = format!(
        "Units = sectors of 1 * 512 = 512 bytes\n{} 2 9 8 2K 83 Linux\n{} 16 31 16 4K 7 HPFS/NTFS/exFAT\n",
        p1_path.display(),
        p2_path.display(),
    );
    let driver = FakeDriver {
        fdisk_output,
        ntfs_partitions: vec![p1_path.to_string_lossy().to_string()],
    };

    let planner = BackupPlanner::new(&driver);
    let device = Device::new(&device_path, device_size, 512);
    let backup_path = planner
        .plan_and_write(&device, dir.path(), "Weekly", 1_700_000_001)
        .unwrap();

    let parsed = read_backup_strict(&backup_path).unwrap();
    // RAW_GAP(0,1024), SPECIALIZED(p1), RAW_GAP(5120,3072), OPAQUE_PART(p2), RAW_GAP(16384, tail)
    assert_eq!(parsed.records.len(), 5);
    let kinds: Vec<_> = parsed.records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordKind::RawGap,
            RecordKind::Specialized,
            RecordKind::RawGap,
            RecordKind::OpaquePart,
            RecordKind::RawGap,
        ]
    );

    // target_offset is strictly increasing across RAW_GAP records.
    let raw_gap_offsets: Vec<u64> = parsed
        .records
        .iter()
        .filter(|r| r.kind == RecordKind::RawGap)
        .map(|r| r.target_offset)
        .collect();
    assert_eq!(raw_gap_offsets, vec![0, 5120, 16384]);
}

#[test]
fn scenario_unsorted_partition_table_still_selects_lowest_start_first() {
    let dir = tempfile::tempdir().unwrap();
    let device_path = dir.path().join("device.img");
    let a_path = dir.path().join("device.img_a");
    let b_path = dir.path().join("device.img_b");

    std::fs::write(&device_path, vec![0u8; 8192]).unwrap();
    std::fs::write(&a_path, vec![1u8; 1024]).unwrap();
    std::fs::write(&b_path, vec![2u8; 1024]).unwrap();

    // B (start=2048) listed before A (start=0) in the table text.
    let fdisk_output = format!(
        "Units = sectors of 1 * 512 = 512 bytes\n{} 4 5 2 1K 83 Linux\n{} 0 1 2 1K 83 Linux\n",
        b_path.display(),
        a_path.display(),
    );
    let driver = FakeDriver {
        fdisk_output,
        ntfs_partitions: Vec::new(),
    };

    let planner = BackupPlanner::new(&driver);
    let device = Device::new(&device_path, 8192, 512);
    let backup_path = planner
        .plan_and_write(&device, dir.path(), "Order", 1_700_000_002)
        .unwrap();

    let parsed = read_backup_strict(&backup_path).unwrap();
    // First OPAQUE_PART written must be A's content (1s), not B's (2s).
    let first_opaque = parsed
        .records
        .iter()
        .find(|r| r.kind == RecordKind::OpaquePart)
        .unwrap();

    let mut f = std::fs::File::open(&first_opaque.source).unwrap();
    let mut compressed = vec![0u8; first_opaque.payload_size as usize];
    use std::io::{Seek, SeekFrom};
    f.seek(SeekFrom::Start(first_opaque.file_offset)).unwrap();
    f.read_exact(&mut compressed).unwrap();

    let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).unwrap();
    assert_eq!(decompressed, vec![1u8; 1024]);
}

#[test]
fn scenario_malformed_container_is_rejected_with_no_writes() {
    let dir = tempfile::tempdir().unwrap();
    let bad_backup = dir.path().join("backup_TESTHOST_Bad_1700000003");

    // A single record header whose payload_size claims far more bytes
    // than actually follow.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1_700_000_003u64.to_le_bytes());
    bytes.push(0); // RAW_GAP tag
    bytes.extend_from_slice(&1_000_000u64.to_le_bytes()); // payload_size
    bytes.extend_from_slice(&0u64.to_le_bytes()); // target_offset
    std::fs::write(&bad_backup, &bytes).unwrap();

    let device_path = dir.path().join("device.img");
    let original = vec![0x11u8; 4096];
    std::fs::write(&device_path, &original).unwrap();

    let driver = no_partitions();
    let sequencer = RestoreSequencer::new(&driver, Duration::from_millis(1));
    let err = sequencer.restore(&bad_backup, &device_path).unwrap_err();
    assert!(matches!(err, DiskVaultError::BadContainer(_)));

    let after = std::fs::read(&device_path).unwrap();
    assert_eq!(after, original, "device must be untouched when the container fails validation");
}

#[test]
fn scenario_description_rejection() {
    assert!(!is_valid_description("My/Backup"));
    assert!(is_valid_description("Daily - 2024"));
}
