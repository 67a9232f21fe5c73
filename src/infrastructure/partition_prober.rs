//! Partition table probing and NTFS detection, both driven through
//! `ToolDriver` so tests never need a real `fdisk`/`ntfsinfo` binary.

use crate::domain::entities::{Device, PartitionEntry};
use crate::domain::error::Result;
use crate::domain::repositories::ToolDriver;

const NTFS_MARKER: &str = "Free Clusters";

/// Lists the partition table of `device` via `fdisk -l`. A lister failure
/// (missing binary, unreadable table) degrades to an empty list rather
/// than propagating an error - the planner treats that as "no partition
/// table" and falls back to a single opaque range over the whole device.
pub fn list_partitions(driver: &dyn ToolDriver, device: &Device) -> Vec<PartitionEntry> {
    let path = device.path.to_string_lossy();
    match driver.run_collecting(&["fdisk", "-l", &path]) {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout);
            parse_fdisk_output(&text, driver)
        }
        Err(_) => Vec::new(),
    }
}

fn parse_fdisk_output(text: &str, driver: &dyn ToolDriver) -> Vec<PartitionEntry> {
    let mut unit_size: u64 = 512;
    let mut entries = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("Units") {
            if let Some(value) = parse_units_line(rest) {
                unit_size = value;
            }
            continue;
        }

        if !line.starts_with('/') {
            continue;
        }

        if let Some(entry) = parse_partition_line(line, unit_size, driver) {
            entries.push(entry);
        }
    }

    entries
}

/// `Units = sectors of 1 * 512 = 512 bytes` -> 512. Falls back to the
/// caller's current unit size if the line doesn't parse as expected.
fn parse_units_line(rest: &str) -> Option<u64> {
    let after_eq = rest.split('=').nth(1)?;
    after_eq.trim().split(' ').next()?.trim().parse().ok()
}

fn parse_partition_line(line: &str, unit_size: u64, driver: &dyn ToolDriver) -> Option<PartitionEntry> {
    let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return None;
    }

    let device_path = tokens[0].to_string();
    let i = if tokens.get(1) == Some(&"*") { 2 } else { 1 };

    let start_units: u64 = tokens.get(i)?.parse().ok()?;
    let end_units: u64 = tokens.get(i + 1)?.parse().ok()?;
    let count_sectors: u64 = tokens.get(i + 2)?.parse().ok()?;

    let start = start_units * unit_size;
    let end = end_units * unit_size + unit_size - 1;
    let count = count_sectors * 512;

    let is_specialized = is_specialized(driver, &device_path);

    Some(PartitionEntry {
        device_path,
        start,
        end,
        count,
        is_specialized,
    })
}

/// Treats the presence of the `"Free Clusters"` substring anywhere in
/// `ntfsinfo -m`'s output as confirmation of an NTFS filesystem. Any
/// failure to run the tool (missing binary, unreadable partition) is
/// treated as "not NTFS" rather than propagated, matching the original
/// behavior of silently falling through to a raw partition dump.
pub fn is_specialized(driver: &dyn ToolDriver, partition_device_path: &str) -> bool {
    match driver.run_collecting(&["ntfsinfo", "-m", partition_device_path]) {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(NTFS_MARKER),
        Err(_) => false,
    }
}
