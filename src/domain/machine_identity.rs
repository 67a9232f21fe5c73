//! Stable per-host identity used to tag backups so a host only restores
//! its own.
//!
//! Primary: the system UUID reported by the firmware inventory tool
//! (`dmidecode`), prefixed `DMI`. Fallback: a MAC-derived node identifier,
//! prefixed `PY`. The prefix namespace keeps the two sources from ever
//! colliding.

use crate::domain::repositories::ToolDriver;

const PRIMARY_TOOL: &str = "dmidecode";

pub fn local_machine_id(driver: &dyn ToolDriver) -> String {
    if let Some(uuid) = dmi_uuid(driver) {
        return format!("DMI{uuid}");
    }
    format!("PY{}", mac_fallback())
}

fn dmi_uuid(driver: &dyn ToolDriver) -> Option<String> {
    let output = driver.run_collecting(&[PRIMARY_TOOL]).ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("UUID") {
            let value = rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
            let value = value.split_whitespace().next()?;
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Derives a fallback node identifier from the first non-loopback
/// network interface's MAC address, read straight from sysfs (no extra
/// dependency needed for this one-shot lookup).
fn mac_fallback() -> String {
    let net_dir = std::path::Path::new("/sys/class/net");
    let Ok(entries) = std::fs::read_dir(net_dir) else {
        return "unknown".to_string();
    };

    let mut names: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    names.sort_by_key(|e| e.file_name());

    for entry in names {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == "lo" {
            continue;
        }
        let addr_path = entry.path().join("address");
        if let Ok(addr) = std::fs::read_to_string(&addr_path) {
            let addr = addr.trim().replace(':', "");
            if !addr.is_empty() && addr != "000000000000" {
                return addr;
            }
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::ProcessOutput;

    struct FakeDriver {
        stdout: &'static str,
    }

    impl ToolDriver for FakeDriver {
        fn run_collecting(&self, _argv: &[&str]) -> crate::domain::Result<ProcessOutput> {
            Ok(ProcessOutput {
                stdout: self.stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            })
        }

        fn spawn_stream(
            &self,
            _argv: &[&str],
            _stdin: crate::domain::repositories::StdioMode,
            _stdout: crate::domain::repositories::StdioMode,
        ) -> crate::domain::Result<std::process::Child> {
            unimplemented!("not exercised in this test")
        }
    }

    #[test]
    fn parses_dmi_uuid() {
        let driver = FakeDriver {
            stdout: "Handle 0x0001\n\tUUID: 4C4C4544-0046-3010-8052-B9C04F503432\n",
        };
        assert_eq!(
            local_machine_id(&driver),
            "DMI4C4C4544-0046-3010-8052-B9C04F503432"
        );
    }

    #[test]
    fn falls_back_when_dmidecode_has_no_uuid() {
        let driver = FakeDriver { stdout: "" };
        let id = local_machine_id(&driver);
        assert!(id.starts_with("PY"));
    }
}
