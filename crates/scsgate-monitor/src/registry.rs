//! Registry of devices seen on the bus, with the YAML shapes used by the
//! filter file and the Home Assistant dump.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scsgate_core::DeviceId;

/// A device the operator has already named.
#[derive(Debug, Clone)]
pub struct KnownDevice {
    /// Home Assistant unique id.
    pub ha_id: String,

    /// Human readable name.
    pub name: String,
}

/// Devices known to the monitor, keyed by bus address.
///
/// Entries come from the filter file, from interactive discovery, or both;
/// the registry treats them the same: their events are not logged when
/// filtering is on and they are not re-discovered.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<DeviceId, KnownDevice>,
}

/// Top-level `devices:` map used by filter files.
#[derive(Debug, Deserialize)]
struct DeviceMap {
    devices: BTreeMap<String, DeviceEntry>,
}

/// One device as it appears on disk. `scs_id` travels as two-digit hex
/// text, the encoding Home Assistant's scsgate platform expects.
#[derive(Debug, Serialize, Deserialize)]
struct DeviceEntry {
    name: String,
    scs_id: DeviceId,
}

/// The `switch:` section consumed by Home Assistant.
#[derive(Debug, Serialize)]
struct HomeAssistantConfig {
    switch: SwitchSection,
}

#[derive(Debug, Serialize)]
struct SwitchSection {
    platform: &'static str,
    devices: BTreeMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load already-known devices from a filter file.
    ///
    /// A missing file is not an error; the registry just stays as it is.
    pub fn load_filter(&mut self, path: &Path) -> anyhow::Result<()> {
        if !path.is_file() {
            warn!("Filter file {} not found, ignoring", path.display());
            return Ok(());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading filter file {}", path.display()))?;
        self.parse_filter(&text)
            .with_context(|| format!("parsing filter file {}", path.display()))
    }

    fn parse_filter(&mut self, text: &str) -> anyhow::Result<()> {
        let file: DeviceMap = serde_yaml::from_str(text)?;
        for (ha_id, entry) in file.devices {
            self.add(entry.scs_id, ha_id, entry.name);
        }
        Ok(())
    }

    /// Whether `id` has already been named.
    pub fn contains(&self, id: DeviceId) -> bool {
        self.devices.contains_key(&id)
    }

    /// Register a device. The first registration wins.
    pub fn add(&mut self, id: DeviceId, ha_id: impl Into<String>, name: impl Into<String>) {
        self.devices.entry(id).or_insert_with(|| KnownDevice {
            ha_id: ha_id.into(),
            name: name.into(),
        });
    }

    fn home_assistant_config(&self) -> HomeAssistantConfig {
        let devices = self
            .devices
            .iter()
            .map(|(scs_id, device)| {
                (
                    device.ha_id.clone(),
                    DeviceEntry {
                        name: device.name.clone(),
                        scs_id: *scs_id,
                    },
                )
            })
            .collect();

        HomeAssistantConfig {
            switch: SwitchSection {
                platform: "scsgate",
                devices,
            },
        }
    }

    /// Write the Home Assistant configuration section to `path`.
    pub fn dump_home_assistant(&self, path: &Path) -> anyhow::Result<()> {
        let yaml = format!(
            "# Generated by scs-monitor on {}\n{}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            serde_yaml::to_string(&self.home_assistant_config())?
        );
        fs::write(path, yaml).with_context(|| {
            format!(
                "writing home assistant configuration to {}",
                path.display()
            )
        })?;
        debug!("Dumped home assistant configuration at {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTER: &str = "\
devices:
  living_room:
    name: Living room
    scs_id: \"33\"
  hallway:
    name: Hallway
    scs_id: \"0A\"
";

    #[test]
    fn test_parse_filter_populates_known_devices() {
        let mut registry = DeviceRegistry::new();
        registry.parse_filter(FILTER).unwrap();

        assert!(registry.contains(DeviceId::new(0x33)));
        assert!(registry.contains(DeviceId::new(0x0A)));
        assert!(!registry.contains(DeviceId::new(0x12)));
    }

    #[test]
    fn test_parse_filter_rejects_bad_scs_id() {
        let mut registry = DeviceRegistry::new();
        let result = registry.parse_filter("devices:\n  x:\n    name: X\n    scs_id: \"zz\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = DeviceRegistry::new();
        registry.add(DeviceId::new(0x33), "living_room", "Living room");
        registry.add(DeviceId::new(0x33), "other", "Other");

        let config = registry.home_assistant_config();
        assert!(config.switch.devices.contains_key("living_room"));
        assert!(!config.switch.devices.contains_key("other"));
    }

    #[test]
    fn test_home_assistant_config_shape() {
        let mut registry = DeviceRegistry::new();
        registry.add(DeviceId::new(0x33), "living_room", "Living room");

        let yaml = serde_yaml::to_string(&registry.home_assistant_config()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(value["switch"]["platform"].as_str(), Some("scsgate"));
        assert_eq!(
            value["switch"]["devices"]["living_room"]["name"].as_str(),
            Some("Living room")
        );
        assert_eq!(
            value["switch"]["devices"]["living_room"]["scs_id"].as_str(),
            Some("33")
        );
    }

    #[test]
    fn test_scs_id_rendered_as_two_digit_hex() {
        let mut registry = DeviceRegistry::new();
        registry.add(DeviceId::new(0x05), "hall", "Hallway");

        let yaml = serde_yaml::to_string(&registry.home_assistant_config()).unwrap();
        assert!(yaml.contains("scs_id: '05'"));
    }

    #[test]
    fn test_load_filter_ignores_missing_file() {
        let mut registry = DeviceRegistry::new();
        registry
            .load_filter(Path::new("/nonexistent/scsgate-filter.yaml"))
            .unwrap();
        assert!(!registry.contains(DeviceId::new(0x33)));
    }
}
