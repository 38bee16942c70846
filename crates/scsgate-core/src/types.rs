use crate::{
    Result,
    constants::{GROUP_LENGTH, STATUS_ON},
    error::Error,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// SCS device identifier, one byte group on the wire.
///
/// Renders as two uppercase hex digits, the form used in telegrams and in
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u8);

impl DeviceId {
    /// Create a device ID from its raw byte value. Every value is a valid
    /// bus address.
    #[must_use]
    pub fn new(id: u8) -> Self {
        DeviceId(id)
    }

    /// Get the raw device ID as u8.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

impl From<u8> for DeviceId {
    fn from(id: u8) -> Self {
        DeviceId(id)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let well_formed =
            (1..=GROUP_LENGTH).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit());
        if !well_formed {
            return Err(Error::invalid_device_id(s));
        }
        let id = u8::from_str_radix(s, 16).map_err(|_| Error::invalid_device_id(s))?;
        Ok(DeviceId(id))
    }
}

/// Serialized as the 2-digit hex string, the shape configuration files use.
impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// On/off status of a switch or light as reported on the bus.
///
/// The wire encodes "on" as a zero status group; any other value reads as
/// "off".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    On,
    Off,
}

impl Status {
    /// Decode a status byte group.
    #[must_use]
    pub fn from_wire(value: u8) -> Self {
        if value == STATUS_ON {
            Status::On
        } else {
            Status::Off
        }
    }

    /// Returns `true` if the status is On.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Status::On)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::On => write!(f, "on"),
            Status::Off => write!(f, "off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("33", 0x33)]
    #[case("A5", 0xA5)]
    #[case("a5", 0xA5)]
    #[case("7", 0x07)]
    fn test_device_id_parse(#[case] input: &str, #[case] expected: u8) {
        let id: DeviceId = input.parse().unwrap();
        assert_eq!(id.as_u8(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("100")] // three digits
    #[case("G5")] // non-hex
    #[case("+5")] // sign accepted by from_str_radix but not on the wire
    fn test_device_id_parse_invalid(#[case] input: &str) {
        let result: Result<DeviceId> = input.parse();
        assert!(result.is_err());
    }

    #[rstest]
    #[case(0x07, "07")]
    #[case(0x33, "33")]
    #[case(0xAB, "AB")]
    fn test_device_id_display(#[case] id: u8, #[case] expected: &str) {
        assert_eq!(DeviceId::new(id).to_string(), expected);
    }

    #[test]
    fn test_device_id_roundtrip() {
        let id: DeviceId = "12".parse().unwrap();
        assert_eq!(id.to_string(), "12");
    }

    #[rstest]
    #[case(0x00, Status::On)]
    #[case(0x01, Status::Off)]
    #[case(0xFF, Status::Off)]
    fn test_status_from_wire(#[case] value: u8, #[case] expected: Status) {
        assert_eq!(Status::from_wire(value), expected);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::On.to_string(), "on");
        assert_eq!(Status::Off.to_string(), "off");
        assert!(Status::On.is_on());
        assert!(!Status::Off.is_on());
    }
}
