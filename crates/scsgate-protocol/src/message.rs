use scsgate_core::{
    DeviceId, Status,
    constants::{
        ACK_DATAGRAM, GROUP_LENGTH, REQUEST_STATUS_CODE, SCENARIO_TRIGGERED_CODE,
        SET_STATUS_CODE, STATE_MARKER, TELEGRAM_GROUPS,
    },
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One decoded bus datagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// The gateway acknowledged a prior write.
    Ack,
    /// Datagram that matched no known shape; carries the undecoded bytes.
    Unknown { data: Vec<u8> },
    /// Unsolicited notification of a device's current status.
    State { source: DeviceId, status: Status },
    /// Command observed on the bus, turning a switch on or off.
    Command {
        destination: DeviceId,
        source: DeviceId,
        status: Status,
    },
    /// A scenario switch was pressed.
    ScenarioTriggered { source: DeviceId, scenario: u8 },
    /// Status query observed on the bus.
    RequestStatus {
        destination: DeviceId,
        source: DeviceId,
    },
}

impl Message {
    /// Decode one raw datagram.
    ///
    /// Never fails: anything that is not ASCII hex, does not split into
    /// exactly [`TELEGRAM_GROUPS`] byte groups (the two-character Ack reply
    /// aside), or carries an unrecognized shape decodes to
    /// [`Message::Unknown`] with the original bytes.
    ///
    /// Shape dispatch is ordered: a state notification is recognized by its
    /// second group before any of the request-code checks on the fourth
    /// group. Checksums are not verified here; a corrupted-but-well-shaped
    /// datagram still decodes.
    #[must_use]
    pub fn decode(raw: &[u8]) -> Message {
        let Ok(text) = std::str::from_utf8(raw) else {
            return Message::unknown(raw);
        };

        if text == ACK_DATAGRAM {
            return Message::Ack;
        }

        let Some(groups) = split_groups(text) else {
            return Message::unknown(raw);
        };
        if groups.len() != TELEGRAM_GROUPS {
            return Message::unknown(raw);
        }

        if groups[1] == STATE_MARKER {
            return Message::State {
                source: DeviceId::new(groups[2]),
                status: Status::from_wire(groups[4]),
            };
        }
        match groups[3] {
            SET_STATUS_CODE => Message::Command {
                destination: DeviceId::new(groups[1]),
                source: DeviceId::new(groups[2]),
                status: Status::from_wire(groups[4]),
            },
            SCENARIO_TRIGGERED_CODE => Message::ScenarioTriggered {
                source: DeviceId::new(groups[1]),
                scenario: groups[4],
            },
            REQUEST_STATUS_CODE => Message::RequestStatus {
                destination: DeviceId::new(groups[1]),
                source: DeviceId::new(groups[2]),
            },
            _ => Message::unknown(raw),
        }
    }

    /// The device this message concerns: the source for notifications, the
    /// destination for observed requests, absent for `Ack` and `Unknown`.
    ///
    /// Collaborators use this as the join key when correlating bus traffic
    /// to known devices.
    #[must_use]
    pub fn entity(&self) -> Option<DeviceId> {
        match self {
            Message::State { source, .. } | Message::ScenarioTriggered { source, .. } => {
                Some(*source)
            }
            Message::Command { destination, .. } | Message::RequestStatus { destination, .. } => {
                Some(*destination)
            }
            Message::Ack | Message::Unknown { .. } => None,
        }
    }

    fn unknown(raw: &[u8]) -> Message {
        Message::Unknown { data: raw.to_vec() }
    }
}

/// Split an ASCII datagram into byte-group values.
///
/// Returns `None` for odd-length or non-hex input.
fn split_groups(text: &str) -> Option<Vec<u8>> {
    if text.len() % GROUP_LENGTH != 0 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    text.as_bytes()
        .chunks(GROUP_LENGTH)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Ack => write!(f, "Ack"),
            Message::Unknown { data } => {
                write!(f, "Unknown[data={}]", String::from_utf8_lossy(data))
            }
            Message::State { source, status } => {
                write!(f, "State[source={source}, status={status}]")
            }
            Message::Command {
                destination,
                source,
                status,
            } => write!(
                f,
                "Command[destination={destination}, source={source}, status={status}]"
            ),
            Message::ScenarioTriggered { source, scenario } => {
                write!(f, "ScenarioTriggered[source={source}, scenario={scenario:02X}]")
            }
            Message::RequestStatus {
                destination,
                source,
            } => write!(f, "RequestStatus[destination={destination}, source={source}]"),
        }
    }
}
