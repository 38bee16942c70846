//! Wire-protocol constants for the SCSGate serial gateway.
//!
//! The gateway speaks an ASCII-hex protocol: every SCS bus datagram is a
//! sequence of *byte groups*, each group being two ASCII characters encoding
//! one 8-bit value in uppercase hex.
//!
//! # Telegram structure
//!
//! ```text
//! A8 33 00 12 00 21 A3
//! ^^ ^^^^^^^^^^^ ^^ ^^
//! |  body        |  end marker
//! |              checksum (XOR of the body groups)
//! start marker
//! ```
//!
//! A decodable non-Ack datagram always has exactly [`TELEGRAM_GROUPS`]
//! groups: start marker, four body groups, checksum, end marker. The lone
//! exception is the two-character [`ACK_DATAGRAM`] the gateway emits to
//! acknowledge a bus write.
//!
//! # Host commands
//!
//! Commands from the host to the gateway itself are not framed; they start
//! with `@` and are answered with the single byte [`COMMAND_ACK`]:
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `@b` | clear the gateway buffers |
//! | `@c` | cancel any pending operation |
//! | `@MA` | switch the gateway to ASCII mode |
//! | `@F2` | enable the on-device ack filter |
//! | `@r` | return one buffered bus datagram, length-prefixed |
//! | `@W<n>` | transmit a raw telegram of `n` byte groups on the bus |
//! | `@w<a><id>` | single-device action `a` against device `id` |
//!
//! The on-device ack filter is known to drop the ball on repeated state
//! notifications, which is why the monitor keeps its own duplicate
//! suppression on top of `@F2`.
//!
//! ```
//! use scsgate_core::constants::{ACK_DATAGRAM, TELEGRAM_GROUPS};
//!
//! assert_eq!(ACK_DATAGRAM, "A5");
//! assert_eq!(TELEGRAM_GROUPS, 7);
//! ```

// ============================================================================
// Datagram framing
// ============================================================================

/// Start marker of a framed telegram.
pub const TELEGRAM_START: &str = "A8";

/// End marker of a framed telegram.
pub const TELEGRAM_END: &str = "A3";

/// Datagram the gateway emits to acknowledge a bus write.
///
/// This is the only well-formed datagram that is not
/// [`TELEGRAM_GROUPS`] groups long.
pub const ACK_DATAGRAM: &str = "A5";

/// Number of byte groups in a decodable non-Ack datagram.
///
/// Start marker, four body groups, checksum, end marker. Any other group
/// count decodes to `Unknown`.
pub const TELEGRAM_GROUPS: usize = 7;

/// ASCII characters per byte group.
pub const GROUP_LENGTH: usize = 2;

// ============================================================================
// Datagram shape codes
// ============================================================================

/// Second group of an unsolicited state notification.
///
/// State datagrams are recognized by this value before any of the
/// request-code checks below.
pub const STATE_MARKER: u8 = 0xB8;

/// Request code of an observed set-status command (group 3).
pub const SET_STATUS_CODE: u8 = 0x12;

/// Request code of a scenario trigger (group 3).
pub const SCENARIO_TRIGGERED_CODE: u8 = 0x14;

/// Request code of a status query (group 3).
pub const REQUEST_STATUS_CODE: u8 = 0x15;

/// Status group value meaning "on"; every other value means "off".
pub const STATUS_ON: u8 = 0x00;

/// Filler body group used where the protocol wants a zero byte.
pub const NULL_GROUP: u8 = 0x00;

// ============================================================================
// Host commands
// ============================================================================

/// Ask the gateway for one buffered bus datagram.
///
/// The reply is one ASCII hex digit with the byte-group count, followed by
/// twice that many ASCII characters. A count of `0` carries no payload.
pub const MONITOR_REQUEST: &[u8] = b"@r";

/// Prefix of a raw-telegram transmission; followed by the group count as a
/// single hex digit, then the telegram itself.
pub const TRANSMIT_PREFIX: &str = "@W";

/// Prefix of a single-device action; followed by an action digit and the
/// target device id.
pub const SET_STATUS_PREFIX: &str = "@w";

/// Clear the gateway buffers (session setup).
pub const CLEAR_BUFFERS: &[u8] = b"@b";

/// Cancel any pending gateway operation (session setup and teardown).
pub const CANCEL_PENDING: &[u8] = b"@c";

/// Switch the gateway to ASCII mode (session setup).
pub const ASCII_MODE: &[u8] = b"@MA";

/// Enable the on-device ack filter (session setup).
pub const ENABLE_ACK_FILTER: &[u8] = b"@F2";

/// Single-byte acknowledgment to every host command.
pub const COMMAND_ACK: u8 = b'k';

// ============================================================================
// Single-device action digits
// ============================================================================

/// Turn the target device on.
pub const ACTION_ON: char = '0';

/// Turn the target device off.
pub const ACTION_OFF: char = '1';

/// Start raising the target roller shutter.
pub const ACTION_RAISE: char = '8';

/// Start lowering the target roller shutter.
pub const ACTION_LOWER: char = '9';

/// Halt the target roller shutter.
pub const ACTION_HALT: char = 'A';

// ============================================================================
// Serial link
// ============================================================================

/// Fixed baud rate of the SCSGate serial link.
pub const BAUD_RATE: u32 = 115_200;
