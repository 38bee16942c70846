use bytes::{BufMut, Bytes, BytesMut};
use scsgate_core::constants::{GROUP_LENGTH, TELEGRAM_END, TELEGRAM_START};
use std::fmt;

/// XOR of all body group values.
///
/// The wire renders the result as one more byte group, so the checksum of a
/// body is always exactly two uppercase hex characters wide. An empty body
/// folds to zero.
#[must_use]
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// An outgoing bus telegram: body groups to be framed and checksummed.
///
/// The wire form is the start marker, the body groups, the checksum group
/// and the end marker, all as uppercase hex ASCII:
///
/// ```text
/// A8 12 00 15 00 07 A3
/// ^^ ^^^^^^^^^^^ ^^ ^^
/// |  body        |  end marker
/// start          checksum
/// ```
///
/// ```
/// use scsgate_protocol::Telegram;
///
/// let telegram = Telegram::new([0x12, 0x00, 0x15, 0x00]);
/// assert_eq!(&telegram.encode()[..], b"A81200150007A3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    body: Vec<u8>,
}

impl Telegram {
    /// Create a telegram from its body group values.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Telegram { body: body.into() }
    }

    /// The body group values, checksum and framing excluded.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Checksum group value for this body.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        checksum(&self.body)
    }

    /// Total byte-group count of the encoded form, framing markers and
    /// checksum included.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.body.len() + 3
    }

    /// Encode to wire ASCII.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.group_count() * GROUP_LENGTH);
        buf.put_slice(TELEGRAM_START.as_bytes());
        for value in &self.body {
            buf.put_slice(format!("{value:02X}").as_bytes());
        }
        buf.put_slice(format!("{:02X}", self.checksum()).as_bytes());
        buf.put_slice(TELEGRAM_END.as_bytes());
        buf.freeze()
    }
}

impl fmt::Display for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.encode()))
    }
}

/// Frame and checksum a body in one call.
#[must_use]
pub fn compose(body: &[u8]) -> Bytes {
    Telegram::new(body).encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0x14, 0x00, 0x12, 0x01], 0x07)]
    #[case(&[0x14, 0x00, 0x12, 0x00], 0x06)]
    #[case(&[0x33, 0x00, 0x12, 0x00], 0x21)]
    #[case(&[0xB8, 0x33, 0x12, 0x01], 0x98)]
    #[case(&[0x33, 0x00, 0x15, 0x00], 0x26)]
    #[case(&[0xB8, 0x33, 0x12, 0x00], 0x99)]
    #[case(&[0x36, 0x00, 0x12, 0x01], 0x25)]
    #[case(&[0x96, 0xBE, 0x31, 0x00], 0x19)]
    fn test_checksum_vectors(#[case] body: &[u8], #[case] expected: u8) {
        assert_eq!(checksum(body), expected);
    }

    #[test]
    fn test_checksum_empty_body() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_checksum_rendering_is_zero_padded() {
        let telegram = Telegram::new([0x14, 0x00, 0x12, 0x01]);
        let encoded = telegram.encode();
        let rendered = &encoded[encoded.len() - 4..encoded.len() - 2];
        assert_eq!(rendered, b"07");
    }

    #[test]
    fn test_compose_status_request() {
        assert_eq!(&compose(&[0x12, 0x00, 0x15, 0x00])[..], b"A81200150007A3");
    }

    #[test]
    fn test_compose_set_status() {
        assert_eq!(&compose(&[0x33, 0x00, 0x12, 0x00])[..], b"A83300120021A3");
    }

    #[test]
    fn test_telegram_accessors() {
        let telegram = Telegram::new([0x33, 0x00, 0x15, 0x00]);
        assert_eq!(telegram.body(), &[0x33, 0x00, 0x15, 0x00]);
        assert_eq!(telegram.checksum(), 0x26);
        assert_eq!(telegram.group_count(), 7);
    }

    #[test]
    fn test_telegram_display_is_wire_ascii() {
        let telegram = Telegram::new([0x12, 0x00, 0x15, 0x00]);
        assert_eq!(telegram.to_string(), "A81200150007A3");
    }
}
