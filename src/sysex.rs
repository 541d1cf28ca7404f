//! MIDI System-Exclusive framing
//!
//! A SysEx message is a variable-length frame bounded by `0xF0` and `0xF7`.
//! Channels in this crate carry fully framed messages: the engine sends
//! complete frames and expects complete frames back.

use std::fmt;

use crate::error::hex_bytes;

/// Start of exclusive
pub const SYSEX_START: u8 = 0xF0;

/// End of exclusive
pub const SYSEX_END: u8 = 0xF7;

/// Wrap a payload in `F0 … F7`
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(payload.len() + 2);
    msg.push(SYSEX_START);
    msg.extend_from_slice(payload);
    msg.push(SYSEX_END);
    msg
}

/// Check that a byte fits in a SysEx data byte (high bit clear)
pub fn is_data_byte(byte: u8) -> bool {
    byte & 0x80 == 0
}

/// One MIDI message as received from a channel
#[derive(Clone, PartialEq, Eq)]
pub struct MidiMessage {
    bytes: Vec<u8>,
}

impl MidiMessage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw bytes, including framing for SysEx messages
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if the message starts a System-Exclusive frame
    pub fn is_sysex(&self) -> bool {
        self.bytes.first() == Some(&SYSEX_START)
    }

    /// True if the message is a SysEx frame closed by `0xF7`
    pub fn is_terminated(&self) -> bool {
        self.is_sysex() && self.bytes.len() >= 2 && self.bytes.last() == Some(&SYSEX_END)
    }

    /// Bytes between `F0` and `F7`, if the frame is complete
    pub fn payload(&self) -> Option<&[u8]> {
        if self.is_terminated() {
            Some(&self.bytes[1..self.bytes.len() - 1])
        } else {
            None
        }
    }
}

impl From<Vec<u8>> for MidiMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for MidiMessage {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl fmt::Debug for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MidiMessage[{}]", hex_bytes(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame() {
        assert_eq!(frame(&[0x7E, 0x01]), vec![0xF0, 0x7E, 0x01, 0xF7]);
        assert_eq!(frame(&[]), vec![0xF0, 0xF7]);
    }

    #[test]
    fn test_sysex_detection() {
        let note_on = MidiMessage::new(vec![0x90, 0x40, 0x7F]);
        assert!(!note_on.is_sysex());
        assert_eq!(note_on.payload(), None);

        let sysex = MidiMessage::new(vec![0xF0, 0x43, 0x10, 0xF7]);
        assert!(sysex.is_sysex());
        assert!(sysex.is_terminated());
        assert_eq!(sysex.payload(), Some(&[0x43, 0x10][..]));
    }

    #[test]
    fn test_unterminated_sysex() {
        let truncated = MidiMessage::new(vec![0xF0, 0x43, 0x10]);
        assert!(truncated.is_sysex());
        assert!(!truncated.is_terminated());
        assert_eq!(truncated.payload(), None);

        // a lone start byte is not a terminated frame
        assert!(!MidiMessage::new(vec![0xF0]).is_terminated());
    }

    #[test]
    fn test_data_byte() {
        assert!(is_data_byte(0x7F));
        assert!(!is_data_byte(0x80));
    }

    #[test]
    fn test_debug_format() {
        let msg = MidiMessage::new(vec![0xF0, 0x0A, 0xF7]);
        assert_eq!(format!("{:?}", msg), "MidiMessage[F0 0A F7]");
    }
}
