//! Voice names
//!
//! The first ten bytes of a voice are its name, one character code per byte.
//! Names read from the device are sanitised before they are displayed or
//! used as a file name; names written to the device are padded to exactly
//! ten 7-bit characters.

use std::fmt;

use super::table::NAME_LEN;

/// Character written in place of anything outside printable ASCII
const UNSENDABLE_REPLACEMENT: u8 = b'?';

/// Replacement table for name bytes read from a device.
///
/// `None` drops the character.
fn sanitize_char(byte: u8) -> Option<char> {
    match byte {
        b'/' | b'\\' => None,
        0x20..=0x7E => Some(byte as char),
        _ => Some(' '),
    }
}

/// Display form of a voice name, derived from raw name bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VoiceName(String);

impl VoiceName {
    /// Derive a name from device bytes: path separators removed,
    /// non-printable bytes turned into spaces, trailing padding trimmed
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let name: String = bytes.iter().copied().filter_map(sanitize_char).collect();
        VoiceName(name.trim_end().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier safe to use as a file stem
    ///
    /// Leading whitespace is dropped as well; an empty name becomes `untitled`.
    pub fn storage_identifier(&self) -> String {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            "untitled".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a user supplied name as the ten bytes sent to the device.
///
/// Right-padded with spaces or truncated to ten characters. Characters
/// outside printable ASCII become `?`.
pub fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut bytes = [b' '; NAME_LEN];
    for (slot, c) in bytes.iter_mut().zip(name.chars()) {
        *slot = match c {
            ' '..='~' => c as u8,
            _ => UNSENDABLE_REPLACEMENT,
        };
    }
    bytes
}
