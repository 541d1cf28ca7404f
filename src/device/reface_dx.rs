//! Yamaha Reface DX SysEx messages
//!
//! Parameter requests and changes address a single byte of the voice edit
//! buffer. Replies carry no request tag, so callers must keep one request
//! in flight at a time.

use crate::patch::ParameterAddress;
use crate::sysex::{frame, MidiMessage, SYSEX_END};

const YAMAHA: u8 = 0x43;

const PARAMETER_CHANGE: u8 = 0x10;
const DUMP_REQUEST: u8 = 0x30;

// group high, group low, model id
const MODEL_HEADER: &[u8] = &[0x7F, 0x1C, 0x05];

/// Universal non-realtime identity request, all devices
pub const IDENTITY_REQUEST: &[u8] = &[0xF0, 0x7E, 0x01, 0x06, 0x01, 0xF7];

/// Identity reply sent by a Reface DX
pub const IDENTITY_REPLY: &[u8] = &[
    0xF0, 0x7E, 0x7F, 0x06, 0x02, 0x43, 0x00, 0x41, 0x53, 0x06, 0x03, 0x00, 0x00, 0x7F, 0xF7,
];

/// Shortest reply a value can be read from: `F0 <value> F7`
pub const MIN_REPLY_LEN: usize = 3;

pub fn identity_request() -> Vec<u8> {
    IDENTITY_REQUEST.to_vec()
}

/// `F0 43 30 7F 1C 05 <group> <sub> <offset> F7`
pub fn parameter_request(address: ParameterAddress) -> Vec<u8> {
    let mut payload = vec![YAMAHA, DUMP_REQUEST];
    payload.extend_from_slice(MODEL_HEADER);
    payload.extend_from_slice(&address.to_bytes());
    frame(&payload)
}

/// `F0 43 10 7F 1C 05 <group> <sub> <offset> <value> F7`
pub fn parameter_change(address: ParameterAddress, value: u8) -> Vec<u8> {
    let mut payload = vec![YAMAHA, PARAMETER_CHANGE];
    payload.extend_from_slice(MODEL_HEADER);
    payload.extend_from_slice(&address.to_bytes());
    payload.push(value);
    frame(&payload)
}

/// Why a parameter reply could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyError {
    TooShort,
    Unterminated,
    NotDataByte,
}

/// Read the parameter value from a reply: the byte before the terminator
///
/// Manufacturer and address fields are not checked.
pub fn reply_value(reply: &MidiMessage) -> std::result::Result<u8, ReplyError> {
    let bytes = reply.as_bytes();
    if bytes.len() < MIN_REPLY_LEN {
        return Err(ReplyError::TooShort);
    }
    if bytes[bytes.len() - 1] != SYSEX_END {
        return Err(ReplyError::Unterminated);
    }
    let value = bytes[bytes.len() - 2];
    if value & 0x80 != 0 {
        return Err(ReplyError::NotDataByte);
    }
    Ok(value)
}

/// Parse a parameter message sent *to* a Reface DX
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    Identity,
    Dump(ParameterAddress),
    Change(ParameterAddress, u8),
}

impl DeviceRequest {
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes == IDENTITY_REQUEST {
            return Some(DeviceRequest::Identity);
        }
        let payload = MidiMessage::from(bytes).payload()?.to_vec();
        if payload.len() < 8 || payload[0] != YAMAHA || &payload[2..5] != MODEL_HEADER {
            return None;
        }
        let address = ParameterAddress::new(payload[5], payload[6], payload[7]);
        match (payload[1], payload.len()) {
            (DUMP_REQUEST, 8) => Some(DeviceRequest::Dump(address)),
            (PARAMETER_CHANGE, 9) => Some(DeviceRequest::Change(address, payload[8])),
            _ => None,
        }
    }
}

/// Reply a Reface DX sends for one parameter: a parameter change echo
pub fn parameter_reply(address: ParameterAddress, value: u8) -> Vec<u8> {
    parameter_change(address, value)
}
