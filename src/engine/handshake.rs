//! Identity handshake
//!
//! A single identity request/reply exchange, compared byte for byte with
//! the Reface DX identity. No retries.

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};

use crate::device::reface_dx::{identity_request, IDENTITY_REPLY};
use crate::error::{hex_bytes, LibrarianError, Result};
use crate::transport::{await_sysex, MidiChannel};

/// Outcome of an identity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStatus {
    Verified,
    /// A SysEx reply arrived but it is not the Reface DX identity
    DeviceMismatch { received: Vec<u8> },
    NoResponse,
}

impl IdentityStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, IdentityStatus::Verified)
    }

    /// Turn a failed check into the error that aborts a transfer
    pub fn into_result(self) -> Result<()> {
        match self {
            IdentityStatus::Verified => Ok(()),
            IdentityStatus::DeviceMismatch { received } => {
                Err(LibrarianError::DeviceMismatch { received })
            }
            IdentityStatus::NoResponse => Err(LibrarianError::NoResponse),
        }
    }
}

impl fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityStatus::Verified => write!(f, "Reface DX verified"),
            IdentityStatus::DeviceMismatch { received } => {
                write!(f, "Unrecognised device ({})", hex_bytes(received))
            }
            IdentityStatus::NoResponse => write!(f, "No response"),
        }
    }
}

/// Send the identity request and check the reply
///
/// Non-SysEx traffic is skipped; the first SysEx message within `timeout`
/// decides the result.
pub fn verify_identity<C: MidiChannel + ?Sized>(
    channel: &mut C,
    timeout: Duration,
) -> Result<IdentityStatus> {
    debug!("Sending identity request");
    channel.send(&identity_request())?;

    let status = match await_sysex(channel, timeout)? {
        Some(reply) if reply.as_bytes() == IDENTITY_REPLY => IdentityStatus::Verified,
        Some(reply) => IdentityStatus::DeviceMismatch {
            received: reply.into_bytes(),
        },
        None => IdentityStatus::NoResponse,
    };

    match &status {
        IdentityStatus::Verified => info!("Device ID valid (0x53, Reface DX)"),
        other => warn!("Identity check failed: {}", other),
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::reface_dx::IDENTITY_REQUEST;
    use crate::transport::SimulatedReface;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test]
    fn test_verified() {
        let mut device = SimulatedReface::new();
        let status = verify_identity(&mut device, TIMEOUT).unwrap();
        assert_eq!(status, IdentityStatus::Verified);
        assert_eq!(device.sent(), &[IDENTITY_REQUEST.to_vec()]);
    }

    #[test]
    fn test_every_single_byte_difference_is_mismatch() {
        for i in 0..IDENTITY_REPLY.len() {
            let mut reply = IDENTITY_REPLY.to_vec();
            reply[i] ^= 0x01;
            let mut device = SimulatedReface::new().with_identity_reply(reply.clone());
            let status = verify_identity(&mut device, TIMEOUT).unwrap();
            match status {
                // flipping the start byte turns the reply into non-SysEx traffic
                IdentityStatus::NoResponse if i == 0 => {}
                IdentityStatus::DeviceMismatch { received } => assert_eq!(received, reply),
                other => panic!("byte {}: expected mismatch, got {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_no_response() {
        let mut device = SimulatedReface::new().without_identity();
        let status = verify_identity(&mut device, TIMEOUT).unwrap();
        assert_eq!(status, IdentityStatus::NoResponse);
    }

    #[test]
    fn test_noise_skipped() {
        let mut device = SimulatedReface::new().with_noise();
        assert!(verify_identity(&mut device, TIMEOUT).unwrap().is_verified());
    }

    #[test]
    fn test_into_result() {
        assert!(IdentityStatus::Verified.into_result().is_ok());
        assert!(matches!(
            IdentityStatus::NoResponse.into_result(),
            Err(LibrarianError::NoResponse)
        ));
    }
}
