//! Parameter transfers
//!
//! Lockstep request/response loops over the parameter table. The Reface DX
//! answers parameter requests in order without naming the address, so there
//! is never more than one request in flight.
//!
//! A missing reply is recorded as a [`TransferFault`] and the loop moves on;
//! only handshake failures, malformed uploads, cancellation and transport
//! errors abort a transfer.

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};

use super::handshake::{verify_identity, IdentityStatus};
use crate::device::reface_dx::{parameter_change, parameter_request, reply_value};
use crate::error::{LibrarianError, Result};
use crate::patch::{
    encode_name, ParameterTable, PatchImage, VoiceName, NAME_LEN, NAME_RANGE, PATCH_SIZE,
};
use crate::transport::{await_any, await_sysex, MidiChannel};

/// Default wait for each parameter reply
pub const DEFAULT_PARAMETER_TIMEOUT: Duration = Duration::from_millis(500);

/// Default wait for the identity reply
pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Timeouts for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    pub parameter_timeout: Duration,
    pub identity_timeout: Duration,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            parameter_timeout: DEFAULT_PARAMETER_TIMEOUT,
            identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
        }
    }
}

/// Shared flag for abandoning a transfer between parameter steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One parameter that did not transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFault {
    /// Nothing arrived before the parameter timeout
    ParameterTimeout { index: usize },
    /// A SysEx reply arrived but held no readable value
    MalformedReply { index: usize, len: usize },
}

impl TransferFault {
    /// Table index of the parameter
    pub fn index(&self) -> usize {
        match self {
            TransferFault::ParameterTimeout { index } => *index,
            TransferFault::MalformedReply { index, .. } => *index,
        }
    }
}

impl fmt::Display for TransferFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferFault::ParameterTimeout { index } => {
                write!(f, "parameter {} timed out", index)
            }
            TransferFault::MalformedReply { index, len } => {
                write!(f, "parameter {} reply malformed ({} bytes)", index, len)
            }
        }
    }
}

/// Summary state of a finished transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Complete,
    Incomplete { missing: usize },
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Complete => write!(f, "complete"),
            TransferOutcome::Incomplete { missing } => {
                write!(f, "incomplete: {} missing parameters", missing)
            }
        }
    }
}

/// Faults collected over one transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    steps: usize,
    faults: Vec<TransferFault>,
}

impl TransferReport {
    /// Number of parameters exchanged or attempted
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn faults(&self) -> &[TransferFault] {
        &self.faults
    }

    pub fn is_complete(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn missing_indices(&self) -> Vec<usize> {
        self.faults.iter().map(TransferFault::index).collect()
    }

    pub fn outcome(&self) -> TransferOutcome {
        if self.faults.is_empty() {
            TransferOutcome::Complete
        } else {
            TransferOutcome::Incomplete {
                missing: self.faults.len(),
            }
        }
    }
}

/// A voice read from the device
#[derive(Debug, Clone)]
pub struct Download {
    pub patch: PatchImage,
    pub report: TransferReport,
}

impl Download {
    pub fn voice_name(&self) -> VoiceName {
        self.patch.voice_name()
    }

    /// File stem suggested for storing this voice
    pub fn suggested_identifier(&self) -> String {
        self.voice_name().storage_identifier()
    }
}

/// A voice name read from the device
#[derive(Debug, Clone)]
pub struct NameReport {
    pub name: VoiceName,
    pub report: TransferReport,
}

/// Exclusive use of one channel for handshake plus transfer
///
/// Every transfer starts with the identity handshake and aborts before any
/// parameter message if it fails.
pub struct Session<'a, C: MidiChannel + ?Sized> {
    channel: &'a mut C,
    settings: TransferSettings,
    table: ParameterTable,
    cancel: Option<CancelToken>,
}

impl<'a, C: MidiChannel + ?Sized> Session<'a, C> {
    pub fn new(channel: &'a mut C, settings: TransferSettings) -> Self {
        Self {
            channel,
            settings,
            table: ParameterTable::new(),
            cancel: None,
        }
    }

    /// Check `token` between parameter steps
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    pub fn verify_identity(&mut self) -> Result<IdentityStatus> {
        verify_identity(&mut *self.channel, self.settings.identity_timeout)
    }

    fn require_identity(&mut self) -> Result<()> {
        self.verify_identity()?.into_result()
    }

    /// Read the whole voice into a fresh zeroed image
    pub fn download_patch(&mut self) -> Result<Download> {
        let mut patch = PatchImage::zeroed();
        let report = self.download_into(&mut patch)?;
        Ok(Download { patch, report })
    }

    /// Read the whole voice into `patch`
    ///
    /// Slots whose parameter faulted keep their previous value.
    pub fn download_into(&mut self, patch: &mut PatchImage) -> Result<TransferReport> {
        self.require_identity()?;
        info!("Requesting {} parameters", PATCH_SIZE);

        let report = self.read_range(0..PATCH_SIZE, patch.as_bytes_mut())?;
        log_report("Download", &report);
        Ok(report)
    }

    /// Write a voice to the device
    pub fn upload_patch(&mut self, patch: &PatchImage) -> Result<TransferReport> {
        self.require_identity()?;
        info!("Sending {} parameters", PATCH_SIZE);

        let report = self.write_range(0..PATCH_SIZE, patch.as_bytes())?;
        log_report("Upload", &report);
        Ok(report)
    }

    /// Validate a raw buffer and write it to the device
    ///
    /// A buffer that is not a valid voice is rejected before anything is
    /// sent, including the identity request.
    pub fn upload_bytes(&mut self, bytes: &[u8]) -> Result<TransferReport> {
        let patch = PatchImage::from_bytes(bytes)?;
        self.upload_patch(&patch)
    }

    /// Read only the name block
    pub fn get_name(&mut self) -> Result<NameReport> {
        self.require_identity()?;
        debug!("Getting name");

        let mut name = [0u8; NAME_LEN];
        let report = self.read_range(NAME_RANGE, &mut name)?;
        log_report("Get name", &report);
        Ok(NameReport {
            name: VoiceName::from_bytes(&name),
            report,
        })
    }

    /// Write only the name block, padded or truncated to ten characters
    pub fn set_name(&mut self, name: &str) -> Result<TransferReport> {
        let bytes = encode_name(name);
        self.require_identity()?;
        debug!("Setting name bytes: {:?}", String::from_utf8_lossy(&bytes));

        let report = self.write_range(NAME_RANGE, &bytes)?;
        log_report("Set name", &report);
        Ok(report)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                warn!("Transfer cancelled");
                Err(LibrarianError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    /// Discard anything already waiting, e.g. a reply that arrived after
    /// its timeout
    fn drain(&mut self) -> Result<()> {
        while let Some(stale) = self.channel.receive(Duration::ZERO)? {
            trace!("Discarding stale {:?}", stale);
        }
        Ok(())
    }

    /// Request each parameter in `range`, storing values at
    /// `dest[index - range.start]`
    fn read_range(&mut self, range: Range<usize>, dest: &mut [u8]) -> Result<TransferReport> {
        debug_assert_eq!(dest.len(), range.len());
        let start = range.start;
        let timeout = self.settings.parameter_timeout;
        let mut report = TransferReport::default();

        for (index, address) in self.table.entries(range) {
            self.check_cancelled()?;
            self.drain()?;

            trace!("Requesting {} ({})", index, address);
            self.channel.send(&parameter_request(address))?;
            report.steps += 1;

            match await_sysex(&mut *self.channel, timeout)? {
                Some(reply) => match reply_value(&reply) {
                    Ok(value) => dest[index - start] = value,
                    Err(reason) => {
                        warn!("Parameter {} ({}): unreadable reply {:?}: {:?}", index, address, reply, reason);
                        report.faults.push(TransferFault::MalformedReply {
                            index,
                            len: reply.len(),
                        });
                    }
                },
                None => {
                    warn!("Reface did not return parameter {} ({}) on request", index, address);
                    report.faults.push(TransferFault::ParameterTimeout { index });
                }
            }
        }

        Ok(report)
    }

    /// Send each value in `src` to the matching address in `range`, waiting
    /// for any message as acknowledgement
    fn write_range(&mut self, range: Range<usize>, src: &[u8]) -> Result<TransferReport> {
        debug_assert_eq!(src.len(), range.len());
        let start = range.start;
        let timeout = self.settings.parameter_timeout;
        let mut report = TransferReport::default();

        for (index, address) in self.table.entries(range) {
            self.check_cancelled()?;
            self.drain()?;

            let value = src[index - start];
            trace!("Setting {} ({}) = {}", index, address, value);
            self.channel.send(&parameter_change(address, value))?;
            report.steps += 1;

            if await_any(&mut *self.channel, timeout)?.is_none() {
                warn!("No acknowledgement for parameter {} ({})", index, address);
                report.faults.push(TransferFault::ParameterTimeout { index });
            }
        }

        Ok(report)
    }
}

fn log_report(operation: &str, report: &TransferReport) {
    match report.outcome() {
        TransferOutcome::Complete => info!("{} completed ({} parameters)", operation, report.steps()),
        outcome => warn!(
            "{} {}: indices {:?}",
            operation,
            outcome,
            report.missing_indices()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::reface_dx::IDENTITY_REQUEST;
    use crate::transport::SimulatedReface;
    use pretty_assertions::assert_eq;

    fn settings() -> TransferSettings {
        TransferSettings {
            parameter_timeout: Duration::from_millis(20),
            identity_timeout: Duration::from_millis(20),
        }
    }

    fn sample_patch() -> PatchImage {
        let mut bytes: Vec<u8> = (0..PATCH_SIZE).map(|i| (i * 7 % 128) as u8).collect();
        bytes[..NAME_LEN].copy_from_slice(b"Brass 1   ");
        PatchImage::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_download_reads_device_voice() {
        let mut device = SimulatedReface::with_voice(sample_patch());
        let download = Session::new(&mut device, settings()).download_patch().unwrap();

        assert_eq!(download.patch, sample_patch());
        assert!(download.report.is_complete());
        assert_eq!(download.report.steps(), PATCH_SIZE);
        assert_eq!(download.suggested_identifier(), "Brass 1");
        // identity request plus one request per parameter
        assert_eq!(device.sent().len(), PATCH_SIZE + 1);
    }

    #[test]
    fn test_download_keeps_prior_value_on_timeout() {
        let mut device = SimulatedReface::with_voice(sample_patch()).silent_at(20);
        let mut patch = PatchImage::zeroed();
        patch.set(20, 0x55);

        let report = Session::new(&mut device, settings())
            .download_into(&mut patch)
            .unwrap();

        assert_eq!(report.faults(), &[TransferFault::ParameterTimeout { index: 20 }]);
        assert_eq!(patch.get(20), Some(0x55));
        assert_eq!(patch.get(21), sample_patch().get(21));
    }

    #[test]
    fn test_short_reply_is_fault() {
        let mut device = SimulatedReface::with_voice(sample_patch()).truncated_at(5);
        let download = Session::new(&mut device, settings()).download_patch().unwrap();
        assert_eq!(
            download.report.faults(),
            &[TransferFault::MalformedReply { index: 5, len: 2 }]
        );
        assert_eq!(download.report.outcome(), TransferOutcome::Incomplete { missing: 1 });
    }

    #[test]
    fn test_handshake_failure_sends_no_parameters() {
        let mut device = SimulatedReface::new().without_identity();
        let result = Session::new(&mut device, settings()).download_patch();
        assert!(matches!(result, Err(LibrarianError::NoResponse)));
        assert_eq!(device.sent(), &[IDENTITY_REQUEST.to_vec()]);

        let mut device = SimulatedReface::new().with_identity_reply(vec![0xF0, 0x7E, 0x7F, 0xF7]);
        let result = Session::new(&mut device, settings()).upload_patch(&sample_patch());
        assert!(matches!(result, Err(LibrarianError::DeviceMismatch { .. })));
        assert_eq!(device.sent().len(), 1);
    }

    #[test]
    fn test_upload_writes_device_voice() {
        let mut device = SimulatedReface::new();
        let report = Session::new(&mut device, settings())
            .upload_patch(&sample_patch())
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(device.voice(), &sample_patch());
    }

    #[test]
    fn test_upload_continues_after_missing_ack() {
        let mut device = SimulatedReface::new().silent_at(50);
        let report = Session::new(&mut device, settings())
            .upload_patch(&sample_patch())
            .unwrap();

        assert_eq!(report.missing_indices(), vec![50]);
        assert_eq!(report.steps(), PATCH_SIZE);
        assert_eq!(device.voice().get(51), sample_patch().get(51));
        assert_eq!(device.voice().get(132), sample_patch().get(132));
    }

    #[test]
    fn test_upload_bytes_rejects_before_io() {
        let mut device = SimulatedReface::new();
        let mut bytes = sample_patch().as_bytes().to_vec();
        bytes[7] = 0xC0;

        let result = Session::new(&mut device, settings()).upload_bytes(&bytes);
        assert!(matches!(result, Err(LibrarianError::MalformedPatch { .. })));
        assert_eq!(device.bytes_sent(), 0);
    }

    #[test]
    fn test_name_round_trip() {
        let mut device = SimulatedReface::with_voice(sample_patch());
        let mut session = Session::new(&mut device, settings());

        let report = session.set_name("Lead X").unwrap();
        assert_eq!(report.steps(), NAME_LEN);
        let name = session.get_name().unwrap();
        assert_eq!(name.name.as_str(), "Lead X");
        assert!(name.report.is_complete());

        // only the name block changed
        assert_eq!(device.voice().name_bytes(), b"Lead X    ");
        assert_eq!(
            &device.voice().as_bytes()[NAME_LEN..],
            &sample_patch().as_bytes()[NAME_LEN..]
        );
    }

    #[test]
    fn test_cancelled_before_first_parameter() {
        let token = CancelToken::new();
        token.cancel();
        let mut device = SimulatedReface::new();
        let result = Session::new(&mut device, settings())
            .with_cancel(token)
            .download_patch();
        assert!(matches!(result, Err(LibrarianError::Cancelled)));
        // handshake only
        assert_eq!(device.sent().len(), 1);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(TransferOutcome::Complete.to_string(), "complete");
        assert_eq!(
            TransferOutcome::Incomplete { missing: 3 }.to_string(),
            "incomplete: 3 missing parameters"
        );
    }
}
