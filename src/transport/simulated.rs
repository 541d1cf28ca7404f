//! Simulated Reface DX
//!
//! An in-memory device implementing [`MidiChannel`]. It answers the identity
//! request, replies to parameter requests from its voice memory and echoes
//! parameter changes, so transfers can run without hardware. Faults are
//! injected per table index.
//!
//! `receive` never sleeps: when the device has nothing queued it reports a
//! timeout at once.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use log::debug;

use super::MidiChannel;
use crate::device::reface_dx::{parameter_reply, DeviceRequest, IDENTITY_REPLY};
use crate::error::Result;
use crate::patch::{ParameterAddress, ParameterTable, PatchImage};
use crate::sysex::MidiMessage;

/// Active sensing, sent as unrelated traffic when noise is enabled
const ACTIVE_SENSING: u8 = 0xFE;

pub struct SimulatedReface {
    voice: PatchImage,
    identity_reply: Option<Vec<u8>>,
    silent: HashSet<usize>,
    truncated: HashSet<usize>,
    noise: bool,
    outgoing: VecDeque<MidiMessage>,
    sent: Vec<Vec<u8>>,
}

impl Default for SimulatedReface {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedReface {
    /// A well-behaved device holding a zeroed voice
    pub fn new() -> Self {
        Self::with_voice(PatchImage::zeroed())
    }

    pub fn with_voice(voice: PatchImage) -> Self {
        Self {
            voice,
            identity_reply: Some(IDENTITY_REPLY.to_vec()),
            silent: HashSet::new(),
            truncated: HashSet::new(),
            noise: false,
            outgoing: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Reply to identity requests with `reply` instead of the Reface DX identity
    pub fn with_identity_reply(mut self, reply: Vec<u8>) -> Self {
        self.identity_reply = Some(reply);
        self
    }

    /// Never answer identity requests
    pub fn without_identity(mut self) -> Self {
        self.identity_reply = None;
        self
    }

    /// Drop every request for the parameter at table `index`
    pub fn silent_at(mut self, index: usize) -> Self {
        self.silent.insert(index);
        self
    }

    /// Answer requests for table `index` with a frame too short to hold a value
    pub fn truncated_at(mut self, index: usize) -> Self {
        self.truncated.insert(index);
        self
    }

    /// Precede every reply with a non-SysEx message
    pub fn with_noise(mut self) -> Self {
        self.noise = true;
        self
    }

    pub fn voice(&self) -> &PatchImage {
        &self.voice
    }

    /// Every message the host has sent, in order
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn bytes_sent(&self) -> usize {
        self.sent.iter().map(Vec::len).sum()
    }

    fn index_of(address: ParameterAddress) -> Option<usize> {
        ParameterTable::new()
            .as_slice()
            .iter()
            .position(|a| *a == address)
    }

    fn queue(&mut self, bytes: Vec<u8>) {
        if self.noise {
            self.outgoing.push_back(MidiMessage::new(vec![ACTIVE_SENSING]));
        }
        self.outgoing.push_back(MidiMessage::new(bytes));
    }

    fn reply_for(&mut self, index: usize, address: ParameterAddress, value: u8) {
        if self.silent.contains(&index) {
            debug!("Simulated device ignoring parameter {}", index);
        } else if self.truncated.contains(&index) {
            self.queue(vec![0xF0, 0xF7]);
        } else {
            self.queue(parameter_reply(address, value));
        }
    }

    fn handle(&mut self, bytes: &[u8]) {
        match DeviceRequest::parse(bytes) {
            Some(DeviceRequest::Identity) => {
                if let Some(reply) = self.identity_reply.clone() {
                    self.queue(reply);
                }
            }
            Some(DeviceRequest::Dump(address)) => {
                if let Some(index) = Self::index_of(address) {
                    let value = self.voice.get(index).unwrap_or_default();
                    self.reply_for(index, address, value);
                }
            }
            Some(DeviceRequest::Change(address, value)) => {
                if let Some(index) = Self::index_of(address) {
                    if !self.silent.contains(&index) {
                        self.voice.set(index, value);
                    }
                    self.reply_for(index, address, value);
                }
            }
            None => debug!("Simulated device ignoring {:?}", MidiMessage::from(bytes)),
        }
    }
}

impl MidiChannel for SimulatedReface {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.sent.push(bytes.to_vec());
        self.handle(bytes);
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Option<MidiMessage>> {
        Ok(self.outgoing.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::reface_dx::{parameter_change, parameter_request, IDENTITY_REQUEST};

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[test]
    fn test_identity_reply() {
        let mut device = SimulatedReface::new();
        device.send(IDENTITY_REQUEST).unwrap();
        let reply = device.receive(TIMEOUT).unwrap().unwrap();
        assert_eq!(reply.as_bytes(), IDENTITY_REPLY);
        assert!(device.receive(TIMEOUT).unwrap().is_none());
    }

    #[test]
    fn test_change_then_request() {
        let mut device = SimulatedReface::new();
        let addr = ParameterTable::new().get(40).unwrap();

        device.send(&parameter_change(addr, 99)).unwrap();
        assert!(device.receive(TIMEOUT).unwrap().is_some());
        assert_eq!(device.voice().get(40), Some(99));

        device.send(&parameter_request(addr)).unwrap();
        let reply = device.receive(TIMEOUT).unwrap().unwrap();
        assert_eq!(reply.as_bytes()[reply.len() - 2], 99);
    }

    #[test]
    fn test_silent_index() {
        let mut device = SimulatedReface::new().silent_at(3);
        let addr = ParameterTable::new().get(3).unwrap();
        device.send(&parameter_request(addr)).unwrap();
        assert!(device.receive(TIMEOUT).unwrap().is_none());
    }

    #[test]
    fn test_noise_precedes_reply() {
        let mut device = SimulatedReface::new().with_noise();
        device.send(IDENTITY_REQUEST).unwrap();
        assert_eq!(device.receive(TIMEOUT).unwrap().unwrap().as_bytes(), &[ACTIVE_SENSING]);
        assert!(device.receive(TIMEOUT).unwrap().unwrap().is_sysex());
    }

    #[test]
    fn test_records_sent_messages() {
        let mut device = SimulatedReface::new().without_identity();
        device.send(IDENTITY_REQUEST).unwrap();
        assert_eq!(device.sent().len(), 1);
        assert_eq!(device.bytes_sent(), IDENTITY_REQUEST.len());
        assert!(device.receive(TIMEOUT).unwrap().is_none());
    }
}
