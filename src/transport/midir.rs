//! Real MIDI ports through `midir`
//!
//! Input arrives on midir's callback thread and is forwarded over an mpsc
//! channel, so [`MidiChannel::receive`] can block with a timeout.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, info};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use super::MidiChannel;
use crate::error::{LibrarianError, Result};
use crate::sysex::MidiMessage;

const CLIENT_NAME: &str = "reface-dx librarian";

fn transport_error(err: impl std::fmt::Display) -> LibrarianError {
    LibrarianError::Transport {
        reason: err.to_string(),
    }
}

/// Names of the available MIDI ports
#[derive(Debug, Clone, Default)]
pub struct PortList {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

pub fn list_ports() -> Result<PortList> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(transport_error)?;
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(transport_error)?;

    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(PortList { inputs, outputs })
}

/// Input and output connection to one device
pub struct MidirChannel {
    _input: MidiInputConnection<()>,
    output: MidiOutputConnection,
    incoming: Receiver<MidiMessage>,
    port_name: String,
}

impl MidirChannel {
    /// Connect to the first input and output whose names contain `name`
    /// (case-insensitive)
    pub fn open(name: &str) -> Result<Self> {
        let needle = name.to_lowercase();

        let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(transport_error)?;
        // midir drops SysEx unless told otherwise
        midi_in.ignore(Ignore::None);
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(transport_error)?;

        let in_port = midi_in
            .ports()
            .into_iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .map(|n| n.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .ok_or_else(|| LibrarianError::PortNotFound {
                name: name.to_string(),
            })?;
        let out_port = midi_out
            .ports()
            .into_iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .ok_or_else(|| LibrarianError::PortNotFound {
                name: name.to_string(),
            })?;

        let port_name = midi_out.port_name(&out_port).map_err(transport_error)?;
        info!("Opening MIDI port '{}'", port_name);

        let (tx, rx) = mpsc::channel();
        let input = midi_in
            .connect(
                &in_port,
                "reface-dx-in",
                move |_stamp, bytes, _| {
                    // receiver gone means the channel is closing
                    let _ = tx.send(MidiMessage::from(bytes));
                },
                (),
            )
            .map_err(transport_error)?;
        let output = midi_out
            .connect(&out_port, "reface-dx-out")
            .map_err(transport_error)?;

        Ok(Self {
            _input: input,
            output,
            incoming: rx,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiChannel for MidirChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        debug!("-> {:?}", MidiMessage::from(bytes));
        self.output.send(bytes).map_err(transport_error)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<MidiMessage>> {
        match self.incoming.recv_timeout(timeout) {
            Ok(msg) => {
                debug!("<- {:?}", msg);
                Ok(Some(msg))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LibrarianError::Transport {
                reason: format!("input from '{}' disconnected", self.port_name),
            }),
        }
    }
}
