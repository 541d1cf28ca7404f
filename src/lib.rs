//! Reface DX - SysEx patch librarian for the Yamaha Reface DX
//!
//! The Reface DX has no bulk dump. A voice is read and written one parameter
//! at a time with Yamaha parameter-request and parameter-change SysEx
//! messages, after an identity handshake confirms the device.
//!
//! # Architecture
//!
//! - `patch`: the 133-entry parameter address table and the voice image
//!   indexed by it
//! - `device`: Reface DX message builders and reply parsing
//! - `transport`: the [`transport::MidiChannel`] boundary, a simulated
//!   device, and real ports behind the `midir` feature
//! - `engine`: handshake and lockstep parameter transfers
//! - `library`: voice files on disk

pub mod cli;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod library;
pub mod patch;
pub mod sysex;
pub mod transport;

pub use engine::{CancelToken, Session, TransferOutcome, TransferReport, TransferSettings};
pub use error::{LibrarianError, Result};
pub use patch::{ParameterTable, PatchImage, VoiceName};
pub use transport::{MidiChannel, SimulatedReface};
