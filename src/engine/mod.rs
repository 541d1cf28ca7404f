//! SysEx parameter-transfer engine
//!
//! Identity handshake plus the download, upload and name transfers, all
//! driven through a [`Session`] that holds the channel for its lifetime.

pub mod handshake;
pub mod transfer;

pub use handshake::{verify_identity, IdentityStatus};
pub use transfer::{
    CancelToken, Download, NameReport, Session, TransferFault, TransferOutcome, TransferReport,
    TransferSettings, DEFAULT_IDENTITY_TIMEOUT, DEFAULT_PARAMETER_TIMEOUT,
};
