//! Error handling for the Reface DX librarian
//!
//! Fatal failures only. Per-parameter misses during a transfer are not
//! errors; they are collected as [`crate::engine::TransferFault`]s.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for librarian operations
pub type Result<T> = std::result::Result<T, LibrarianError>;

/// Main error type for librarian operations
#[derive(Error, Debug)]
pub enum LibrarianError {
    // Handshake Errors
    #[error("No response to identity request")]
    NoResponse,

    #[error("Device is not a Reface DX (identity reply: {})", hex_bytes(.received))]
    DeviceMismatch { received: Vec<u8> },

    // Patch Errors
    #[error("Malformed patch: {reason}")]
    MalformedPatch { reason: String },

    // Transfer Errors
    #[error("Transfer cancelled")]
    Cancelled,

    #[error("Transfer incomplete: {missing} parameters missing")]
    IncompleteTransfer { missing: usize },

    #[error("Device voice differs from the uploaded voice at parameters {indices:?}")]
    VerifyMismatch { indices: Vec<usize> },

    // Transport Errors
    #[error("MIDI port not found: {name}")]
    PortNotFound { name: String },

    #[error("MIDI transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    #[error("MIDI transport error: {reason}")]
    Transport { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration Errors
    #[error("Invalid configuration in {path}: {reason}")]
    ConfigError { path: PathBuf, reason: String },

    #[error("Invalid argument {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibrarianError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LibrarianError::NoResponse => "NO_RESPONSE",
            LibrarianError::DeviceMismatch { .. } => "DEVICE_MISMATCH",
            LibrarianError::MalformedPatch { .. } => "MALFORMED_PATCH",
            LibrarianError::Cancelled => "CANCELLED",
            LibrarianError::IncompleteTransfer { .. } => "INCOMPLETE_TRANSFER",
            LibrarianError::VerifyMismatch { .. } => "VERIFY_MISMATCH",
            LibrarianError::PortNotFound { .. } => "PORT_NOT_FOUND",
            LibrarianError::TransportUnavailable { .. } => "TRANSPORT_UNAVAILABLE",
            LibrarianError::Transport { .. } => "TRANSPORT_ERROR",
            LibrarianError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LibrarianError::FileReadError { .. } => "FILE_READ_ERROR",
            LibrarianError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            LibrarianError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            LibrarianError::ConfigError { .. } => "CONFIG_ERROR",
            LibrarianError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            LibrarianError::Io(_) => "IO_ERROR",
            LibrarianError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if retrying the whole operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LibrarianError::NoResponse
                | LibrarianError::Cancelled
                | LibrarianError::IncompleteTransfer { .. }
                | LibrarianError::VerifyMismatch { .. }
                | LibrarianError::PortNotFound { .. }
                | LibrarianError::Transport { .. }
                | LibrarianError::FileWriteError { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LibrarianError::NoResponse => vec![
                "Check the USB cable and that the Reface DX is powered on",
                "Make sure the selected port is the Reface DX and not another device",
                "Increase the timeout with --timeout-ms",
            ],
            LibrarianError::DeviceMismatch { .. } => vec![
                "The connected device is not a Reface DX",
                "Select a different port with --port",
            ],
            LibrarianError::MalformedPatch { .. } => vec![
                "The file is not a Reface DX voice file",
                "Voice files are exactly 133 bytes with every byte below 0x80",
            ],
            LibrarianError::IncompleteTransfer { .. } => vec![
                "Some parameters were not answered; run the transfer again",
                "Increase the timeout with --timeout-ms",
                "Use --keep-partial to save an incomplete download anyway",
            ],
            LibrarianError::VerifyMismatch { .. } => vec![
                "Upload the voice again; a parameter change may have been dropped",
                "Check that nothing else is editing the voice on the device",
            ],
            LibrarianError::InvalidArgument { .. } => vec![
                "Run with --help to see valid values",
            ],
            LibrarianError::PortNotFound { .. } => vec![
                "Run 'reface-dx-cli ports' to list available MIDI ports",
                "Port names are matched by substring, e.g. --port reface",
            ],
            LibrarianError::TransportUnavailable { .. } => vec![
                "Rebuild with '--features midir' to talk to real MIDI ports",
                "Use --simulate to run against the built-in simulated device",
            ],
            LibrarianError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Run 'reface-dx-cli list' to see voice files in the patch directory",
            ],
            _ => vec![],
        }
    }
}

/// Format bytes as space separated upper-case hex
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
