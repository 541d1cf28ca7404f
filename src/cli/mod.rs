//! CLI Module
//!
//! Command-line interface for the Reface DX librarian.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reface DX Librarian - save and restore Yamaha Reface DX voices over MIDI SysEx
#[derive(Parser, Debug)]
#[command(name = "reface-dx-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Substring of the MIDI port name (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Per-parameter timeout in milliseconds (overrides config)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Talk to a built-in simulated Reface DX instead of a MIDI port
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the connected device is a Reface DX
    #[command(name = "identify")]
    Identify,

    /// Download the current voice and save it as a .syx file
    #[command(name = "download")]
    Download {
        /// Output file (default: <voice name>.syx in the patch directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the default file name (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Save the voice even if some parameters were not received
        #[arg(long)]
        keep_partial: bool,
    },

    /// Upload a .syx voice file to the device
    #[command(name = "upload")]
    Upload {
        /// Voice file to send
        file: PathBuf,

        /// Download the voice again afterwards and compare
        #[arg(long)]
        verify: bool,
    },

    /// Read the name of the current voice
    #[command(name = "get-name")]
    GetName,

    /// Rename the current voice (10 characters, padded or truncated)
    #[command(name = "set-name")]
    SetName {
        /// New voice name
        name: String,
    },

    /// List voice files in the patch directory and one level below
    #[command(name = "list")]
    List {
        /// Directory to list (overrides config)
        dir: Option<PathBuf>,
    },

    /// Show the contents of a voice file
    #[command(name = "inspect")]
    Inspect {
        /// Voice file to read
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available MIDI ports
    #[command(name = "ports")]
    Ports,
}
