//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::config::LibrarianConfig;
use crate::engine::{Session, TransferOutcome, TransferReport, TransferSettings};
use crate::error::{LibrarianError, Result};
use crate::library::{list_patches, read_patch_file, unused_patch_path, write_patch_file};
use crate::patch::{ParameterTable, PatchImage};
use crate::transport::{MidiChannel, SimulatedReface};

/// Name the simulated device's voice starts with
const SIMULATED_VOICE_NAME: &[u8; 10] = b"Dyna Choir";

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: LibrarianConfig,
    pub simulate: bool,
}

impl CommandContext {
    pub fn new(config: LibrarianConfig, simulate: bool) -> Self {
        Self { config, simulate }
    }

    /// Open the configured MIDI port, or the simulated device
    pub fn open_channel(&self) -> Result<Box<dyn MidiChannel>> {
        if self.simulate {
            info!("Using simulated Reface DX");
            let mut voice = PatchImage::zeroed();
            voice.set_name_bytes(SIMULATED_VOICE_NAME);
            return Ok(Box::new(SimulatedReface::with_voice(voice)));
        }
        open_port(&self.config.port)
    }
}

#[cfg(feature = "midir")]
fn open_port(name: &str) -> Result<Box<dyn MidiChannel>> {
    Ok(Box::new(crate::transport::MidirChannel::open(name)?))
}

#[cfg(not(feature = "midir"))]
fn open_port(name: &str) -> Result<Box<dyn MidiChannel>> {
    Err(LibrarianError::TransportUnavailable {
        reason: format!("cannot open '{}': built without MIDI port support", name),
    })
}

fn print_report(operation: &str, report: &TransferReport) {
    match report.outcome() {
        TransferOutcome::Complete => {
            println!("{} complete ({} parameters).", operation, report.steps())
        }
        outcome => {
            println!(
                "{} {} (indices {:?}).",
                operation,
                outcome,
                report.missing_indices()
            );
            for fault in report.faults() {
                println!("  - {}", fault);
            }
        }
    }
}

fn require_complete(report: &TransferReport) -> Result<()> {
    match report.outcome() {
        TransferOutcome::Complete => Ok(()),
        TransferOutcome::Incomplete { missing } => {
            Err(LibrarianError::IncompleteTransfer { missing })
        }
    }
}

/// Check the device identity.
pub fn identify(ctx: &CommandContext) -> Result<()> {
    let mut channel = ctx.open_channel()?;
    let status = Session::new(&mut channel, ctx.config.transfer_settings()).verify_identity()?;

    println!("{}", status);
    status.into_result()
}

/// Download the current voice to a file.
///
/// An incomplete download is only written with `keep_partial`.
pub fn download(
    ctx: &CommandContext,
    output: Option<&Path>,
    dir: Option<&Path>,
    keep_partial: bool,
) -> Result<PathBuf> {
    let mut channel = ctx.open_channel()?;
    let download = Session::new(&mut channel, ctx.config.transfer_settings()).download_patch()?;

    print_report("Download", &download.report);
    if !download.report.is_complete() {
        if keep_partial {
            warn!("Saving incomplete voice");
        } else {
            println!("File not written.");
            require_complete(&download.report)?;
        }
    }

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = dir.unwrap_or(ctx.config.patch_dir.as_path());
            unused_patch_path(dir, &download.suggested_identifier())
        }
    };
    write_patch_file(&path, &download.patch)?;

    println!("Voice '{}' saved to {}", download.voice_name(), path.display());
    Ok(path)
}

/// Upload a voice file, optionally reading it back to compare.
pub fn upload(ctx: &CommandContext, file: &Path, verify: bool) -> Result<()> {
    let patch = read_patch_file(file)?;
    let mut channel = ctx.open_channel()?;

    println!("Sending '{}' from {}", patch.voice_name(), file.display());
    upload_over(&mut channel, ctx.config.transfer_settings(), &patch, verify)
}

fn upload_over<C: MidiChannel + ?Sized>(
    channel: &mut C,
    settings: TransferSettings,
    patch: &PatchImage,
    verify: bool,
) -> Result<()> {
    let mut session = Session::new(channel, settings);

    let report = session.upload_patch(patch)?;
    print_report("Upload", &report);
    require_complete(&report)?;

    if !verify {
        return Ok(());
    }

    let readback = session.download_patch()?;
    print_report("Verify", &readback.report);
    require_complete(&readback.report)?;

    let indices = readback.patch.differing_indices(patch);
    if !indices.is_empty() {
        println!("Verify failed: parameters {:?} differ", indices);
        return Err(LibrarianError::VerifyMismatch { indices });
    }

    println!("Verified: device voice matches ({})", patch.fingerprint());
    Ok(())
}

/// Print the current voice name.
pub fn get_name(ctx: &CommandContext) -> Result<()> {
    let mut channel = ctx.open_channel()?;
    let name = Session::new(&mut channel, ctx.config.transfer_settings()).get_name()?;

    print_report("Get name", &name.report);
    println!("{}", name.name);
    require_complete(&name.report)
}

/// Rename the current voice.
pub fn set_name(ctx: &CommandContext, name: &str) -> Result<()> {
    if name.chars().count() > 10 {
        warn!("Name '{}' is longer than 10 characters and will be truncated", name);
    }

    let mut channel = ctx.open_channel()?;
    let report = Session::new(&mut channel, ctx.config.transfer_settings()).set_name(name)?;

    print_report("Set name", &report);
    require_complete(&report)
}

/// List voice files.
pub fn list(ctx: &CommandContext, dir: Option<&Path>) -> Result<()> {
    let dir = dir.unwrap_or(ctx.config.patch_dir.as_path());
    let patches = list_patches(dir)?;

    if patches.is_empty() {
        println!("No voice files in {}", dir.display());
        return Ok(());
    }

    for info in patches {
        let modified = info
            .modified
            .map(|t| t.format("%H:%M  %d/%m/%y").to_string())
            .unwrap_or_default();
        let name = match read_patch_file(&info.path) {
            Ok(patch) => patch.voice_name().to_string(),
            Err(_) => "(unreadable)".to_string(),
        };
        let relative = info.path.strip_prefix(dir).unwrap_or(info.path.as_path());
        println!("{:<40} {:<12} {}", relative.display(), name, modified);
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct BlockDump {
    block: String,
    values: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    file: PathBuf,
    name: String,
    fingerprint: String,
    blocks: Vec<BlockDump>,
}

fn inspect_report(file: &Path, patch: &PatchImage) -> InspectReport {
    let blocks = ParameterTable::new()
        .blocks()
        .into_iter()
        .map(|(block, range)| BlockDump {
            block: block.to_string(),
            values: patch.as_bytes()[range].to_vec(),
        })
        .collect();

    InspectReport {
        file: file.to_path_buf(),
        name: patch.voice_name().to_string(),
        fingerprint: patch.fingerprint(),
        blocks,
    }
}

/// Show the contents of a voice file.
pub fn inspect(file: &Path, json: bool) -> Result<()> {
    let patch = read_patch_file(file)?;
    let report = inspect_report(file, &patch);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File:        {}", report.file.display());
    println!("Name:        {}", report.name);
    println!("Fingerprint: {}", report.fingerprint);
    for block in &report.blocks {
        let values: Vec<String> = block.values.iter().map(|v| format!("{:3}", v)).collect();
        println!("{:<11} {}", format!("{}:", block.block), values.join(" "));
    }

    Ok(())
}

/// List MIDI ports.
#[cfg(feature = "midir")]
pub fn ports() -> Result<()> {
    let ports = crate::transport::list_ports()?;

    println!("Inputs:");
    for name in &ports.inputs {
        println!("  {}", name);
    }
    println!("Outputs:");
    for name in &ports.outputs {
        println!("  {}", name);
    }

    Ok(())
}

/// List MIDI ports.
#[cfg(not(feature = "midir"))]
pub fn ports() -> Result<()> {
    Err(LibrarianError::TransportUnavailable {
        reason: "built without MIDI port support".to_string(),
    })
}
