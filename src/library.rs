//! Voice files on disk
//!
//! A voice file is the raw patch image: `PATCH_SIZE` bytes in parameter
//! table order, no header, no checksum.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::PATCH_EXTENSION;
use crate::error::{LibrarianError, Result};
use crate::patch::{PatchImage, PATCH_SIZE};

/// A voice file found by [`list_patches`]
#[derive(Debug, Clone)]
pub struct PatchFileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Read a voice file
///
/// Files shorter than a voice are zero-padded; longer files are rejected.
pub fn read_patch_file(path: &Path) -> Result<PatchImage> {
    if !path.exists() {
        return Err(LibrarianError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|e| LibrarianError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes.len() < PATCH_SIZE {
        warn!(
            "{} holds {} bytes, padding to {}",
            path.display(),
            bytes.len(),
            PATCH_SIZE
        );
    }
    let patch = PatchImage::from_bytes_padded(&bytes)?;
    debug!("Read '{}' from {}", patch.voice_name(), path.display());
    Ok(patch)
}

/// Write a voice file, creating parent directories as needed
pub fn write_patch_file(path: &Path, patch: &PatchImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| LibrarianError::DirectoryCreateError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(path, patch.as_bytes()).map_err(|e| LibrarianError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Wrote file '{}'", path.display());
    Ok(())
}

/// File name for a storage identifier: `<identifier>.syx`
pub fn suggested_file_name(identifier: &str) -> String {
    format!("{}.{}", identifier, PATCH_EXTENSION)
}

/// First path of the form `dir/<identifier>.syx`, `dir/<identifier> (2).syx`, …
/// that does not exist yet
pub fn unused_patch_path(dir: &Path, identifier: &str) -> PathBuf {
    let candidate = dir.join(suggested_file_name(identifier));
    if !candidate.exists() {
        return candidate;
    }
    (2..)
        .map(|n| dir.join(suggested_file_name(&format!("{} ({})", identifier, n))))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

fn is_patch_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(PATCH_EXTENSION))
        .unwrap_or(false)
}

/// Voice files in `dir` and its immediate subdirectories, sorted by path
pub fn list_patches(dir: &Path) -> Result<Vec<PatchFileInfo>> {
    if !dir.exists() {
        return Err(LibrarianError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut patches = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
    {
        if !entry.file_type().is_file() || !is_patch_file(entry.path()) {
            continue;
        }
        let metadata = entry.metadata().ok();
        patches.push(PatchFileInfo {
            path: entry.path().to_path_buf(),
            size_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
            modified: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Local>::from),
        });
    }

    patches.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(patches)
}
