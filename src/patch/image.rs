//! Patch image - one voice as a flat byte buffer
//!
//! Byte `i` holds the value of the parameter at table index `i`.

use sha2::{Digest, Sha256};

use super::name::VoiceName;
use super::table::{NAME_LEN, NAME_RANGE, PATCH_SIZE};
use crate::error::{LibrarianError, Result};
use crate::sysex::is_data_byte;

/// One Reface DX voice, index-aligned with the parameter table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchImage {
    bytes: [u8; PATCH_SIZE],
}

impl Default for PatchImage {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl PatchImage {
    /// Zero-initialised scratch image
    pub fn zeroed() -> Self {
        Self {
            bytes: [0; PATCH_SIZE],
        }
    }

    /// Build an image from exactly `PATCH_SIZE` 7-bit values
    ///
    /// # Errors
    /// * `MalformedPatch` - wrong length, or a byte with the high bit set
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PATCH_SIZE {
            return Err(LibrarianError::MalformedPatch {
                reason: format!("expected {} bytes, got {}", PATCH_SIZE, bytes.len()),
            });
        }
        Self::check_data_bytes(bytes)?;

        let mut image = Self::zeroed();
        image.bytes.copy_from_slice(bytes);
        Ok(image)
    }

    /// Build an image from a possibly short source, zero-padding the tail
    ///
    /// Used when loading voice files written by tools that truncate
    /// trailing zeros. Longer sources are still rejected.
    pub fn from_bytes_padded(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > PATCH_SIZE {
            return Err(LibrarianError::MalformedPatch {
                reason: format!(
                    "expected at most {} bytes, got {}",
                    PATCH_SIZE,
                    bytes.len()
                ),
            });
        }
        Self::check_data_bytes(bytes)?;

        let mut image = Self::zeroed();
        image.bytes[..bytes.len()].copy_from_slice(bytes);
        Ok(image)
    }

    fn check_data_bytes(bytes: &[u8]) -> Result<()> {
        match bytes.iter().position(|b| !is_data_byte(*b)) {
            Some(index) => Err(LibrarianError::MalformedPatch {
                reason: format!(
                    "byte {} is 0x{:02X}, SysEx data bytes must be below 0x80",
                    index, bytes[index]
                ),
            }),
            None => Ok(()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Store a value at a table index
    ///
    /// # Panics
    /// If `index` is not below `PATCH_SIZE`.
    pub fn set(&mut self, index: usize, value: u8) {
        self.bytes[index] = value;
    }

    pub fn name_bytes(&self) -> &[u8] {
        &self.bytes[NAME_RANGE]
    }

    pub fn set_name_bytes(&mut self, name: &[u8; NAME_LEN]) {
        self.bytes[NAME_RANGE].copy_from_slice(name);
    }

    pub fn voice_name(&self) -> VoiceName {
        VoiceName::from_bytes(self.name_bytes())
    }

    /// Table indices whose values differ from `other`
    pub fn differing_indices(&self, other: &PatchImage) -> Vec<usize> {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Short content hash for telling voices apart
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl AsRef<[u8]> for PatchImage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for PatchImage {
    type Error = LibrarianError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
