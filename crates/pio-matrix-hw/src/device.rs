//! PIO device communication via the kernel character device.
//!
//! The PIO driver exposes a write-only character device; command words go
//! down as little-endian bytes. The driver's staging buffer is limited, so
//! frames are split into bounded chunks and each chunk is pushed with a
//! blocking write. Short writes never happen on the character device; any
//! I/O error means the state machine's word alignment is unknown and the
//! session is dead.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default chunk size in words (64 KiB of wire bytes).
pub const DEFAULT_CHUNK_WORDS: usize = 16 * 1024;

/// A sink that accepts encoded command words for one frame at a time.
///
/// The device node is the real implementation; tests and offline tools
/// substitute their own.
pub trait CommandSink {
    fn transfer(&mut self, words: &[u32]) -> Result<()>;
}

/// Writes `words` to `out` as little-endian bytes, at most `chunk_words`
/// words per write.
pub fn transfer_chunked<W: Write>(out: &mut W, words: &[u32], chunk_words: usize) -> Result<()> {
    assert!(chunk_words > 0, "zero chunk size");
    for chunk in words.chunks(chunk_words) {
        let mut bytes = Vec::with_capacity(chunk.len() * 4);
        for &word in chunk {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        out.write_all(&bytes)?;
    }
    Ok(())
}

/// Handle to an open PIO character device.
#[derive(Debug)]
pub struct PioDevice {
    file: File,
    path: PathBuf,
    chunk_words: usize,
}

impl PioDevice {
    /// Opens the device node with the default chunk size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_chunked(path, DEFAULT_CHUNK_WORDS)
    }

    /// Opens the device node with an explicit chunk size.
    pub fn open_chunked<P: AsRef<Path>>(path: P, chunk_words: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    Error::DeviceNotFound(path.display().to_string())
                }
                _ => Error::Io(e),
            })?;

        info!("PIO device opened at {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_words,
        })
    }

    /// The device node path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSink for PioDevice {
    fn transfer(&mut self, words: &[u32]) -> Result<()> {
        transfer_chunked(&mut self.file, words, self.chunk_words)?;
        debug!(words = words.len(), "frame transferred");
        Ok(())
    }
}
