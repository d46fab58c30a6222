//! Top-level frame pump tying the encoder to a command sink.

use crate::device::CommandSink;
use crate::encoder::Encoder;
use crate::error::Result;
use tracing::debug;

/// A matrix ready to display frames: an encoder bound to a sink.
pub struct PioMatter<S: CommandSink> {
    encoder: Encoder,
    sink: S,
    frames: u64,
}

impl<S: CommandSink> PioMatter<S> {
    pub fn new(encoder: Encoder, sink: S) -> Self {
        Self {
            encoder,
            sink,
            frames: 0,
        }
    }

    /// The encoder this matrix displays through.
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Frames shown since construction.
    pub fn frames_shown(&self) -> u64 {
        self.frames
    }

    /// Encodes one framebuffer snapshot and pushes it to the sink.
    ///
    /// The caller may keep mutating the framebuffer from another thread;
    /// the worst outcome is a torn frame on the panel.
    pub fn show(&mut self, framebuffer: &[u8]) -> Result<()> {
        let words = self.encoder.encode(framebuffer)?;
        self.sink.transfer(&words)?;
        self.frames += 1;
        debug!(frame = self.frames, words = words.len(), "frame shown");
        Ok(())
    }
}
