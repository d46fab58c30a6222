//! Command-word wire format consumed by the PIO program.
//!
//! The stream is a flat sequence of 32-bit words classified by the top bit:
//! - Bit 31 set: DATA header. The low 31 bits hold the run length minus one;
//!   exactly that many pin-state payload words follow before the next header
//!   or end of stream.
//! - Bit 31 clear: DELAY. The low bits hold the cycle count minus one; the
//!   PIO program's delay counter is 20 bits wide.
//!
//! A header whose declared run length is not exactly fulfilled desynchronizes
//! the state machine, so run-length accounting is enforced here: payload
//! words can only be pushed while a run is open, and a stream cannot be
//! finished with a run still open.

use crate::error::{Error, Result};

/// Top bit marking a DATA header.
pub const DATA_HEADER_FLAG: u32 = 1 << 31;

/// Largest expressible DATA run, in payload words (length − 1 must fit the
/// 31-bit field).
pub const MAX_RUN_WORDS: usize = 1 << 31;

/// Largest expressible DELAY, in cycles (count − 1 must fit the 20-bit
/// delay counter).
pub const MAX_DELAY_CYCLES: u64 = 1 << 20;

/// Builder for one frame's command stream.
///
/// Enforces the run-length invariant: `begin_data`/`delay`/`finish` are only
/// legal between runs, `push` only inside one. Violations are programmer
/// errors and panic; values the encoding cannot represent are configuration
/// errors and return `Err`.
#[derive(Debug, Default)]
pub struct CommandStream {
    words: Vec<u32>,
    open_run: usize,
}

impl CommandStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(words: usize) -> Self {
        Self {
            words: Vec::with_capacity(words),
            open_run: 0,
        }
    }

    /// Opens a DATA run of exactly `n` payload words.
    pub fn begin_data(&mut self, n: usize) -> Result<()> {
        assert_eq!(self.open_run, 0, "previous DATA run not fulfilled");
        assert!(n > 0, "empty DATA run");
        if n > MAX_RUN_WORDS {
            return Err(Error::RunTooLong {
                words: n,
                max: MAX_RUN_WORDS,
            });
        }
        self.words.push(DATA_HEADER_FLAG | (n as u32 - 1));
        self.open_run = n;
        Ok(())
    }

    /// Pushes one payload word into the open run.
    pub fn push(&mut self, word: u32) {
        assert!(self.open_run > 0, "payload word outside a DATA run");
        debug_assert_eq!(word & DATA_HEADER_FLAG, 0, "pin-state word sets the header bit");
        self.open_run -= 1;
        self.words.push(word);
    }

    /// Emits a single-word DATA run.
    pub fn data1(&mut self, word: u32) -> Result<()> {
        self.begin_data(1)?;
        self.push(word);
        Ok(())
    }

    /// Emits a DELAY of `cycles`. Zero-cycle delays are dropped.
    pub fn delay(&mut self, cycles: u64) -> Result<()> {
        assert_eq!(self.open_run, 0, "DELAY inside a DATA run");
        if cycles == 0 {
            return Ok(());
        }
        if cycles > MAX_DELAY_CYCLES {
            return Err(Error::DelayTooLong {
                cycles,
                max: MAX_DELAY_CYCLES,
            });
        }
        self.words.push(cycles as u32 - 1);
        Ok(())
    }

    /// Words emitted so far, including headers.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Closes the stream and returns the words.
    pub fn finish(self) -> Vec<u32> {
        assert_eq!(self.open_run, 0, "DATA run not fulfilled at end of stream");
        self.words
    }
}

/// Structural accounting for a command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Number of DATA runs.
    pub data_runs: usize,
    /// Total payload words across all runs.
    pub payload_words: usize,
    /// Number of DELAY words.
    pub delays: usize,
}

/// Walks a stream and checks that every DATA header's declared run length is
/// exactly matched before the next header or end of stream.
///
/// Used for offline verification of dumps and by tests; the encoder never
/// produces a stream that fails this.
pub fn validate_stream(words: &[u32]) -> Result<StreamStats> {
    let mut stats = StreamStats::default();
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        if word & DATA_HEADER_FLAG != 0 {
            let run = (word & !DATA_HEADER_FLAG) as usize + 1;
            if i + run >= words.len() {
                return Err(Error::MalformedStream(format!(
                    "DATA run of {run} words at offset {i} extends past end of stream"
                )));
            }
            for offset in 1..=run {
                if words[i + offset] & DATA_HEADER_FLAG != 0 {
                    return Err(Error::MalformedStream(format!(
                        "header bit set in payload word at offset {}",
                        i + offset
                    )));
                }
            }
            stats.data_runs += 1;
            stats.payload_words += run;
            i += run + 1;
        } else {
            let cycles = u64::from(word) + 1;
            if cycles > MAX_DELAY_CYCLES {
                return Err(Error::MalformedStream(format!(
                    "DELAY of {cycles} cycles at offset {i} exceeds the encoding limit"
                )));
            }
            stats.delays += 1;
            i += 1;
        }
    }
    Ok(stats)
}
