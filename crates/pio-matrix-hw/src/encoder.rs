//! BCM command-stream encoder.
//!
//! One encode pass turns a framebuffer snapshot into the command words for
//! one refresh of the whole panel. Brightness comes from binary-code
//! modulation: each bit-plane of the quantized color is displayed for a
//! duration proportional to its place value, realized through the relative
//! timing of the emitted words rather than software delay loops.
//!
//! The scan is pipelined the way HUB75 panels expect: while row N's pixel
//! bits are clocked into the shift registers, the address lines still select
//! the previously latched row, which stays lit. Only after blanking and
//! latching do the address lines advance. The `last_bit`/`shown_addr` state
//! below carries that one-iteration offset.

use crate::colorspace::{Colorspace, GammaLut, COLOR_DEPTH};
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::pinout::Pinout;
use crate::protocol::CommandStream;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Per-hardware-target timing calibration, in PIO clock cycles.
///
/// These depend on the PIO program revision and the panel's silicon, not on
/// the geometry; load them from a TOML calibration file for anything other
/// than the reference hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Cycles consumed per DATA payload word.
    #[serde(default = "default_data_overhead")]
    pub data_overhead: u32,

    /// Cycles consumed per DELAY count.
    #[serde(default = "default_clocks_per_delay")]
    pub clocks_per_delay: u32,

    /// Settle cycles after deasserting output enable.
    #[serde(default)]
    pub post_oe_delay: u32,

    /// Settle cycles after the latch pulse.
    #[serde(default)]
    pub post_latch_delay: u32,

    /// Settle cycles after changing the address lines.
    #[serde(default = "default_post_addr_delay")]
    pub post_addr_delay: u32,
}

fn default_data_overhead() -> u32 {
    2
}

fn default_clocks_per_delay() -> u32 {
    1
}

fn default_post_addr_delay() -> u32 {
    50
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            data_overhead: default_data_overhead(),
            clocks_per_delay: default_clocks_per_delay(),
            post_oe_delay: 0,
            post_latch_delay: 0,
            post_addr_delay: default_post_addr_delay(),
        }
    }
}

/// Encodes framebuffer snapshots into per-frame command streams.
pub struct Encoder {
    geometry: Geometry,
    colorspace: Colorspace,
    gamma: GammaLut,
    pinout: Pinout,
    timings: Timings,
}

impl Encoder {
    /// Creates an encoder for one panel configuration.
    pub fn new(
        geometry: Geometry,
        colorspace: Colorspace,
        gamma: GammaLut,
        pinout: Pinout,
        timings: Timings,
    ) -> Result<Self> {
        if timings.data_overhead == 0 || timings.clocks_per_delay == 0 {
            return Err(Error::InvalidTimings(
                "data_overhead and clocks_per_delay must be nonzero".to_string(),
            ));
        }
        Ok(Self {
            geometry,
            colorspace,
            gamma,
            pinout,
            timings,
        })
    }

    /// The geometry this encoder was built for.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The framebuffer layout this encoder reads.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Exact framebuffer byte length `encode` accepts.
    pub fn framebuffer_len(&self) -> usize {
        self.colorspace.expected_len(&self.geometry)
    }

    /// Encodes one framebuffer snapshot into a command stream.
    ///
    /// The framebuffer is borrowed read-only for the duration of the pass;
    /// concurrent writes by the producer cause at worst tearing, never a
    /// malformed stream. Fails if the buffer length is wrong or the
    /// geometry/timing combination demands a delay or run the command
    /// encoding cannot express.
    pub fn encode(&self, framebuffer: &[u8]) -> Result<Vec<u32>> {
        let expected = self.framebuffer_len();
        if framebuffer.len() != expected {
            return Err(Error::FramebufferSize {
                expected,
                actual: framebuffer.len(),
            });
        }

        let pixels_across = self.geometry.pixels_across();
        let scan_rows = self.geometry.scan_rows();
        let n_planes = self.geometry.n_planes();

        let mut stream = CommandStream::with_capacity(self.frame_word_count());
        // The first iteration has nothing on the panel worth holding, so it
        // gets the minimal one-word duration.
        let mut last_bit = 0usize;
        // The first blank/latch/address sequence must still address a valid
        // row; start from the last one so the first change is a real change.
        let mut shown_addr = scan_rows - 1;

        for addr in 0..scan_rows {
            for bit in (0..n_planes).rev() {
                let desired_duration = 1u64 << last_bit;
                last_bit = bit;

                // Illuminate the row whose data is already latched.
                let shown_bits = self.pinout.addr_bits(shown_addr);
                let shift = COLOR_DEPTH - n_planes + bit;

                stream.begin_data(2 * pixels_across)?;
                for column in 0..pixels_across {
                    let (upper, lower) = self.geometry.pixel_pair(addr, column);
                    let word = self.pinout.data_word(
                        shown_bits,
                        self.plane_bits(framebuffer, upper, shift),
                        self.plane_bits(framebuffer, lower, shift),
                        (column as u64) < desired_duration,
                    );
                    // Rising-edge clock: every column is emitted twice.
                    stream.push(word);
                    stream.push(word | self.pinout.clk_mask());
                }

                // More ON time demanded than one row scan provides: cover
                // the remainder with an explicit delay. Rounded up so a
                // slow delay clock never shortens the demanded duration.
                if desired_duration > pixels_across as u64 {
                    let cycles = ((desired_duration - pixels_across as u64)
                        * u64::from(self.timings.data_overhead))
                    .div_ceil(u64::from(self.timings.clocks_per_delay));
                    stream.delay(cycles)?;
                }

                // Blank, latch the shifted row, then select it.
                stream.data1(self.pinout.idle_word(shown_bits))?;
                stream.delay(u64::from(self.timings.post_oe_delay))?;
                stream.data1(self.pinout.idle_word(shown_bits) | self.pinout.lat_mask())?;
                stream.delay(u64::from(self.timings.post_latch_delay))?;
                stream.data1(self.pinout.idle_word(self.pinout.addr_bits(addr)))?;
                if shown_addr != addr {
                    stream.delay(u64::from(self.timings.post_addr_delay))?;
                    shown_addr = addr;
                }
            }
        }

        let words = stream.finish();
        trace!(words = words.len(), "encoded frame");
        Ok(words)
    }

    /// Extracts one bit-plane of a pixel's three channels.
    #[inline]
    fn plane_bits(&self, framebuffer: &[u8], index: usize, shift: usize) -> (bool, bool, bool) {
        let (r, g, b) = self.colorspace.read_rgb(framebuffer, index);
        (
            self.gamma.quantize(r) >> shift & 1 != 0,
            self.gamma.quantize(g) >> shift & 1 != 0,
            self.gamma.quantize(b) >> shift & 1 != 0,
        )
    }

    /// Exact number of command words `encode` emits for any framebuffer.
    ///
    /// The stream length is a function of the geometry and timings alone:
    /// `scan_rows * n_planes` iterations, each with one pixel run
    /// (`1 + 2 * pixels_across` words) and three one-word control runs,
    /// plus the data-dependent delay words.
    pub fn frame_word_count(&self) -> usize {
        let pixels_across = self.geometry.pixels_across();
        let scan_rows = self.geometry.scan_rows();
        let n_planes = self.geometry.n_planes();

        let mut count = 0usize;
        let mut last_bit = 0usize;
        for _ in 0..scan_rows {
            for bit in (0..n_planes).rev() {
                let desired_duration = 1u64 << last_bit;
                last_bit = bit;

                count += 1 + 2 * pixels_across; // pixel run
                if desired_duration > pixels_across as u64 {
                    count += 1; // overflow delay
                }
                count += 2; // blank run
                if self.timings.post_oe_delay > 0 {
                    count += 1;
                }
                count += 2; // latch run
                if self.timings.post_latch_delay > 0 {
                    count += 1;
                }
                count += 2; // address run
                // The address only changes on each scan row's first
                // iteration, and never at all on a single-row geometry.
                if bit == n_planes - 1 && scan_rows > 1 && self.timings.post_addr_delay > 0 {
                    count += 1;
                }
            }
        }
        count
    }
}
