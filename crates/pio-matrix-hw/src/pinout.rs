//! Pin-to-GPIO assignment tables and payload-word assembly.
//!
//! Every payload word in a DATA run is a full GPIO pin-state snapshot: six
//! color bits for the row pair being shifted, the address lines selecting
//! the row pair being displayed, and the OE/CLK/LAT control lines. The pin
//! numbers are board wiring facts, shipped as named constructors.

/// GPIO bit positions for one HUB75 wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pinout {
    /// R, G, B pins for the upper-half pixel.
    rgb0: [u8; 3],
    /// R, G, B pins for the lower-half pixel.
    rgb1: [u8; 3],
    /// Row-address line pins, least significant first. Panels with fewer
    /// address lines simply never set the upper entries.
    addr: [u8; 5],
    /// Output enable. Active low on all known boards.
    oe: u8,
    /// Shift clock, rising edge.
    clk: u8,
    /// Latch, rising edge.
    lat: u8,
}

impl Pinout {
    /// The Adafruit RGB Matrix Bonnet wiring.
    pub const fn adafruit_matrix_bonnet() -> Self {
        Self {
            rgb0: [5, 13, 6],
            rgb1: [12, 16, 23],
            addr: [22, 26, 27, 20, 24],
            oe: 4,
            clk: 17,
            lat: 21,
        }
    }

    /// Address-line bits for a row address.
    #[inline]
    pub fn addr_bits(&self, addr: usize) -> u32 {
        let mut bits = 0u32;
        for (line, &pin) in self.addr.iter().enumerate() {
            if addr & (1 << line) != 0 {
                bits |= 1 << pin;
            }
        }
        bits
    }

    /// Pin-state word for one clocked column.
    ///
    /// `active` asserts output enable, illuminating the row currently
    /// selected by `addr_bits` while this word shifts in.
    #[inline]
    pub fn data_word(
        &self,
        addr_bits: u32,
        rgb0: (bool, bool, bool),
        rgb1: (bool, bool, bool),
        active: bool,
    ) -> u32 {
        let mut word = addr_bits;
        if !active {
            word |= 1 << self.oe;
        }
        let (r0, g0, b0) = rgb0;
        let (r1, g1, b1) = rgb1;
        if r0 {
            word |= 1 << self.rgb0[0];
        }
        if g0 {
            word |= 1 << self.rgb0[1];
        }
        if b0 {
            word |= 1 << self.rgb0[2];
        }
        if r1 {
            word |= 1 << self.rgb1[0];
        }
        if g1 {
            word |= 1 << self.rgb1[1];
        }
        if b1 {
            word |= 1 << self.rgb1[2];
        }
        word
    }

    /// Pin-state word with output disabled and no color bits.
    #[inline]
    pub fn idle_word(&self, addr_bits: u32) -> u32 {
        addr_bits | (1 << self.oe)
    }

    /// Shift-clock bit mask.
    #[inline]
    pub fn clk_mask(&self) -> u32 {
        1 << self.clk
    }

    /// Latch bit mask.
    #[inline]
    pub fn lat_mask(&self) -> u32 {
        1 << self.lat
    }
}

impl Default for Pinout {
    fn default() -> Self {
        Self::adafruit_matrix_bonnet()
    }
}
