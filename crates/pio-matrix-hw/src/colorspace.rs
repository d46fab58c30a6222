//! Colorspace handling: framebuffer pixel layouts and gamma quantization.
//!
//! Incoming channels are 8 bits; the panel's binary-code modulation works on
//! gamma-corrected 10-bit intensities. The lookup table is an explicit,
//! immutable object built once and passed by reference into the encoder.

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use std::str::FromStr;

/// Corrected color depth in bits per channel.
pub const COLOR_DEPTH: usize = 10;

/// Maximum corrected intensity (`2^COLOR_DEPTH - 1`).
pub const MAX_INTENSITY: u16 = (1 << COLOR_DEPTH) - 1;

/// Gamma lookup table mapping 8-bit channel values to 10-bit corrected
/// intensities.
#[derive(Debug, Clone)]
pub struct GammaLut {
    table: [u16; 256],
}

impl GammaLut {
    /// Builds the table for the given gamma exponent.
    ///
    /// Every entry is floored at the raw input value so low intensities are
    /// never crushed to zero; 255 always maps to the full-scale 1023.
    pub fn new(exponent: f64) -> Self {
        let mut table = [0u16; 256];
        for (value, entry) in table.iter_mut().enumerate() {
            let corrected =
                (f64::from(MAX_INTENSITY) * (value as f64 / 255.0).powf(exponent)).round();
            *entry = (corrected as u16).max(value as u16);
        }
        Self { table }
    }

    /// Corrected 10-bit intensity for an 8-bit channel value.
    #[inline]
    pub fn quantize(&self, value: u8) -> u16 {
        self.table[value as usize]
    }
}

impl Default for GammaLut {
    /// The reference hardware calibration uses gamma 2.2.
    fn default() -> Self {
        Self::new(2.2)
    }
}

/// Packs three pre-clamped 10-bit channels into one scalar, red in the top
/// bits.
#[inline]
pub fn pack_rgb(r: u16, g: u16, b: u16) -> u32 {
    debug_assert!(r <= MAX_INTENSITY && g <= MAX_INTENSITY && b <= MAX_INTENSITY);
    (u32::from(r) << 20) | (u32::from(g) << 10) | u32::from(b)
}

/// Framebuffer pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colorspace {
    /// Four bytes per pixel: R, G, B, one pad byte.
    #[default]
    Rgb888,
    /// Three bytes per pixel: R, G, B.
    Rgb888Packed,
    /// Two bytes per pixel, RGB565 little-endian.
    Rgb565,
}

impl Colorspace {
    /// Bytes occupied by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Colorspace::Rgb888 => 4,
            Colorspace::Rgb888Packed => 3,
            Colorspace::Rgb565 => 2,
        }
    }

    /// Exact framebuffer byte length required for a geometry.
    pub fn expected_len(self, geometry: &Geometry) -> usize {
        geometry.width() * geometry.height() * self.bytes_per_pixel()
    }

    /// Reads pixel `index` from a framebuffer as 8-bit channels.
    ///
    /// The caller guarantees `fb` is exactly `expected_len` bytes; indices
    /// come from the geometry map and are always in range.
    #[inline]
    pub fn read_rgb(self, fb: &[u8], index: usize) -> (u8, u8, u8) {
        match self {
            Colorspace::Rgb888 => {
                let p = &fb[index * 4..index * 4 + 3];
                (p[0], p[1], p[2])
            }
            Colorspace::Rgb888Packed => {
                let p = &fb[index * 3..index * 3 + 3];
                (p[0], p[1], p[2])
            }
            Colorspace::Rgb565 => {
                let pixel = u16::from_le_bytes([fb[index * 2], fb[index * 2 + 1]]);
                rgb565_to_rgb888(pixel)
            }
        }
    }
}

impl FromStr for Colorspace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rgb888" => Ok(Colorspace::Rgb888),
            "rgb888-packed" | "rgb888_packed" => Ok(Colorspace::Rgb888Packed),
            "rgb565" => Ok(Colorspace::Rgb565),
            _ => Err(Error::InvalidColorspace(s.to_string())),
        }
    }
}

impl std::fmt::Display for Colorspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colorspace::Rgb888 => write!(f, "rgb888"),
            Colorspace::Rgb888Packed => write!(f, "rgb888-packed"),
            Colorspace::Rgb565 => write!(f, "rgb565"),
        }
    }
}

/// Expands RGB565 to RGB888 by bit replication.
#[inline]
fn rgb565_to_rgb888(pixel: u16) -> (u8, u8, u8) {
    let r = ((pixel >> 11) & 0x1F) as u8;
    let g = ((pixel >> 5) & 0x3F) as u8;
    let b = (pixel & 0x1F) as u8;
    ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;

    #[test]
    fn test_gamma_endpoints() {
        let lut = GammaLut::default();
        assert_eq!(lut.quantize(0), 0);
        assert_eq!(lut.quantize(255), MAX_INTENSITY);
    }

    #[test]
    fn test_gamma_monotonic() {
        for exponent in [1.0, 2.2, 2.8] {
            let lut = GammaLut::new(exponent);
            for value in 1..=255u8 {
                assert!(
                    lut.quantize(value) >= lut.quantize(value - 1),
                    "gamma {exponent} not monotonic at {value}"
                );
            }
        }
    }

    #[test]
    fn test_gamma_floor_preserves_low_values() {
        // With gamma 2.2 the curve alone would map small inputs to 0.
        let lut = GammaLut::default();
        for value in 1..=32u8 {
            assert!(lut.quantize(value) >= u16::from(value));
        }
    }

    #[test]
    fn test_gamma_identity_exponent() {
        let lut = GammaLut::new(1.0);
        assert_eq!(lut.quantize(128), (1023.0f64 * 128.0 / 255.0).round() as u16);
    }

    #[test]
    fn test_pack_rgb() {
        assert_eq!(pack_rgb(0, 0, 0), 0);
        assert_eq!(pack_rgb(1023, 0, 0), 1023 << 20);
        assert_eq!(pack_rgb(0, 1023, 0), 1023 << 10);
        assert_eq!(pack_rgb(0, 0, 1023), 1023);
        assert_eq!(
            pack_rgb(1023, 1023, 1023),
            (1023 << 20) | (1023 << 10) | 1023
        );
    }

    #[test]
    fn test_bytes_per_pixel_and_expected_len() {
        let g = Geometry::new(64, 32, 4, 10, false, Orientation::Normal).unwrap();
        assert_eq!(Colorspace::Rgb888.expected_len(&g), 64 * 32 * 4);
        assert_eq!(Colorspace::Rgb888Packed.expected_len(&g), 64 * 32 * 3);
        assert_eq!(Colorspace::Rgb565.expected_len(&g), 64 * 32 * 2);
    }

    #[test]
    fn test_read_rgb_layouts() {
        let fb888 = [10, 20, 30, 0, 40, 50, 60, 0];
        assert_eq!(Colorspace::Rgb888.read_rgb(&fb888, 1), (40, 50, 60));

        let fb_packed = [10, 20, 30, 40, 50, 60];
        assert_eq!(Colorspace::Rgb888Packed.read_rgb(&fb_packed, 1), (40, 50, 60));

        // Pure red in RGB565 is 0xF800.
        let fb565 = 0xF800u16.to_le_bytes();
        assert_eq!(Colorspace::Rgb565.read_rgb(&fb565, 0), (255, 0, 0));
        let fb565 = 0x07E0u16.to_le_bytes();
        assert_eq!(Colorspace::Rgb565.read_rgb(&fb565, 0), (0, 255, 0));
        let fb565 = 0x001Fu16.to_le_bytes();
        assert_eq!(Colorspace::Rgb565.read_rgb(&fb565, 0), (0, 0, 255));
    }

    #[test]
    fn test_colorspace_from_str() {
        assert_eq!("rgb888".parse::<Colorspace>().unwrap(), Colorspace::Rgb888);
        assert_eq!(
            "rgb888-packed".parse::<Colorspace>().unwrap(),
            Colorspace::Rgb888Packed
        );
        assert_eq!("RGB565".parse::<Colorspace>().unwrap(), Colorspace::Rgb565);
        assert!("cmyk".parse::<Colorspace>().is_err());
    }
}
