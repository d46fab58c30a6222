//! Matrix geometry: mapping hardware scan order to framebuffer indices.
//!
//! A HUB75 chain is scanned as row pairs: for each of the `2^n_addr_lines`
//! row addresses the hardware clocks `pixels_across` pixel pairs through the
//! shift registers, lighting one row from the upper half and one from the
//! lower half of every physical panel at the same time. Panels stacked
//! vertically fold into the same shift chain, which is why a taller display
//! grows `pixels_across` rather than the address count.
//!
//! The geometry precomputes that scan order once: `map` holds, for every
//! scan position, the framebuffer index to read, two entries (upper then
//! lower half) per clocked column.

use crate::error::{Error, Result};
use crate::orientation::Orientation;
use tracing::debug;

/// Immutable scan-order geometry for one panel-chain configuration.
///
/// Built once from the physical wiring parameters and shared read-only by
/// every encoding pass. Rebuild only if the wiring changes.
#[derive(Debug, Clone)]
pub struct Geometry {
    width: usize,
    height: usize,
    n_addr_lines: usize,
    n_planes: usize,
    pixels_across: usize,
    serpentine: bool,
    orientation: Orientation,
    map: Vec<usize>,
}

impl Geometry {
    /// Builds the geometry for a panel chain.
    ///
    /// `width` and `height` are the logical display dimensions in pixels,
    /// `n_addr_lines` the number of row-address lines (a 1/16-scan panel has
    /// 4), `n_planes` the bit-planes per channel (1-10). `serpentine`
    /// describes a chain where every odd panel is mounted upside down.
    ///
    /// Fails when `height` is not a whole number of physical panels, or when
    /// the requested plane count cannot be extracted from the quantized
    /// color depth.
    pub fn new(
        width: usize,
        height: usize,
        n_addr_lines: usize,
        n_planes: usize,
        serpentine: bool,
        orientation: Orientation,
    ) -> Result<Self> {
        if n_planes == 0 || n_planes > crate::colorspace::COLOR_DEPTH {
            return Err(Error::InvalidPlaneCount(n_planes));
        }

        let half_panel_height = 1usize << n_addr_lines;
        let panel_height = 2 * half_panel_height;
        if height % panel_height != 0 {
            return Err(Error::HeightNotDivisible {
                height,
                panel_height,
            });
        }
        if (width * height) % panel_height != 0 {
            return Err(Error::PixelCountNotDivisible {
                pixels: width * height,
                rows: panel_height,
            });
        }

        let v_panels = height / panel_height;
        let pixels_across = width * v_panels;
        let map = build_map(
            width,
            height,
            half_panel_height,
            pixels_across,
            serpentine,
            orientation,
        );
        // Internal consistency, not user input: the builder must produce
        // exactly one entry per displayed pixel.
        assert_eq!(
            map.len(),
            panel_height * pixels_across,
            "matrix map size does not match the calculated pixel count"
        );

        debug!(
            width,
            height, n_addr_lines, pixels_across, serpentine, "built matrix geometry"
        );

        Ok(Self {
            width,
            height,
            n_addr_lines,
            n_planes,
            pixels_across,
            serpentine,
            orientation,
            map,
        })
    }

    /// Logical display width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Logical display height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of row-address lines.
    pub fn n_addr_lines(&self) -> usize {
        self.n_addr_lines
    }

    /// Bit-planes per channel.
    pub fn n_planes(&self) -> usize {
        self.n_planes
    }

    /// Pixel pairs clocked out per scan row.
    pub fn pixels_across(&self) -> usize {
        self.pixels_across
    }

    /// Whether odd panels in the chain are mounted upside down.
    pub fn serpentine(&self) -> bool {
        self.serpentine
    }

    /// The display orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Row addresses scanned per refresh (`2^n_addr_lines`).
    pub fn scan_rows(&self) -> usize {
        1 << self.n_addr_lines
    }

    /// The scan-order index map: two framebuffer indices (upper half, lower
    /// half) per clocked column, `scan_rows() * 2 * pixels_across()` entries.
    pub fn map(&self) -> &[usize] {
        &self.map
    }

    /// The two framebuffer indices displayed at `column` while row address
    /// `addr` is being shifted.
    pub fn pixel_pair(&self, addr: usize, column: usize) -> (usize, usize) {
        let base = (addr * self.pixels_across + column) * 2;
        (self.map[base], self.map[base + 1])
    }
}

fn build_map(
    width: usize,
    height: usize,
    half_panel_height: usize,
    pixels_across: usize,
    serpentine: bool,
    orientation: Orientation,
) -> Vec<usize> {
    let panel_height = 2 * half_panel_height;
    let mut map = Vec::with_capacity(width * height);

    for i in 0..half_panel_height {
        for j in 0..pixels_across {
            let panel_no = j / width;
            let panel_idx = j % width;

            let (x, y0, y1) = if serpentine && panel_no % 2 == 1 {
                // Odd panels hang upside down: columns run backwards and
                // rows count from the panel's far edge.
                (
                    width - panel_idx - 1,
                    (panel_no + 1) * panel_height - i - 1,
                    (panel_no + 1) * panel_height - i - half_panel_height - 1,
                )
            } else {
                (
                    panel_idx,
                    panel_no * panel_height + i,
                    panel_no * panel_height + i + half_panel_height,
                )
            };

            map.push(orientation.transform(width, height, x, y0));
            map.push(orientation.transform(width, height, x, y1));
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(
        width: usize,
        height: usize,
        n_addr_lines: usize,
        serpentine: bool,
        orientation: Orientation,
    ) -> Geometry {
        Geometry::new(width, height, n_addr_lines, 10, serpentine, orientation).unwrap()
    }

    #[test]
    fn test_map_length_and_range() {
        for (width, height, n_addr_lines) in [
            (64, 32, 4),
            (64, 64, 4),
            (64, 64, 5),
            (32, 16, 3),
            (128, 64, 4),
            (64, 128, 4),
        ] {
            for serpentine in [false, true] {
                let g = geometry(width, height, n_addr_lines, serpentine, Orientation::Normal);
                let panel_height = 1 << (n_addr_lines + 1);
                assert_eq!(g.map().len(), panel_height * g.pixels_across());
                assert!(g.map().iter().all(|&idx| idx < width * height));
            }
        }
    }

    #[test]
    fn test_map_is_bijection_for_plain_chain() {
        let g = geometry(64, 32, 4, false, Orientation::Normal);
        let mut seen = vec![false; 64 * 32];
        for &idx in g.map() {
            assert!(!seen[idx], "framebuffer index {idx} visited twice");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&v| v));
    }

    #[test]
    fn test_map_is_bijection_for_all_orientations() {
        for orientation in [
            Orientation::Normal,
            Orientation::R180,
            Orientation::Cw,
            Orientation::Ccw,
        ] {
            let g = geometry(64, 64, 4, true, orientation);
            let mut seen = vec![false; 64 * 64];
            for &idx in g.map() {
                assert!(!seen[idx], "{orientation}: index {idx} visited twice");
                seen[idx] = true;
            }
            assert!(seen.iter().all(|&v| v), "{orientation}: map not onto");
        }
    }

    #[test]
    fn test_serpentine_64x64_base_case() {
        // Two stacked 64x32 panels, 1/16 scan, second panel upside down.
        let g = geometry(64, 64, 4, true, Orientation::Normal);
        assert_eq!(g.pixels_across(), 128);
        assert_eq!(g.map().len(), 4096);
        // Scan position 0: panel 0, column 0, rows 0 and 16.
        assert_eq!(g.map()[0], 0);
        assert_eq!(g.map()[1], 16 * 64);
        // First column of the second (flipped) panel: rows 63 and 47.
        let second_panel = 2 * 64;
        assert_eq!(g.map()[second_panel], 63 * 64 + 63);
        assert_eq!(g.map()[second_panel + 1], 47 * 64 + 63);
    }

    #[test]
    fn test_pixel_pair_reads_map_in_order() {
        let g = geometry(64, 32, 4, false, Orientation::Normal);
        assert_eq!(g.pixel_pair(0, 0), (g.map()[0], g.map()[1]));
        let base = (3 * g.pixels_across() + 17) * 2;
        assert_eq!(g.pixel_pair(3, 17), (g.map()[base], g.map()[base + 1]));
    }

    #[test]
    fn test_height_not_divisible_fails() {
        let err = Geometry::new(64, 48, 4, 10, false, Orientation::Normal).unwrap_err();
        assert!(matches!(
            err,
            Error::HeightNotDivisible {
                height: 48,
                panel_height: 32
            }
        ));
    }

    #[test]
    fn test_invalid_plane_count_fails() {
        assert!(matches!(
            Geometry::new(64, 32, 4, 0, false, Orientation::Normal).unwrap_err(),
            Error::InvalidPlaneCount(0)
        ));
        assert!(matches!(
            Geometry::new(64, 32, 4, 11, false, Orientation::Normal).unwrap_err(),
            Error::InvalidPlaneCount(11)
        ));
    }

    #[test]
    fn test_stacked_panels_grow_pixels_across() {
        let g = geometry(64, 128, 4, false, Orientation::Normal);
        assert_eq!(g.pixels_across(), 64 * 4);
        assert_eq!(g.scan_rows(), 16);
    }
}
