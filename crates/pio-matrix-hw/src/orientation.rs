//! Panel orientation transforms.
//!
//! Each orientation is a pure mapping from a logical (x, y) coordinate to a
//! linear index into the caller's framebuffer. Rotated orientations swap the
//! roles of width and height: a 64x32 chain rotated 90 degrees presents a
//! 32x64 logical display.

use crate::error::Error;
use std::str::FromStr;

/// Display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Native panel orientation.
    #[default]
    Normal,
    /// Rotated 180 degrees.
    R180,
    /// Rotated 90 degrees clockwise.
    Cw,
    /// Rotated 90 degrees counter-clockwise.
    Ccw,
}

impl Orientation {
    /// Maps a logical coordinate to a framebuffer index.
    ///
    /// `width` and `height` are the logical display dimensions; `x` and `y`
    /// must lie within them. For `Cw` and `Ccw` the underlying framebuffer is
    /// `height` pixels across.
    pub fn transform(self, width: usize, height: usize, x: usize, y: usize) -> usize {
        debug_assert!(x < width && y < height);
        match self {
            Orientation::Normal => x + width * y,
            Orientation::R180 => (width - x - 1) + width * (height - y - 1),
            // Inverse pair: cw undoes ccw and vice versa.
            Orientation::Ccw => y + height * (width - x - 1),
            Orientation::Cw => (height - y - 1) + height * x,
        }
    }

    /// Converts a rotation in degrees (0, 90, 180, 270) to an orientation.
    ///
    /// Follows screen convention: 90 means the image appears rotated a
    /// quarter turn counter-clockwise on a panel chain wired normally.
    pub fn from_rotation(degrees: u32) -> Result<Self, Error> {
        match degrees {
            0 => Ok(Orientation::Normal),
            90 => Ok(Orientation::Ccw),
            180 => Ok(Orientation::R180),
            270 => Ok(Orientation::Cw),
            _ => Err(Error::InvalidRotation(degrees)),
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Orientation::Normal),
            "r180" | "180" => Ok(Orientation::R180),
            "cw" | "270" => Ok(Orientation::Cw),
            "ccw" | "90" => Ok(Orientation::Ccw),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Normal => write!(f, "normal"),
            Orientation::R180 => write!(f, "r180"),
            Orientation::Cw => write!(f, "cw"),
            Orientation::Ccw => write!(f, "ccw"),
        }
    }
}
