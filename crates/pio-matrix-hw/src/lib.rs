//! PIO Matrix Hardware Library
//!
//! Drives HUB75 LED matrix panels through a PIO-based kernel driver: maps
//! logical framebuffers onto panel shift-register order, gamma-corrects and
//! quantizes colors, encodes binary-code-modulation command streams, and
//! pushes them to the device node.

pub mod colorspace;
pub mod device;
pub mod dump;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod orientation;
pub mod pinout;
pub mod protocol;

pub use colorspace::{Colorspace, GammaLut, COLOR_DEPTH};
pub use device::{CommandSink, PioDevice, DEFAULT_CHUNK_WORDS};
pub use encoder::{Encoder, Timings};
pub use error::{Error, Result};
pub use geometry::Geometry;
pub use matrix::PioMatter;
pub use orientation::Orientation;
pub use pinout::Pinout;

/// Default PIO character device node.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/pio0";
