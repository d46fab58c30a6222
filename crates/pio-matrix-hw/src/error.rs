//! Error types for the pio-matrix hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building geometry, encoding frames, or talking
/// to the PIO device.
///
/// Geometry and framebuffer errors are configuration errors: the caller can
/// retry with corrected parameters. Overflow errors mean the requested
/// geometry/timing combination cannot be represented in the command-word
/// encoding at all. I/O errors are fatal to the current session; the PIO
/// state machine must be reinitialized before any further transfer.
#[derive(Error, Debug)]
pub enum Error {
    /// Panel height is not a whole number of physical panels.
    #[error("height {height} is not a multiple of the panel height {panel_height}")]
    HeightNotDivisible { height: usize, panel_height: usize },

    /// Total pixel count does not divide into the addressable row count.
    #[error("pixel count {pixels} is not a multiple of the addressable row count {rows}")]
    PixelCountNotDivisible { pixels: usize, rows: usize },

    /// Bit-plane count outside the supported range.
    #[error("plane count {0} is out of range (1-{max})", max = crate::colorspace::COLOR_DEPTH)]
    InvalidPlaneCount(usize),

    /// Invalid orientation name.
    #[error("invalid orientation: {0}")]
    InvalidOrientation(String),

    /// Rotation in degrees that is not a quarter turn.
    #[error("invalid rotation {0} (expected 0, 90, 180 or 270)")]
    InvalidRotation(u32),

    /// Invalid colorspace name.
    #[error("invalid colorspace: {0}")]
    InvalidColorspace(String),

    /// Framebuffer size mismatch.
    #[error("framebuffer size mismatch: expected {expected} bytes, got {actual}")]
    FramebufferSize { expected: usize, actual: usize },

    /// A DATA run longer than the command encoding can express.
    #[error("data run of {words} words exceeds the command encoding limit of {max}")]
    RunTooLong { words: usize, max: usize },

    /// A DELAY longer than the command encoding can express.
    #[error("delay of {cycles} cycles exceeds the command encoding limit of {max}")]
    DelayTooLong { cycles: u64, max: u64 },

    /// A command stream that fails structural validation.
    #[error("malformed command stream: {0}")]
    MalformedStream(String),

    /// A debug dump that cannot be parsed back into words.
    #[error("malformed dump: {0}")]
    MalformedDump(String),

    /// Invalid timing calibration values.
    #[error("invalid timing calibration: {0}")]
    InvalidTimings(String),

    /// PIO device transfer error. Always fatal to the current session.
    #[error("PIO transfer error: {0}")]
    Io(#[from] std::io::Error),

    /// PIO device node not found or could not be opened.
    #[error("PIO device not found at {0}")]
    DeviceNotFound(String),
}
