//! PIO Matrix Control Tool
//!
//! CLI for driving HUB75 panels through the PIO device: inspect geometry
//! maps, encode frames to word dumps for offline analysis, and display
//! images or the bring-up test pattern on real hardware.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pio_matrix_hw::{
    dump, protocol, Colorspace, Encoder, GammaLut, Geometry, Orientation, Pinout, PioDevice,
    PioMatter, Timings, DEFAULT_DEVICE_PATH,
};
use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pio-matrixctl")]
#[command(about = "Control tool for PIO-driven HUB75 LED matrices")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PanelArgs {
    /// Logical display width in pixels
    #[arg(long, default_value = "64")]
    width: usize,

    /// Logical display height in pixels
    #[arg(long, default_value = "32")]
    height: usize,

    /// Row-address lines on the panel (a 1/2^n scan panel has n lines)
    #[arg(long, default_value = "4")]
    addr_lines: usize,

    /// Bit-planes of color depth to modulate
    #[arg(long, default_value = "10")]
    planes: usize,

    /// Vertically stacked panels are wired in a serpentine chain
    #[arg(long)]
    serpentine: bool,

    /// Display rotation in degrees: 0, 90, 180 or 270
    #[arg(long, default_value = "0")]
    rotation: u32,

    /// Framebuffer pixel layout: rgb888, rgb888-packed, rgb565
    #[arg(long, default_value = "rgb888-packed")]
    colorspace: String,

    /// Gamma exponent for color correction
    #[arg(long, default_value = "2.2")]
    gamma: f64,

    /// TOML file with timing calibration overrides
    #[arg(long)]
    timings: Option<PathBuf>,
}

impl PanelArgs {
    fn geometry(&self) -> Result<Geometry> {
        let orientation = Orientation::from_rotation(self.rotation)?;
        Geometry::new(
            self.width,
            self.height,
            self.addr_lines,
            self.planes,
            self.serpentine,
            orientation,
        )
        .context("invalid panel geometry")
    }

    fn colorspace(&self) -> Result<Colorspace> {
        self.colorspace
            .parse()
            .context("invalid colorspace")
    }

    fn timings(&self) -> Result<Timings> {
        match &self.timings {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading timings file {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("parsing timings file {}", path.display()))
            }
            None => Ok(Timings::default()),
        }
    }

    fn encoder(&self) -> Result<Encoder> {
        let encoder = Encoder::new(
            self.geometry()?,
            self.colorspace()?,
            GammaLut::new(self.gamma),
            Pinout::adafruit_matrix_bonnet(),
            self.timings()?,
        )?;
        Ok(encoder)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the geometry's framebuffer-to-shift-register mapping
    Map {
        #[command(flatten)]
        panel: PanelArgs,

        /// Print every map entry instead of just the summary
        #[arg(long)]
        full: bool,
    },
    /// Encode one frame to a word dump for offline analysis
    Encode {
        #[command(flatten)]
        panel: PanelArgs,

        /// Image to encode (PNG etc.); omit for the test pattern
        #[arg(long)]
        image: Option<PathBuf>,

        /// Output file for the dump
        #[arg(default_value = "pattern.txt")]
        output: PathBuf,
    },
    /// Display an image or the test pattern on the panel
    Show {
        #[command(flatten)]
        panel: PanelArgs,

        /// PIO device node
        #[arg(long, default_value = DEFAULT_DEVICE_PATH)]
        device: PathBuf,

        /// Image to display; omit for the animated test pattern
        #[arg(long)]
        image: Option<PathBuf>,

        /// Number of frames to display (0 = run until interrupted)
        #[arg(long, default_value = "0")]
        frames: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Map { panel, full } => handle_map(&panel, full),
        Commands::Encode {
            panel,
            image,
            output,
        } => handle_encode(&panel, image.as_deref(), &output),
        Commands::Show {
            panel,
            device,
            image,
            frames,
        } => handle_show(&panel, &device, image.as_deref(), frames),
    }
}

fn handle_map(panel: &PanelArgs, full: bool) -> Result<()> {
    let geometry = panel.geometry()?;

    println!("Panel geometry:");
    println!("  Logical size: {}x{}", geometry.width(), geometry.height());
    println!("  Scan rows: {}", geometry.scan_rows());
    println!("  Pixels across: {}", geometry.pixels_across());
    println!("  Bit planes: {}", geometry.n_planes());
    println!("  Orientation: {}", geometry.orientation());
    println!(
        "  Serpentine: {}",
        if geometry.serpentine() { "yes" } else { "no" }
    );

    if full {
        for addr in 0..geometry.scan_rows() {
            for column in 0..geometry.pixels_across() {
                let (upper, lower) = geometry.pixel_pair(addr, column);
                println!("addr {addr:2} col {column:3}: upper {upper:6} lower {lower:6}");
            }
        }
    }
    Ok(())
}

fn handle_encode(
    panel: &PanelArgs,
    image: Option<&std::path::Path>,
    output: &std::path::Path,
) -> Result<()> {
    let encoder = panel.encoder()?;
    let fb = match image {
        Some(path) => image_frame(&encoder, path)?,
        None => pattern_frame(&encoder, 0),
    };
    let words = encoder.encode(&fb)?;
    let stats = protocol::validate_stream(&words)?;

    let mut file = fs::File::create(output)
        .with_context(|| format!("creating {}", output.display()))?;
    dump::write_words(&mut file, &words)?;

    println!(
        "Wrote {} words to {} ({} data runs, {} payload words, {} delays)",
        words.len(),
        output.display(),
        stats.data_runs,
        stats.payload_words,
        stats.delays
    );
    Ok(())
}

fn handle_show(
    panel: &PanelArgs,
    device: &std::path::Path,
    image: Option<&std::path::Path>,
    frames: u64,
) -> Result<()> {
    let encoder = panel.encoder()?;
    let sink = PioDevice::open(device)
        .with_context(|| format!("opening PIO device {}", device.display()))?;
    let mut matrix = PioMatter::new(encoder, sink);

    // A static image decodes once; only the test pattern is per-frame.
    let static_frame = image
        .map(|path| image_frame(matrix.encoder(), path))
        .transpose()?;

    let started = Instant::now();
    let mut offset = 0u32;
    loop {
        let fb = match &static_frame {
            Some(frame) => Cow::Borrowed(frame.as_slice()),
            None => Cow::Owned(pattern_frame(matrix.encoder(), offset)),
        };
        matrix.show(&fb)?;
        offset = offset.wrapping_add(1);

        let shown = matrix.frames_shown();
        if shown % 256 == 0 {
            let fps = shown as f64 / started.elapsed().as_secs_f64();
            println!("{shown} frames, {fps:.1} fps");
        }
        if frames != 0 && shown >= frames {
            break;
        }
    }

    let shown = matrix.frames_shown();
    let fps = shown as f64 / started.elapsed().as_secs_f64();
    println!("Displayed {shown} frames at {fps:.1} fps");
    Ok(())
}

/// Logical framebuffer dimensions for a geometry. Rotated orientations
/// store the framebuffer with rows of `height` pixels, so a 64x32 chain
/// rotated a quarter turn takes 32x64 input.
fn frame_size(geometry: &Geometry) -> (usize, usize) {
    match geometry.orientation() {
        Orientation::Cw | Orientation::Ccw => (geometry.height(), geometry.width()),
        Orientation::Normal | Orientation::R180 => (geometry.width(), geometry.height()),
    }
}

/// Decodes an image file into one framebuffer in the configured layout.
fn image_frame(encoder: &Encoder, path: &std::path::Path) -> Result<Vec<u8>> {
    let (fb_width, fb_height) = frame_size(encoder.geometry());
    let colorspace = encoder.colorspace();
    let mut fb = vec![0u8; encoder.framebuffer_len()];

    let img = image::open(path)
        .with_context(|| format!("loading image {}", path.display()))?
        .to_rgb8();
    if (img.width() as usize, img.height() as usize) != (fb_width, fb_height) {
        bail!(
            "image is {}x{} but the display is {}x{}",
            img.width(),
            img.height(),
            fb_width,
            fb_height
        );
    }
    for (x, y, pixel) in img.enumerate_pixels() {
        let index = y as usize * fb_width + x as usize;
        write_pixel(&mut fb, colorspace, index, pixel[0], pixel[1], pixel[2]);
    }
    Ok(fb)
}

/// Renders one frame of the animated test pattern.
fn pattern_frame(encoder: &Encoder, offset: u32) -> Vec<u8> {
    let (fb_width, fb_height) = frame_size(encoder.geometry());
    let colorspace = encoder.colorspace();
    let mut fb = vec![0u8; encoder.framebuffer_len()];

    for y in 0..fb_height {
        for x in 0..fb_width {
            let (r, g, b) = colorwheel((2 * x + 4 * y) as u32 + offset);
            write_pixel(&mut fb, colorspace, y * fb_width + x, r, g, b);
        }
    }
    fb
}

/// Stores one pixel into a framebuffer in the given layout.
fn write_pixel(fb: &mut [u8], colorspace: Colorspace, index: usize, r: u8, g: u8, b: u8) {
    match colorspace {
        Colorspace::Rgb888 => {
            fb[index * 4] = r;
            fb[index * 4 + 1] = g;
            fb[index * 4 + 2] = b;
        }
        Colorspace::Rgb888Packed => {
            fb[index * 3] = r;
            fb[index * 3 + 1] = g;
            fb[index * 3 + 2] = b;
        }
        Colorspace::Rgb565 => {
            let pixel = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
            fb[index * 2..index * 2 + 2].copy_from_slice(&pixel.to_le_bytes());
        }
    }
}

/// Classic position-to-color wheel used by the bring-up test pattern.
fn colorwheel(i: u32) -> (u8, u8, u8) {
    let i = (i & 0xFF) as u8;
    if i < 85 {
        (255 - i * 3, 0, i * 3)
    } else if i < 170 {
        let i = i - 85;
        (0, i * 3, 255 - i * 3)
    } else {
        let i = i - 170;
        (i * 3, 255 - i * 3, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorwheel_is_smooth() {
        // Adjacent positions never jump by more than the 3-per-step ramps.
        for i in 0..255u32 {
            let (r0, g0, b0) = colorwheel(i);
            let (r1, g1, b1) = colorwheel(i + 1);
            let delta = r0.abs_diff(r1) as u16 + g0.abs_diff(g1) as u16 + b0.abs_diff(b1) as u16;
            assert!(delta <= 6, "jump of {delta} at position {i}");
        }
    }

    #[test]
    fn test_frame_size_swaps_for_rotated_orientations() {
        let normal = Geometry::new(64, 32, 4, 8, false, Orientation::Normal).unwrap();
        assert_eq!(frame_size(&normal), (64, 32));
        let flipped = Geometry::new(64, 32, 4, 8, false, Orientation::R180).unwrap();
        assert_eq!(frame_size(&flipped), (64, 32));
        let ccw = Geometry::new(64, 32, 4, 8, false, Orientation::Ccw).unwrap();
        assert_eq!(frame_size(&ccw), (32, 64));
        let cw = Geometry::new(64, 32, 4, 8, false, Orientation::Cw).unwrap();
        assert_eq!(frame_size(&cw), (32, 64));
    }

    #[test]
    fn test_pattern_frame_fits_rotated_framebuffer() {
        // The pattern must index with the rotated stride; encoding it
        // exercises every map entry against the buffer it produced.
        let geometry = Geometry::new(64, 32, 4, 8, false, Orientation::Ccw).unwrap();
        let encoder = Encoder::new(
            geometry,
            Colorspace::Rgb888Packed,
            GammaLut::new(2.2),
            Pinout::adafruit_matrix_bonnet(),
            Timings::default(),
        )
        .unwrap();
        let fb = pattern_frame(&encoder, 0);
        assert_eq!(fb.len(), encoder.framebuffer_len());
        encoder.encode(&fb).unwrap();
    }

    #[test]
    fn test_write_pixel_layouts() {
        let mut fb = vec![0u8; 8];
        write_pixel(&mut fb, Colorspace::Rgb888, 1, 10, 20, 30);
        assert_eq!(&fb[4..7], &[10, 20, 30]);

        let mut fb = vec![0u8; 6];
        write_pixel(&mut fb, Colorspace::Rgb888Packed, 1, 10, 20, 30);
        assert_eq!(&fb[3..6], &[10, 20, 30]);

        let mut fb = vec![0u8; 2];
        write_pixel(&mut fb, Colorspace::Rgb565, 0, 255, 0, 0);
        assert_eq!(u16::from_le_bytes([fb[0], fb[1]]), 0xF800);
    }
}
