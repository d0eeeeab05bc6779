//! Headless capture: PNG screenshots.

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::GameBoy;

/// Save the current framebuffer as a PNG file.
///
/// The framebuffer is already RGBA bytes, so it is written as-is.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot(gb: &GameBoy, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, gb.framebuffer_width(), gb.framebuffer_height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(gb.framebuffer())?;
    Ok(())
}

/// Record video: dump frames as PNGs.
///
/// # Errors
///
/// Returns an error if a frame faults or cannot be saved.
pub fn record(gb: &mut GameBoy, dir: &Path, num_frames: u32) -> Result<(), Box<dyn Error>> {
    let frames_dir = dir.join("frames");
    fs::create_dir_all(&frames_dir)?;

    for i in 1..=num_frames {
        gb.run_frame()?;
        let filename = frames_dir.join(format!("{i:06}.png"));
        save_screenshot(gb, &filename)?;
    }

    eprintln!("Captured {num_frames} frames to {}", frames_dir.display());
    Ok(())
}
