// Flattens background + ink + text into one opaque raster, and writes it out as PNG.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, ImageFormat, Rgb as ImageRgb};

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::text_layer::TextLayer;
use crate::types::{FrameBuffer, Rgb};

pub struct Compositor {
    lut: GammaLut,
}

/// The three layers for one composite, bottom to top.
pub struct Layers<'a> {
    /// Latest camera frame, if any; scaled to the ink size.
    pub background: Option<&'a FrameBuffer>,
    /// Flip the background, matching the feed mirror setting.
    pub mirror_background: bool,
    /// Fill used where there is no camera frame.
    pub backdrop: Rgb,
    pub ink: &'a FrameBuffer,
    pub text: &'a TextLayer,
}

impl Compositor {
    pub fn new() -> Self {
        Self { lut: GammaLut::new() }
    }

    /// Render all layers into `out`, resizing it to the ink layer's size.
    pub fn compose_into(&self, out: &mut FrameBuffer, layers: &Layers<'_>) {
        let (w, h) = (layers.ink.width, layers.ink.height);
        if out.width != w || out.height != h {
            *out = FrameBuffer::new(w, h);
        }

        match layers.background {
            Some(bg) if !bg.is_empty() => out.scale_from(bg, layers.mirror_background),
            _ => out.fill(layers.backdrop.to_argb()),
        }

        for (dst, &src) in out.pixels.iter_mut().zip(&layers.ink.pixels) {
            *dst = self.lut.over(*dst, src);
        }

        layers.text.render(out);
    }

    pub fn compose(&self, layers: &Layers<'_>) -> FrameBuffer {
        let mut out = FrameBuffer::new(layers.ink.width, layers.ink.height);
        self.compose_into(&mut out, layers);
        out
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

/// Write an RGB PNG; the alpha byte is dropped.
pub fn export_png(fb: &FrameBuffer, path: &Path) -> Result<(), Error> {
    let img = ImageBuffer::<ImageRgb<u8>, Vec<u8>>::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let px = fb.pixels[y as usize * fb.width + x as usize];
        ImageRgb([((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8])
    });
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| Error::Export { path: path.to_path_buf(), reason: e.to_string() })?;
    log::info!("exported {}x{} image to {}", fb.width, fb.height, path.display());
    Ok(())
}

/// First unused `<prefix>-NNNN.png` in `dir`.
pub fn next_export_path(dir: &Path, prefix: &str) -> PathBuf {
    (1u32..)
        .map(|n| dir.join(format!("{prefix}-{n:04}.png")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| dir.join(format!("{prefix}.png")))
}
