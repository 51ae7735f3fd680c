//! High-resolution PNG export.
//!
//! The export geometry is fixed up front: a base width, a quality multiplier
//! and a device-pixel ratio give the bitmap width, and the height follows
//! from the poster ratio. The on-screen (preview) size never leaks into the
//! file.

use std::path::Path;

use anyhow::Context as _;

use crate::compose::model::PosterScene;
use crate::foundation::core::{AspectRatio, PixelSize};
use crate::foundation::error::{PosterError, PosterResult};
use crate::render::raster::{ArtworkPixels, RasterImage, Rasterizer};
use crate::style::color::Rgba;

/// Base width used when the caller does not supply one (the preview's
/// largest on-screen width).
pub const EXPORT_BASE_WIDTH_PX: u32 = 760;

/// Export parameters.
#[derive(Clone, Debug)]
pub struct ExportOpts {
    /// Quality multiplier applied to the base width.
    pub scale: f64,
    /// Device-pixel-ratio multiplier (1.0 outside a browser).
    pub device_pixel_ratio: f64,
    /// Output aspect ratio.
    pub ratio: AspectRatio,
    /// Fill under the poster's rounded corners; `None` keeps them
    /// transparent.
    pub background: Option<Rgba>,
    /// Base width override in pixels.
    pub base_width_px: Option<u32>,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            scale: 4.0,
            device_pixel_ratio: 1.0,
            ratio: AspectRatio::POSTER,
            background: None,
            base_width_px: None,
        }
    }
}

/// Final bitmap dimensions for the given options:
/// `width = base × scale × dpr`, `height = width × ratio`.
pub fn target_pixel_size(opts: &ExportOpts) -> PosterResult<PixelSize> {
    if !opts.scale.is_finite() || opts.scale <= 0.0 {
        return Err(PosterError::validation("export scale must be > 0"));
    }
    if !opts.device_pixel_ratio.is_finite() || opts.device_pixel_ratio <= 0.0 {
        return Err(PosterError::validation("device pixel ratio must be > 0"));
    }

    let base = f64::from(opts.base_width_px.unwrap_or(EXPORT_BASE_WIDTH_PX));
    let width = (base * opts.scale * opts.device_pixel_ratio).round();
    let height = opts.ratio.height_for_width(width);
    if width < 1.0 || height < 1.0 {
        return Err(PosterError::validation("export dimensions collapsed to zero"));
    }
    if width > f64::from(u16::MAX) || height > f64::from(u16::MAX) {
        return Err(PosterError::export(format!(
            "export dimensions {width}x{height} exceed the renderer's pixmap limit"
        )));
    }
    PixelSize::new(width as u32, height as u32)
}

/// Sanitized export file name for an item title: non-alphanumerics become
/// `_`, everything is lowercased, `_poster.png` is appended.
pub fn poster_filename(title: &str) -> String {
    let mut name: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        name.push_str("poster");
    }
    format!("{name}_poster.png")
}

/// Renders composed scenes into fixed-dimension PNG files.
///
/// Owns a [`Rasterizer`] so font resolution and shaping contexts are reused
/// across exports. All scratch state of a single export is function-local
/// and torn down on every path, including errors.
pub struct Exporter {
    rasterizer: Rasterizer,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    /// Construct an exporter.
    pub fn new() -> Self {
        Self {
            rasterizer: Rasterizer::new(),
        }
    }

    /// Register a custom font used for all subsequent renders.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> PosterResult<()> {
        self.rasterizer.register_font(font_bytes)
    }

    /// Render the scene at the option-derived pixel size.
    pub fn render_bitmap(
        &mut self,
        scene: &PosterScene,
        artwork: Option<&ArtworkPixels>,
        opts: &ExportOpts,
    ) -> PosterResult<RasterImage> {
        let size = target_pixel_size(opts)?;
        self.rasterizer
            .render(scene, artwork, size, opts.background)
    }

    /// Render and write a PNG. No partial file survives a failure.
    pub fn export_png(
        &mut self,
        scene: &PosterScene,
        artwork: Option<&ArtworkPixels>,
        opts: &ExportOpts,
        out_path: &Path,
    ) -> PosterResult<()> {
        let frame = self.render_bitmap(scene, artwork, opts)?;
        write_png(&frame, out_path)?;
        tracing::info!(
            path = %out_path.display(),
            width = frame.width,
            height = frame.height,
            "exported poster"
        );
        Ok(())
    }
}

fn write_png(frame: &RasterImage, path: &Path) -> PosterResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let result = image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()));

    if let Err(err) = result {
        // Never leave a truncated file behind.
        let _ = std::fs::remove_file(path);
        return Err(PosterError::Export(format!("{err:#}")));
    }
    Ok(())
}
