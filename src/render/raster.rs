//! CPU rasterization of a [`PosterScene`] with `vello_cpu`.
//!
//! The scene lives in layout units; rendering scales every coordinate by
//! `target_width / scene.width`, so a given scene produces geometrically
//! identical bitmaps at every export resolution. Image content is always
//! placed through the explicit contain/cover math in [`crate::render::fit`],
//! never through a sampler's implicit fitting.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context as _;
use kurbo::{Affine, BezPath, Rect, Shape};

use crate::compose::model::{
    ArtworkBlock, BackgroundLayer, ChipRow, PosterScene, TextBlock, WaveformBlock,
};
use crate::foundation::core::PixelSize;
use crate::foundation::error::{PosterError, PosterResult};
use crate::render::blur::gaussian_blur_rgba8_premul;
use crate::render::fit::fitted_rect;
use crate::render::text::{TextBrush, TextEngine};
use crate::style::color::Rgba;
use crate::style::resolve::ShadowSpec;

/// Hairline width in layout units.
const RING_WIDTH: f64 = 2.0;
/// Working width for background blurs; the blur destroys detail anyway, so
/// blurring a downscaled copy and upscaling is visually identical and far
/// cheaper than blurring at export resolution.
const BLUR_WORK_WIDTH: u32 = 500;

/// Decoded artwork in premultiplied RGBA8, shared across render calls.
#[derive(Clone, Debug)]
pub struct ArtworkPixels {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8 bytes.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl ArtworkPixels {
    /// Decode encoded image bytes (PNG/JPEG/…) into premultiplied RGBA8.
    pub fn decode(bytes: &[u8]) -> PosterResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode artwork image")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        })
    }
}

/// A rendered poster bitmap in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8 bytes.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Height divided by width.
    pub fn aspect(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }

    /// Convert to straight-alpha RGBA8 for encoding.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 || a == 255 {
                continue;
            }
            for c in px.iter_mut().take(3) {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Scene painter. Owns the text shaping contexts and the per-font data cache,
/// both reused across renders.
pub struct Rasterizer {
    text: TextEngine,
    custom_family: Option<String>,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Construct a painter backed by the system font collection.
    pub fn new() -> Self {
        Self {
            text: TextEngine::new(),
            custom_family: None,
            font_cache: HashMap::new(),
        }
    }

    /// Register a custom font; it is put at the front of every family stack
    /// from here on. Fonts must be registered before rendering so no glyph is
    /// shaped against a family that appears mid-export.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> PosterResult<()> {
        let family = self.text.register_font(font_bytes)?;
        tracing::debug!(%family, "registered custom font");
        self.custom_family = Some(family);
        Ok(())
    }

    fn family_stack(&self, scene_stack: &str) -> String {
        match &self.custom_family {
            Some(family) => format!("{family}, {scene_stack}"),
            None => scene_stack.to_owned(),
        }
    }

    /// Paint `scene` into a `size`-pixel bitmap.
    ///
    /// `clear` optionally fills the canvas under the poster (the poster's
    /// rounded corners leave transparent pixels otherwise).
    pub fn render(
        &mut self,
        scene: &PosterScene,
        artwork: Option<&ArtworkPixels>,
        size: PixelSize,
        clear: Option<Rgba>,
    ) -> PosterResult<RasterImage> {
        let w16: u16 = size
            .width
            .try_into()
            .map_err(|_| PosterError::render("render width exceeds u16 pixmap limit"))?;
        let h16: u16 = size
            .height
            .try_into()
            .map_err(|_| PosterError::render("render height exceeds u16 pixmap limit"))?;

        let scale = f64::from(size.width) / scene.width;
        let canvas = Rect::new(0.0, 0.0, f64::from(size.width), f64::from(size.height));
        let poster_path = rounded_rect_path(canvas, scene.corner_radius * scale);

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some(color) = clear {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(to_paint_color(color));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, canvas.x1, canvas.y1));
        }

        self.paint_background(&mut ctx, scene, artwork, canvas, &poster_path, scale)?;

        if let Some(ring) = scene.border {
            paint_ring(&mut ctx, canvas, RING_WIDTH * scale, ring);
        }

        self.paint_artwork(&mut ctx, &scene.artwork, artwork, scale)?;

        if let Some(chips) = &scene.chips {
            paint_chips(&mut ctx, chips, scale);
        }
        if let Some(waveform) = &scene.waveform {
            paint_waveform(&mut ctx, waveform, scale);
        }

        let stack = self.family_stack(&scene.font_stack);
        for block in &scene.texts {
            self.paint_text(&mut ctx, block, &stack, scale, parley::Alignment::Start)?;
        }

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(RasterImage {
            width: size.width,
            height: size.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }

    fn paint_background(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        scene: &PosterScene,
        artwork: Option<&ArtworkPixels>,
        canvas: Rect,
        poster_path: &BezPath,
        scale: f64,
    ) -> PosterResult<()> {
        match scene.background {
            BackgroundLayer::Solid { color } => {
                fill_path_color(ctx, poster_path, color);
            }
            BackgroundLayer::BlurredArtwork {
                blur_radius,
                overlay_opacity,
                fallback,
            } => {
                match artwork {
                    Some(art) => {
                        let blur_px = (blur_radius * scale).round().max(1.0) as u32;
                        let (img, w, h) = blurred_cover_image(art, canvas, blur_px)?;
                        fill_path_with_image(
                            ctx,
                            img,
                            f64::from(w),
                            f64::from(h),
                            canvas,
                            poster_path,
                        );
                    }
                    None => {
                        tracing::warn!("blur background requested without artwork, using fallback");
                        fill_path_color(ctx, poster_path, fallback);
                    }
                }
                if overlay_opacity > 0.0 {
                    fill_path_color(
                        ctx,
                        poster_path,
                        Rgba::rgb(0, 0, 0).with_opacity(overlay_opacity),
                    );
                }
            }
        }
        Ok(())
    }

    fn paint_artwork(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        block: &ArtworkBlock,
        artwork: Option<&ArtworkPixels>,
        scale: f64,
    ) -> PosterResult<()> {
        let dst = scale_rect(block.rect, scale);
        let radius = block.corner_radius * scale;
        let clip = rounded_rect_path(dst, radius);

        paint_shadow(ctx, dst, radius, &block.shadow, scale);

        match (artwork, &block.placeholder) {
            (Some(art), _) => {
                // Explicit fit geometry: the image rectangle is computed from
                // the natural dimensions, then cropped by the box path, so a
                // sampler never re-derives the fit at a different size.
                let fitted = fitted_rect(
                    block.fit,
                    f64::from(art.width),
                    f64::from(art.height),
                    dst,
                );
                let img = image_from_premul(&art.rgba8_premul, art.width, art.height)?;
                fill_path_with_image(
                    ctx,
                    img,
                    f64::from(art.width),
                    f64::from(art.height),
                    fitted,
                    &clip,
                );
            }
            (None, Some(placeholder)) => {
                fill_path_color(ctx, &clip, placeholder.background);
                let label_size = 24.0;
                let label = TextBlock {
                    role: crate::compose::model::TextRole::Placeholder,
                    x: block.rect.x0,
                    // Centered vertically by the label's single-line height.
                    y: block.rect.center().y - label_size * 0.65,
                    max_width: block.rect.width(),
                    text: placeholder.label.clone(),
                    size: label_size,
                    weight: 500,
                    letter_spacing: 0.4,
                    color: placeholder.color,
                };
                let stack = self.family_stack("sans-serif");
                self.paint_text(ctx, &label, &stack, scale, parley::Alignment::Center)?;
            }
            (None, None) => {
                fill_path_color(ctx, &clip, Rgba::rgb(0, 0, 0).with_opacity(0.05));
            }
        }

        paint_ring(ctx, dst, RING_WIDTH * scale * 0.5, block.ring);
        Ok(())
    }

    fn paint_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        block: &TextBlock,
        family_stack: &str,
        scale: f64,
        alignment: parley::Alignment,
    ) -> PosterResult<()> {
        if block.text.is_empty() {
            return Ok(());
        }
        let brush = TextBrush {
            r: block.color.r,
            g: block.color.g,
            b: block.color.b,
            a: block.color.a,
        };
        let layout = self.text.layout(
            &block.text,
            family_stack,
            (block.size * scale) as f32,
            block.weight,
            (block.letter_spacing * scale) as f32,
            brush,
            Some((block.max_width * scale) as f32),
            alignment,
        )?;

        ctx.set_transform(affine_to_cpu(Affine::translate((
            block.x * scale,
            block.y * scale,
        ))));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let style_brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    style_brush.r,
                    style_brush.g,
                    style_brush.b,
                    style_brush.a,
                ));

                let run_font = run.run().font();
                let key = (run_font.data.id(), run_font.index as u32);
                let font = self
                    .font_cache
                    .entry(key)
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(run_font.data.as_ref().to_vec()),
                            run_font.index as u32,
                        )
                    })
                    .clone();

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

fn paint_chips(ctx: &mut vello_cpu::RenderContext, chips: &ChipRow, scale: f64) {
    if chips.colors.is_empty() {
        return;
    }
    let rect = scale_rect(chips.rect, scale);
    let gap = chips.gap * scale;
    let n = chips.colors.len() as f64;
    let chip_w = ((rect.width() - gap * (n - 1.0)) / n).max(1.0);
    let radius = chips.corner_radius * scale;

    for (i, color) in chips.colors.iter().enumerate() {
        let x = rect.x0 + i as f64 * (chip_w + gap);
        let chip = Rect::new(x, rect.y0, x + chip_w, rect.y1);
        fill_path_color(ctx, &rounded_rect_path(chip, radius), *color);
    }
}

fn paint_waveform(ctx: &mut vello_cpu::RenderContext, wf: &WaveformBlock, scale: f64) {
    if wf.bars.is_empty() {
        return;
    }
    let rect = scale_rect(wf.rect, scale);
    let gap = wf.bar_gap * scale;
    let n = wf.bars.len() as f64;
    let bar_w = ((rect.width() - gap * (n - 1.0)) / n).max(0.5);
    let min_h = wf.min_bar_height * scale;
    let radius = wf.bar_radius * scale;

    for (i, amp) in wf.bars.iter().enumerate() {
        let h = (amp * rect.height()).max(min_h);
        let x = rect.x0 + i as f64 * (bar_w + gap);
        let y = rect.y0 + (rect.height() - h) / 2.0;
        let bar = Rect::new(x, y, x + bar_w, y + h);
        fill_path_color(ctx, &rounded_rect_path(bar, radius.min(bar_w / 2.0)), wf.color);
    }
}

/// Approximate a soft drop shadow with three expanding translucent layers.
fn paint_shadow(
    ctx: &mut vello_cpu::RenderContext,
    rect: Rect,
    radius: f64,
    shadow: &ShadowSpec,
    scale: f64,
) {
    if shadow.alpha <= 0.0 {
        return;
    }
    let dy = shadow.dy * scale;
    let layers = 3;
    for i in 1..=layers {
        let t = f64::from(i) / f64::from(layers);
        let grow = shadow.blur * scale * 0.5 * t;
        let layer = Rect::new(
            rect.x0 - grow,
            rect.y0 - grow + dy,
            rect.x1 + grow,
            rect.y1 + grow + dy,
        );
        let alpha = shadow.alpha / (f64::from(layers) * 1.6);
        fill_path_color(
            ctx,
            &rounded_rect_path(layer, radius + grow),
            Rgba::rgb(0, 0, 0).with_opacity(alpha),
        );
    }
}

/// A hairline rectangle outline drawn as four strips.
fn paint_ring(ctx: &mut vello_cpu::RenderContext, rect: Rect, width: f64, color: Rgba) {
    let w = width.max(1.0);
    let strips = [
        Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + w),
        Rect::new(rect.x0, rect.y1 - w, rect.x1, rect.y1),
        Rect::new(rect.x0, rect.y0 + w, rect.x0 + w, rect.y1 - w),
        Rect::new(rect.x1 - w, rect.y0 + w, rect.x1, rect.y1 - w),
    ];
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(to_paint_color(color));
    for s in strips {
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(s.x0, s.y0, s.x1, s.y1));
    }
}

/// Scale-to-cover the artwork over the canvas at a reduced working size,
/// blur it there, and hand back the result as an image paint.
fn blurred_cover_image(
    art: &ArtworkPixels,
    canvas: Rect,
    blur_px_at_canvas: u32,
) -> PosterResult<(vello_cpu::Image, u32, u32)> {
    let work_w = BLUR_WORK_WIDTH.min(canvas.width() as u32).max(1);
    let work_h = ((canvas.height() / canvas.width()) * f64::from(work_w))
        .round()
        .max(1.0) as u32;

    let src = image::RgbaImage::from_raw(art.width, art.height, art.rgba8_premul.as_ref().clone())
        .ok_or_else(|| PosterError::render("artwork buffer size mismatch"))?;
    let scaled = image::DynamicImage::ImageRgba8(src)
        .resize_to_fill(work_w, work_h, image::imageops::FilterType::Triangle)
        .into_rgba8();

    let mut pixels = scaled.into_raw();
    let work_radius =
        ((f64::from(blur_px_at_canvas) * f64::from(work_w) / canvas.width()).round() as u32).max(1);
    gaussian_blur_rgba8_premul(&mut pixels, work_w, work_h, work_radius)?;

    let img = image_from_premul(&pixels, work_w, work_h)?;
    Ok((img, work_w, work_h))
}

fn scale_rect(r: Rect, scale: f64) -> Rect {
    Rect::new(r.x0 * scale, r.y0 * scale, r.x1 * scale, r.y1 * scale)
}

fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    let radius = radius.max(0.0).min(rect.width().min(rect.height()) / 2.0);
    kurbo::RoundedRect::from_rect(rect, radius).to_path(0.1)
}

fn to_paint_color(c: Rgba) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn fill_path_color(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Rgba) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(to_paint_color(color));
    ctx.fill_path(&bezpath_to_cpu(path));
}

/// Fill `clip_path` with image pixels laid out so the image's natural bounds
/// land exactly on `image_rect`.
fn fill_path_with_image(
    ctx: &mut vello_cpu::RenderContext,
    image: vello_cpu::Image,
    nat_w: f64,
    nat_h: f64,
    image_rect: Rect,
    clip_path: &BezPath,
) {
    if nat_w <= 0.0 || nat_h <= 0.0 {
        return;
    }
    let t = Affine::translate((image_rect.x0, image_rect.y0))
        * Affine::scale_non_uniform(image_rect.width() / nat_w, image_rect.height() / nat_h);
    let Some(inverse) = invert(t) else {
        return;
    };
    let mut local = clip_path.clone();
    local.apply_affine(inverse);

    ctx.set_transform(affine_to_cpu(t));
    ctx.set_paint(image);
    ctx.fill_path(&bezpath_to_cpu(&local));
}

fn invert(a: Affine) -> Option<Affine> {
    if a.determinant().abs() < 1e-12 {
        None
    } else {
        Some(a.inverse())
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PosterResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PosterError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PosterError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PosterError::render("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn image_from_premul(bytes_premul: &[u8], width: u32, height: u32) -> PosterResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::config::StyleConfig;
    use crate::style::resolve::resolve;

    fn small_scene() -> PosterScene {
        let config = StyleConfig::default();
        let theme = resolve(&config);
        let item = crate::catalog::model::CatalogItem {
            title: "Tiny".into(),
            contributors: vec!["Unit".into()],
            artwork_url: Some("art.png".into()),
            sub_items: vec![crate::catalog::model::SubItem {
                number: 1,
                title: "One".into(),
                duration_ms: Some(60_000),
            }],
            ..Default::default()
        };
        let palette = crate::palette::FALLBACK_PALETTE.to_vec();
        crate::compose::build::compose(&item, &theme, &palette, &[0.4, 0.8, 0.6], &config)
    }

    fn checker_artwork(w: u32, h: u32) -> ArtworkPixels {
        let mut data = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                let on = (x / 8 + y / 8) % 2 == 0;
                let v = if on { 220 } else { 40 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        ArtworkPixels {
            width: w,
            height: h,
            rgba8_premul: Arc::new(data),
        }
    }

    #[test]
    fn renders_at_requested_dimensions() {
        let scene = small_scene();
        let mut raster = Rasterizer::new();
        let size = PixelSize::new(200, 300).unwrap();
        let frame = raster
            .render(&scene, Some(&checker_artwork(64, 64)), size, None)
            .unwrap();
        assert_eq!(frame.width, 200);
        assert_eq!(frame.height, 300);
        assert_eq!(frame.data.len(), 200 * 300 * 4);
    }

    #[test]
    fn background_fill_reaches_the_canvas_center() {
        let scene = small_scene();
        let mut raster = Rasterizer::new();
        let size = PixelSize::new(100, 150).unwrap();
        let frame = raster.render(&scene, None, size, None).unwrap();
        // Default theme is flat white; the center pixel sits in the artwork
        // placeholder area, which is a light chip tone over white.
        let center = ((75 * 100 + 50) * 4) as usize;
        assert!(frame.data[center] > 150, "center should be light");
        assert_eq!(frame.data[center + 3], 255);
    }

    #[test]
    fn corners_stay_transparent_without_a_clear_color() {
        let scene = small_scene();
        let mut raster = Rasterizer::new();
        let size = PixelSize::new(120, 180).unwrap();
        let frame = raster.render(&scene, None, size, None).unwrap();
        // The corner pixel sits outside the rounded poster path; edge
        // antialiasing may leave a sliver of coverage, never full opacity.
        assert!(
            frame.data[3] < 128,
            "corner alpha {} should be (near) transparent",
            frame.data[3]
        );

        let cleared = raster
            .render(&scene, None, size, Some(Rgba::rgb(9, 9, 9)))
            .unwrap();
        assert_eq!(cleared.data[3], 255);
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let scene = small_scene();
        let mut raster = Rasterizer::new();
        let size = PixelSize::new(70_000, 105_000).unwrap();
        assert!(raster.render(&scene, None, size, None).is_err());
    }

    #[test]
    fn straight_alpha_conversion_round_trips_opaque_pixels() {
        let img = RasterImage {
            width: 1,
            height: 1,
            data: vec![10, 20, 30, 255],
        };
        assert_eq!(img.to_straight_rgba(), vec![10, 20, 30, 255]);
    }
}
