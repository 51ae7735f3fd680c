//! The renderable poster description.
//!
//! A [`PosterScene`] is an abstract scene graph in a fixed layout space:
//! width [`LAYOUT_WIDTH`], height derived from the 2:3 poster ratio. The
//! rasterizer scales it uniformly to any target resolution, so composing is
//! independent of output pixel size.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::style::color::Rgba;
use crate::style::resolve::ShadowSpec;

/// Width of the layout coordinate space.
pub const LAYOUT_WIDTH: f64 = 1000.0;

/// How an image is fitted into its box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    /// Scale to fit entirely inside the box (may letterbox).
    Contain,
    /// Scale to fill the box entirely (may crop).
    #[default]
    Cover,
}

/// Bottom layer of the poster.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundLayer {
    /// Flat fill.
    Solid {
        /// Fill color.
        color: Rgba,
    },
    /// Artwork scaled to cover the poster, blurred, dimmed by an overlay.
    BlurredArtwork {
        /// Gaussian blur radius in layout units.
        blur_radius: f64,
        /// Black overlay opacity on top of the blurred pixels.
        overlay_opacity: f64,
        /// Fill used when no artwork pixels are available.
        fallback: Rgba,
    },
}

/// Placeholder content shown when the artwork is missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderBlock {
    /// Centered label text.
    pub label: String,
    /// Label color.
    pub color: Rgba,
    /// Block fill.
    pub background: Rgba,
}

/// The artwork region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtworkBlock {
    /// Box the image is fitted into, in layout units.
    pub rect: Rect,
    /// Fit mode applied to the image's natural dimensions.
    pub fit: ImageFit,
    /// Corner radius of the image box.
    pub corner_radius: f64,
    /// Hairline border color.
    pub ring: Rgba,
    /// Drop shadow under the image box.
    pub shadow: ShadowSpec,
    /// Present when no image is available; rendered instead of pixels.
    pub placeholder: Option<PlaceholderBlock>,
}

/// Semantic role of a text block; the rasterizer treats all roles alike but
/// tests and debugging read them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    /// Item title.
    Title,
    /// Contributor line.
    Contributors,
    /// User tagline.
    Tagline,
    /// One sub-item line.
    ListEntry,
    /// Release-date line.
    Release,
    /// Track-count / duration line.
    Duration,
    /// Small-print label/copyright line.
    Copyright,
    /// Placeholder label.
    Placeholder,
}

/// A positioned run of styled text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Role of this block.
    pub role: TextRole,
    /// Top-left corner, in layout units.
    pub x: f64,
    /// Top-left corner, in layout units.
    pub y: f64,
    /// Wrap width.
    pub max_width: f64,
    /// Content, already upper-cased where the display rules demand it.
    pub text: String,
    /// Font size in layout units.
    pub size: f64,
    /// Font weight.
    pub weight: u16,
    /// Tracking in layout units.
    pub letter_spacing: f64,
    /// Fill color.
    pub color: Rgba,
}

/// The palette chip strip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChipRow {
    /// Strip bounds; chips divide the width evenly.
    pub rect: Rect,
    /// Chip fills, in palette order.
    pub colors: Vec<Rgba>,
    /// Gap between chips.
    pub gap: f64,
    /// Chip corner radius (half the height renders as a pill).
    pub corner_radius: f64,
    /// Hairline border color.
    pub ring: Rgba,
}

/// The decorative waveform strip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveformBlock {
    /// Strip bounds.
    pub rect: Rect,
    /// Normalized bar heights.
    pub bars: Vec<f64>,
    /// Bar color.
    pub color: Rgba,
    /// Gap between bars.
    pub bar_gap: f64,
    /// Minimum bar height.
    pub min_bar_height: f64,
    /// Bar corner radius.
    pub bar_radius: f64,
}

/// A complete, renderable poster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PosterScene {
    /// Layout-space width (always [`LAYOUT_WIDTH`]).
    pub width: f64,
    /// Layout-space height (width × 3/2).
    pub height: f64,
    /// Poster corner radius.
    pub corner_radius: f64,
    /// Bottom layer.
    pub background: BackgroundLayer,
    /// Hairline border at the poster edge, when framed.
    pub border: Option<Rgba>,
    /// The artwork region.
    pub artwork: ArtworkBlock,
    /// Palette strip, when a palette is available.
    pub chips: Option<ChipRow>,
    /// Waveform strip, when enabled and non-empty.
    pub waveform: Option<WaveformBlock>,
    /// All text content.
    pub texts: Vec<TextBlock>,
    /// Font family stack every block is shaped with.
    pub font_stack: String,
}

impl PosterScene {
    /// First text block with the given role, if any.
    pub fn text_with_role(&self, role: TextRole) -> Option<&TextBlock> {
        self.texts.iter().find(|t| t.role == role)
    }

    /// All text blocks with the given role.
    pub fn texts_with_role(&self, role: TextRole) -> impl Iterator<Item = &TextBlock> {
        self.texts.iter().filter(move |t| t.role == role)
    }
}
