//! The layout composer.
//!
//! `compose` is a pure derivation: catalog metadata + resolved theme +
//! palette + waveform + config in, a [`PosterScene`] out. All coordinates are
//! layout units on a 1000-wide, 2:3 canvas; the rasterizer scales the scene
//! to the export resolution.

use kurbo::Rect;

use crate::catalog::model::{CatalogItem, ItemKind, format_release_date, format_total_duration};
use crate::compose::model::{
    ArtworkBlock, BackgroundLayer, ChipRow, ImageFit, PlaceholderBlock, PosterScene, TextBlock,
    TextRole, WaveformBlock, LAYOUT_WIDTH,
};
use crate::foundation::core::AspectRatio;
use crate::style::color::Rgba;
use crate::style::config::{ColumnMode, PaletteShape, StyleConfig};
use crate::style::resolve::{BackgroundSpec, ResolvedTheme, ShadowSpec};

/// Poster corner radius, layout units.
const POSTER_CORNER_RADIUS: f64 = 16.0;
/// Horizontal inset shared by both regions so their edges align.
const INSET_X: f64 = 42.0;
/// Gap above the artwork box.
const ART_TOP_PAD: f64 = 52.0;
/// Gap between the artwork region bottom and the info content.
const INFO_TOP_PAD: f64 = 62.0;
/// Gap under the info content.
const INFO_BOTTOM_PAD: f64 = 32.0;
/// Gap between the tracklist column and the info column.
const COLUMN_GAP: f64 = 40.0;
/// Gap between the two tracklist sub-columns.
const LIST_COLUMN_GAP: f64 = 18.0;
/// Palette chip strip height.
const CHIP_HEIGHT: f64 = 56.0;
/// Gap between palette chips.
const CHIP_GAP: f64 = 7.0;

const TITLE_SIZE: f64 = 36.0;
const CONTRIBUTORS_SIZE: f64 = 25.0;
const TAGLINE_SIZE: f64 = 21.0;
const RELEASE_SIZE: f64 = 26.0;
const DURATION_SIZE: f64 = 21.0;
const COPYRIGHT_SIZE: f64 = 11.0;

/// Line height multiplier used for height estimation and list flow.
const LINE_HEIGHT: f64 = 1.3;
/// Extra leading between tracklist lines.
const LIST_LINE_HEIGHT: f64 = 1.45;
/// Average glyph advance as a fraction of the font size, for wrap estimates.
const AVG_CHAR_FACTOR: f64 = 0.56;

/// Sub-item listing density, selected from the item count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityTier {
    /// Up to 13 entries: single relaxed column.
    Few,
    /// 14–24 entries: two columns.
    Medium,
    /// 25–36 entries: two tighter columns.
    Many,
    /// 37+ entries: two dense columns.
    Dense,
}

impl DensityTier {
    /// Column count in auto mode.
    pub fn columns(self) -> usize {
        match self {
            Self::Few => 1,
            _ => 2,
        }
    }

    /// Entry font size in layout units.
    pub fn font_size(self) -> f64 {
        match self {
            Self::Few => 22.0,
            Self::Medium => 19.0,
            Self::Many => 16.5,
            Self::Dense => 14.5,
        }
    }
}

/// Tier for a sub-item count. Boundaries: ≤13, 14–24, 25–36, 37+.
pub fn density_tier(count: usize) -> DensityTier {
    match count {
        0..=13 => DensityTier::Few,
        14..=24 => DensityTier::Medium,
        25..=36 => DensityTier::Many,
        _ => DensityTier::Dense,
    }
}

/// Waveform strip dimensions for a sub-item count (shrinks as the listing
/// grows so the right column keeps breathing room).
fn waveform_size(count: usize) -> (f64, f64) {
    match count {
        0..=14 => (316.0, 42.0),
        15..=20 => (302.0, 40.0),
        21..=28 => (290.0, 37.0),
        _ => (276.0, 34.0),
    }
}

fn estimate_text_height(text: &str, size: f64, max_width: f64) -> f64 {
    let chars_per_line = (max_width / (size * AVG_CHAR_FACTOR)).floor().max(1.0);
    let lines = (text.chars().count() as f64 / chars_per_line).ceil().max(1.0);
    lines * size * LINE_HEIGHT
}

/// Compose a renderable poster from its inputs.
pub fn compose(
    item: &CatalogItem,
    theme: &ResolvedTheme,
    palette: &[Rgba],
    waveform_data: &[f64],
    config: &StyleConfig,
) -> PosterScene {
    let spacing = config.spacing();
    let width = LAYOUT_WIDTH;
    let height = AspectRatio::POSTER.height_for_width(width);

    let frame_pad = theme.frame_pad;
    let content = Rect::new(frame_pad, frame_pad, width - frame_pad, height - frame_pad);
    let inset = INSET_X * spacing;

    let background = match theme.background {
        BackgroundSpec::Solid { color } => BackgroundLayer::Solid { color },
        BackgroundSpec::BlurredArtwork {
            blur_radius,
            fallback,
        } => BackgroundLayer::BlurredArtwork {
            blur_radius,
            overlay_opacity: theme.overlay_opacity,
            fallback,
        },
    };

    // Artwork region.
    let art_region_bottom = content.y0 + content.height() * config.layout.artwork_fraction();
    let artwork_rect = Rect::new(
        content.x0 + inset,
        content.y0 + ART_TOP_PAD * spacing,
        content.x1 - inset,
        art_region_bottom,
    );
    let placeholder = if item.artwork_url.is_none() {
        Some(PlaceholderBlock {
            label: "NO ARTWORK AVAILABLE".to_owned(),
            color: theme.text,
            background: theme.chip,
        })
    } else {
        None
    };
    let artwork = ArtworkBlock {
        rect: artwork_rect,
        fit: ImageFit::Cover,
        corner_radius: config.corner_radius(),
        ring: theme.ring,
        shadow: ShadowSpec {
            dy: 6.0,
            blur: 18.0,
            alpha: 0.18,
        },
        placeholder,
    };

    // Info region: listing on the left, palette + titles + facts on the right.
    let info_top = art_region_bottom + INFO_TOP_PAD * spacing;
    let info_bottom = content.y1 - INFO_BOTTOM_PAD * spacing;
    let column_gap = COLUMN_GAP * spacing;
    let column_width = (content.width() - 2.0 * inset - column_gap) / 2.0;
    let left_x = content.x0 + inset;
    let right_x = left_x + column_width + column_gap;

    let mut texts = Vec::new();
    flow_listing(
        item,
        theme,
        config,
        &mut texts,
        Rect::new(left_x, info_top, left_x + column_width, info_bottom),
    );

    // Right column, top-down part.
    let mut y = info_top;
    let chips = (!palette.is_empty()).then(|| {
        let chip_height = CHIP_HEIGHT * spacing;
        let row = ChipRow {
            rect: Rect::new(right_x, y, right_x + column_width, y + chip_height),
            colors: palette.to_vec(),
            gap: CHIP_GAP,
            corner_radius: match config.palette_shape {
                PaletteShape::Square => 0.0,
                PaletteShape::Rounded => 5.0,
                PaletteShape::Circle => chip_height / 2.0,
            },
            ring: theme.ring,
        };
        y += chip_height + 26.0 * spacing;
        row
    });

    let title = item.title.to_uppercase();
    texts.push(TextBlock {
        role: TextRole::Title,
        x: right_x,
        y,
        max_width: column_width,
        size: TITLE_SIZE,
        weight: theme.weight_title,
        letter_spacing: 0.66,
        color: theme.text,
        text: title.clone(),
    });
    y += estimate_text_height(&title, TITLE_SIZE, column_width) + 8.0 * spacing;

    let contributors = item.contributors_line().to_uppercase();
    if !contributors.is_empty() {
        texts.push(TextBlock {
            role: TextRole::Contributors,
            x: right_x,
            y,
            max_width: column_width,
            size: CONTRIBUTORS_SIZE,
            weight: theme.weight_body,
            letter_spacing: 0.4,
            color: theme.muted,
            text: contributors.clone(),
        });
        y += estimate_text_height(&contributors, CONTRIBUTORS_SIZE, column_width) + 6.0 * spacing;
    }

    let tagline = config.tagline();
    if !tagline.is_empty() {
        texts.push(TextBlock {
            role: TextRole::Tagline,
            x: right_x,
            y,
            max_width: column_width,
            size: TAGLINE_SIZE,
            weight: theme.weight_body,
            letter_spacing: 0.26,
            color: theme.muted,
            text: tagline.to_owned(),
        });
    }

    // Right column, bottom-anchored part.
    let mut cursor = info_bottom;

    if config.show_copyright
        && let Some(descriptor) = &item.descriptor
    {
        let text = descriptor.to_uppercase();
        let h = estimate_text_height(&text, COPYRIGHT_SIZE, column_width);
        cursor -= h;
        texts.push(TextBlock {
            role: TextRole::Copyright,
            x: right_x,
            y: cursor,
            max_width: column_width,
            size: COPYRIGHT_SIZE,
            weight: theme.weight_body,
            letter_spacing: 0.26,
            color: theme.subtle,
            text,
        });
        cursor -= 12.0 * spacing;
    }

    if config.show_duration && !item.sub_items.is_empty() {
        let noun = match item.kind {
            ItemKind::Album => "TRACKS",
            ItemKind::Movie => "CAST",
        };
        let total_ms = item.total_duration_ms();
        let text = if total_ms > 0 {
            format!(
                "{} {noun}, {}",
                item.sub_items.len(),
                format_total_duration(total_ms)
            )
        } else {
            format!("{} {noun}", item.sub_items.len())
        };
        cursor -= DURATION_SIZE * LINE_HEIGHT;
        texts.push(TextBlock {
            role: TextRole::Duration,
            x: right_x,
            y: cursor,
            max_width: column_width,
            size: DURATION_SIZE,
            weight: theme.weight_strong,
            letter_spacing: 0.66,
            color: theme.muted,
            text,
        });
        cursor -= 8.0 * spacing;
    }

    if let Some(date) = &item.release_date {
        let prefix = match item.kind {
            ItemKind::Album => "OUT NOW / ",
            ItemKind::Movie => "RELEASED / ",
        };
        cursor -= RELEASE_SIZE * LINE_HEIGHT;
        texts.push(TextBlock {
            role: TextRole::Release,
            x: right_x,
            y: cursor,
            max_width: column_width,
            size: RELEASE_SIZE,
            weight: theme.weight_strong,
            letter_spacing: 0.8,
            color: theme.text,
            text: format!("{prefix}{}", format_release_date(date)),
        });
        cursor -= 16.0 * spacing;
    }

    let waveform = (config.show_waveform && !waveform_data.is_empty()).then(|| {
        let (wf_width, wf_height) = waveform_size(item.sub_items.len());
        let wf_width = wf_width.min(column_width);
        cursor -= wf_height;
        WaveformBlock {
            rect: Rect::new(right_x, cursor, right_x + wf_width, cursor + wf_height),
            bars: waveform_data.to_vec(),
            color: theme.muted,
            bar_gap: 1.3,
            min_bar_height: 2.6,
            bar_radius: 1.3,
        }
    });

    PosterScene {
        width,
        height,
        corner_radius: POSTER_CORNER_RADIUS,
        background,
        border: theme.frame_border.then_some(theme.ring),
        artwork,
        chips,
        waveform,
        texts,
        font_stack: theme.font_stack.clone(),
    }
}

/// Flow the sub-item listing into its column(s), dropping lines that would
/// overflow the region (the listing is clipped, never resized past its tier).
fn flow_listing(
    item: &CatalogItem,
    theme: &ResolvedTheme,
    config: &StyleConfig,
    texts: &mut Vec<TextBlock>,
    region: Rect,
) {
    if item.sub_items.is_empty() {
        return;
    }

    let tier = density_tier(item.sub_items.len());
    let columns = match config.columns {
        ColumnMode::Auto => tier.columns(),
        ColumnMode::ForcedOne => 1,
        ColumnMode::ForcedTwo => 2,
    };
    let font_size = tier.font_size();
    let line_height = font_size * LIST_LINE_HEIGHT;

    let list_gap = if columns > 1 { LIST_COLUMN_GAP } else { 0.0 };
    let column_width = (region.width() - list_gap * (columns as f64 - 1.0)) / columns as f64;
    let max_rows = ((region.height() / line_height).floor() as usize).max(1);
    let rows = item.sub_items.len().div_ceil(columns).min(max_rows);

    for (idx, sub) in item.sub_items.iter().enumerate() {
        let column = idx / rows;
        if column >= columns {
            break;
        }
        let row = idx % rows;
        texts.push(TextBlock {
            role: TextRole::ListEntry,
            x: region.x0 + column as f64 * (column_width + list_gap),
            y: region.y0 + row as f64 * line_height,
            max_width: column_width,
            size: font_size,
            weight: theme.weight_body,
            letter_spacing: 0.2,
            color: theme.text,
            text: format!("{}  {}", sub.number, sub.title.to_uppercase()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::SubItem;
    use crate::style::config::{BackgroundMode, FrameStyle, LayoutRatio};
    use crate::style::resolve::resolve;

    fn item_with_tracks(n: usize) -> CatalogItem {
        CatalogItem {
            id: "it".into(),
            title: "Midnight Geometry".into(),
            contributors: vec!["The Axioms".into()],
            release_date: Some("2024-01-15".into()),
            sub_items: (1..=n as u32)
                .map(|i| SubItem {
                    number: i,
                    title: format!("Piece {i}"),
                    duration_ms: Some(180_000 + u64::from(i) * 5_000),
                })
                .collect(),
            artwork_url: Some("art.png".into()),
            descriptor: Some("Axiom Records".into()),
            ..CatalogItem::default()
        }
    }

    fn scene_for(n: usize, config: &StyleConfig) -> PosterScene {
        let theme = resolve(config);
        let palette = crate::palette::FALLBACK_PALETTE.to_vec();
        let waveform = crate::waveform::generate(&item_with_tracks(n).sub_items, 120);
        compose(&item_with_tracks(n), &theme, &palette, &waveform, config)
    }

    fn list_columns(scene: &PosterScene) -> usize {
        let xs: std::collections::BTreeSet<i64> = scene
            .texts_with_role(TextRole::ListEntry)
            .map(|t| t.x.round() as i64)
            .collect();
        xs.len()
    }

    #[test]
    fn density_tier_boundaries() {
        assert_eq!(density_tier(13), DensityTier::Few);
        assert_eq!(density_tier(14), DensityTier::Medium);
        assert_eq!(density_tier(24), DensityTier::Medium);
        assert_eq!(density_tier(25), DensityTier::Many);
        assert_eq!(density_tier(36), DensityTier::Many);
        assert_eq!(density_tier(37), DensityTier::Dense);
    }

    #[test]
    fn auto_mode_column_counts_follow_the_tier() {
        let config = StyleConfig::default();
        assert_eq!(list_columns(&scene_for(13, &config)), 1);
        assert_eq!(list_columns(&scene_for(14, &config)), 2);
        assert_eq!(list_columns(&scene_for(37, &config)), 2);
    }

    #[test]
    fn forced_column_modes_win_over_the_tier() {
        let one = StyleConfig {
            columns: ColumnMode::ForcedOne,
            ..StyleConfig::default()
        };
        assert_eq!(list_columns(&scene_for(30, &one)), 1);

        let two = StyleConfig {
            columns: ColumnMode::ForcedTwo,
            ..StyleConfig::default()
        };
        assert_eq!(list_columns(&scene_for(5, &two)), 2);
    }

    #[test]
    fn fonts_shrink_with_density() {
        assert!(DensityTier::Few.font_size() > DensityTier::Medium.font_size());
        assert!(DensityTier::Medium.font_size() > DensityTier::Many.font_size());
        assert!(DensityTier::Many.font_size() > DensityTier::Dense.font_size());
    }

    #[test]
    fn regions_share_horizontal_insets() {
        let scene = scene_for(10, &StyleConfig::default());
        let first_entry = scene.text_with_role(TextRole::ListEntry).unwrap();
        assert!((scene.artwork.rect.x0 - first_entry.x).abs() < 1e-9);
    }

    #[test]
    fn layout_ratio_moves_the_region_split() {
        let a = scene_for(10, &StyleConfig::default());
        let b = scene_for(
            10,
            &StyleConfig {
                layout: LayoutRatio::Split50_50,
                ..StyleConfig::default()
            },
        );
        assert!(a.artwork.rect.y1 > b.artwork.rect.y1);
    }

    #[test]
    fn display_text_is_uppercased() {
        let scene = scene_for(3, &StyleConfig::default());
        assert_eq!(
            scene.text_with_role(TextRole::Title).unwrap().text,
            "MIDNIGHT GEOMETRY"
        );
        assert_eq!(
            scene.text_with_role(TextRole::Contributors).unwrap().text,
            "THE AXIOMS"
        );
        assert!(
            scene
                .text_with_role(TextRole::ListEntry)
                .unwrap()
                .text
                .ends_with("PIECE 1")
        );
    }

    #[test]
    fn missing_artwork_produces_a_placeholder() {
        let mut item = item_with_tracks(5);
        item.artwork_url = None;
        let config = StyleConfig::default();
        let theme = resolve(&config);
        let scene = compose(&item, &theme, &[], &[], &config);
        assert!(scene.artwork.placeholder.is_some());
        assert!(scene.chips.is_none());
    }

    #[test]
    fn toggles_remove_their_rows() {
        let config = StyleConfig {
            show_duration: false,
            show_copyright: false,
            show_waveform: false,
            ..StyleConfig::default()
        };
        let scene = scene_for(8, &config);
        assert!(scene.text_with_role(TextRole::Duration).is_none());
        assert!(scene.text_with_role(TextRole::Copyright).is_none());
        assert!(scene.waveform.is_none());
    }

    #[test]
    fn framed_posters_carry_a_border_and_pad() {
        let config = StyleConfig {
            frame: FrameStyle::Gallery,
            ..StyleConfig::default()
        };
        let scene = scene_for(8, &config);
        assert!(scene.border.is_some());
        assert!(scene.artwork.rect.x0 > INSET_X);
    }

    #[test]
    fn blur_background_carries_overlay() {
        let config = StyleConfig {
            background: BackgroundMode::Blur {
                intensity: crate::style::config::BlurIntensity::Medium,
            },
            ..StyleConfig::default()
        };
        let scene = scene_for(8, &config);
        match scene.background {
            BackgroundLayer::BlurredArtwork {
                overlay_opacity, ..
            } => assert_eq!(overlay_opacity, 0.35),
            _ => panic!("expected blurred background"),
        }
    }
}
