//! Derivation of concrete visual tokens from a [`StyleConfig`].
//!
//! `resolve` is a total, pure function: every enumerated choice maps to a
//! fixed token set, numeric fields are clamped, and the only cross-field
//! logic is the luminance-driven text contrast for custom backgrounds.

use serde::{Deserialize, Serialize};

use crate::style::color::Rgba;
use crate::style::config::{BackgroundMode, BlurIntensity, FrameStyle, StyleConfig};

/// Luminance above which a custom background gets the dark text set.
///
/// This constant is the single source of text-contrast decisions for custom
/// backgrounds; nothing else may pick light-vs-dark foregrounds.
pub const LUMINANCE_THRESHOLD: f64 = 0.64;

/// Foreground used on light backgrounds.
pub const TEXT_DARK: Rgba = Rgba::rgb(0x1a, 0x1a, 0x1a);
/// Foreground used on dark backgrounds.
pub const TEXT_LIGHT: Rgba = Rgba::rgb(0xf5, 0xf5, 0xf5);

/// Resolved background layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundSpec {
    /// Flat color fill.
    Solid {
        /// Fill color.
        color: Rgba,
    },
    /// The artwork, scaled to cover, gaussian-blurred and dimmed.
    BlurredArtwork {
        /// Blur radius in layout units.
        blur_radius: f64,
        /// Fill used when no artwork is available.
        fallback: Rgba,
    },
}

/// A drop-shadow description (offset-y / blur / opacity over black).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowSpec {
    /// Vertical offset in layout units.
    pub dy: f64,
    /// Blur radius in layout units.
    pub blur: f64,
    /// Opacity of the black shadow color.
    pub alpha: f64,
}

/// The full set of concrete visual tokens a poster is drawn with.
///
/// Recomputed on every config change; deriving it is cheap enough that no
/// caching beyond the caller's own memoization is needed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTheme {
    /// Background layer.
    pub background: BackgroundSpec,
    /// Primary text color.
    pub text: Rgba,
    /// Secondary text color.
    pub muted: Rgba,
    /// Tertiary text color (copyright line).
    pub subtle: Rgba,
    /// Hairline/border color.
    pub ring: Rgba,
    /// Placeholder/chip background fill.
    pub chip: Rgba,
    /// Poster-level shadow tokens.
    pub shadow: ShadowSpec,
    /// Black overlay opacity painted over blurred-artwork backgrounds.
    pub overlay_opacity: f64,
    /// Mat width around the content, in layout units.
    pub frame_pad: f64,
    /// Shadow tokens for the framed poster.
    pub frame_shadow: ShadowSpec,
    /// Whether a hairline border is drawn at the poster edge.
    pub frame_border: bool,
    /// Font family stack.
    pub font_stack: String,
    /// Title weight.
    pub weight_title: u16,
    /// Body weight, derived from the title weight.
    pub weight_body: u16,
    /// Emphasis weight, derived from the title weight.
    pub weight_strong: u16,
}

struct Surface {
    background: BackgroundSpec,
    text: Rgba,
    muted: Rgba,
    subtle: Rgba,
    ring: Rgba,
    chip: Rgba,
    shadow: ShadowSpec,
    overlay_opacity: f64,
}

const LIGHT_SHADOW: ShadowSpec = ShadowSpec {
    dy: 14.0,
    blur: 50.0,
    alpha: 0.25,
};
const DARK_SHADOW: ShadowSpec = ShadowSpec {
    dy: 14.0,
    blur: 50.0,
    alpha: 0.6,
};

fn light_surface(background_color: Rgba) -> Surface {
    Surface {
        background: BackgroundSpec::Solid {
            color: background_color,
        },
        text: TEXT_DARK,
        muted: Rgba::rgb(0x4a, 0x4a, 0x4a),
        subtle: Rgba::rgb(0x5a, 0x5a, 0x5a),
        ring: Rgba::rgb(0, 0, 0).with_opacity(0.06),
        chip: Rgba::rgb(0, 0, 0).with_opacity(0.06),
        shadow: LIGHT_SHADOW,
        overlay_opacity: 0.0,
    }
}

fn dark_surface(background: BackgroundSpec, chip: Rgba, overlay_opacity: f64) -> Surface {
    Surface {
        background,
        text: TEXT_LIGHT,
        muted: Rgba::rgb(255, 255, 255).with_opacity(0.86),
        subtle: Rgba::rgb(255, 255, 255).with_opacity(0.72),
        ring: Rgba::rgb(255, 255, 255).with_opacity(0.10),
        chip,
        shadow: DARK_SHADOW,
        overlay_opacity,
    }
}

fn blur_radius(intensity: BlurIntensity) -> f64 {
    match intensity {
        BlurIntensity::Light => 16.0,
        BlurIntensity::Medium => 28.0,
        BlurIntensity::Intense => 44.0,
    }
}

fn custom_surface(hex: Rgba) -> Surface {
    let text_is_dark = hex.relative_luminance() > LUMINANCE_THRESHOLD;
    if text_is_dark {
        Surface {
            ring: Rgba::rgb(0, 0, 0).with_opacity(0.08),
            ..light_surface(hex)
        }
    } else {
        dark_surface(
            BackgroundSpec::Solid { color: hex },
            Rgba::rgb(255, 255, 255).with_opacity(0.10),
            0.0,
        )
    }
}

/// Map a [`StyleConfig`] to the concrete token set it denotes.
pub fn resolve(config: &StyleConfig) -> ResolvedTheme {
    let surface = match &config.background {
        BackgroundMode::FlatLight => light_surface(Rgba::rgb(0xff, 0xff, 0xff)),
        BackgroundMode::FlatBeige => light_surface(Rgba::rgb(0xf5, 0xf0, 0xe8)),
        BackgroundMode::FlatDark => dark_surface(
            BackgroundSpec::Solid {
                color: Rgba::rgb(0x0f, 0x0f, 0x10),
            },
            Rgba::rgb(255, 255, 255).with_opacity(0.08),
            0.0,
        ),
        BackgroundMode::Custom { hex } => custom_surface(*hex),
        BackgroundMode::Blur { intensity } => dark_surface(
            BackgroundSpec::BlurredArtwork {
                blur_radius: blur_radius(*intensity),
                fallback: Rgba::rgb(0x15, 0x15, 0x18),
            },
            Rgba::rgb(0, 0, 0).with_opacity(0.25),
            0.35,
        ),
    };

    let (frame_pad, frame_shadow, frame_border) = match config.frame {
        FrameStyle::None => (0.0, surface.shadow, false),
        FrameStyle::Thin => (
            14.0,
            ShadowSpec {
                dy: 10.0,
                blur: 40.0,
                alpha: 0.25,
            },
            true,
        ),
        FrameStyle::Gallery => (
            28.0,
            ShadowSpec {
                dy: 18.0,
                blur: 60.0,
                alpha: 0.35,
            },
            true,
        ),
    };

    let title_weight = config.font.weight;
    ResolvedTheme {
        background: surface.background,
        text: surface.text,
        muted: surface.muted,
        subtle: surface.subtle,
        ring: surface.ring,
        chip: surface.chip,
        shadow: surface.shadow,
        overlay_opacity: surface.overlay_opacity,
        frame_pad: frame_pad * config.spacing(),
        frame_shadow,
        frame_border,
        font_stack: config.font.stack.clone(),
        weight_title: title_weight,
        weight_body: derived_body_weight(title_weight),
        weight_strong: derived_strong_weight(title_weight),
    }
}

/// Body weight: a step lighter than the title, kept within `300..=700`.
pub fn derived_body_weight(title: u16) -> u16 {
    title.saturating_sub(200).clamp(300, 700)
}

/// Emphasis weight: a step heavier than the title, kept within `600..=900`.
pub fn derived_strong_weight(title: u16) -> u16 {
    title.saturating_add(100).clamp(600, 900)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::config::{ColumnMode, LayoutRatio, PaletteShape};

    fn all_backgrounds() -> Vec<BackgroundMode> {
        vec![
            BackgroundMode::FlatLight,
            BackgroundMode::FlatBeige,
            BackgroundMode::FlatDark,
            BackgroundMode::Custom {
                hex: Rgba::rgb(0x11, 0x22, 0x33),
            },
            BackgroundMode::Blur {
                intensity: BlurIntensity::Light,
            },
            BackgroundMode::Blur {
                intensity: BlurIntensity::Medium,
            },
            BackgroundMode::Blur {
                intensity: BlurIntensity::Intense,
            },
        ]
    }

    #[test]
    fn resolve_is_total_over_the_enumerations() {
        for background in all_backgrounds() {
            for frame in [FrameStyle::None, FrameStyle::Thin, FrameStyle::Gallery] {
                for layout in [LayoutRatio::Split60_40, LayoutRatio::Split50_50] {
                    for shape in [
                        PaletteShape::Square,
                        PaletteShape::Rounded,
                        PaletteShape::Circle,
                    ] {
                        for radius in [0.0, 24.0] {
                            let cfg = StyleConfig {
                                background: background.clone(),
                                frame,
                                layout,
                                palette_shape: shape,
                                columns: ColumnMode::Auto,
                                corner_radius: radius,
                                ..StyleConfig::default()
                            };
                            let theme = resolve(&cfg);
                            assert!(!theme.font_stack.is_empty());
                            assert!(theme.weight_body >= 300);
                            assert!(theme.overlay_opacity >= 0.0);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn custom_background_contrast_at_extremes() {
        let white = resolve(&StyleConfig {
            background: BackgroundMode::Custom {
                hex: Rgba::rgb(255, 255, 255),
            },
            ..StyleConfig::default()
        });
        assert_eq!(white.text, TEXT_DARK);

        let black = resolve(&StyleConfig {
            background: BackgroundMode::Custom {
                hex: Rgba::rgb(0, 0, 0),
            },
            ..StyleConfig::default()
        });
        assert_eq!(black.text, TEXT_LIGHT);
    }

    #[test]
    fn custom_background_contrast_near_threshold() {
        // #d4d4d4 has luminance ~0.66 (just above), #c8c8c8 ~0.57 (just below).
        let above = resolve(&StyleConfig {
            background: BackgroundMode::Custom {
                hex: Rgba::rgb(0xd4, 0xd4, 0xd4),
            },
            ..StyleConfig::default()
        });
        assert_eq!(above.text, TEXT_DARK);

        let below = resolve(&StyleConfig {
            background: BackgroundMode::Custom {
                hex: Rgba::rgb(0xc8, 0xc8, 0xc8),
            },
            ..StyleConfig::default()
        });
        assert_eq!(below.text, TEXT_LIGHT);
    }

    #[test]
    fn frame_styles_map_to_fixed_pads() {
        let base = StyleConfig::default();
        assert_eq!(resolve(&base).frame_pad, 0.0);

        let thin = resolve(&StyleConfig {
            frame: FrameStyle::Thin,
            ..base.clone()
        });
        assert_eq!(thin.frame_pad, 14.0);
        assert!(thin.frame_border);

        let gallery = resolve(&StyleConfig {
            frame: FrameStyle::Gallery,
            spacing: 1.4,
            ..base
        });
        assert!((gallery.frame_pad - 28.0 * 1.4).abs() < 1e-9);
    }

    #[test]
    fn font_weight_triplet_derivation() {
        assert_eq!(derived_body_weight(800), 600);
        assert_eq!(derived_body_weight(300), 300);
        assert_eq!(derived_strong_weight(800), 900);
        assert_eq!(derived_strong_weight(400), 600);

        let theme = resolve(&StyleConfig::default());
        assert_eq!(theme.weight_title, 700);
        assert_eq!(theme.weight_body, 500);
        assert_eq!(theme.weight_strong, 800);
    }

    #[test]
    fn blur_modes_carry_overlay_and_radius_steps() {
        let theme = resolve(&StyleConfig {
            background: BackgroundMode::Blur {
                intensity: BlurIntensity::Intense,
            },
            ..StyleConfig::default()
        });
        assert_eq!(theme.overlay_opacity, 0.35);
        match theme.background {
            BackgroundSpec::BlurredArtwork { blur_radius, .. } => {
                assert_eq!(blur_radius, 44.0)
            }
            _ => panic!("expected blurred background"),
        }
    }
}
