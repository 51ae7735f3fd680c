//! The user-tunable style surface.
//!
//! Every choice is an independent field; unknown enum values in JSON fail
//! closed to their documented defaults, numerics clamp instead of erroring.

use serde::{Deserialize, Serialize};

use crate::style::color::Rgba;

/// Upper bound for [`StyleConfig::corner_radius`], in layout units.
pub const CORNER_RADIUS_MAX: f64 = 24.0;
/// Lower bound for [`StyleConfig::spacing`].
pub const SPACING_MIN: f64 = 0.8;
/// Upper bound for [`StyleConfig::spacing`].
pub const SPACING_MAX: f64 = 1.4;
/// Maximum tagline length kept for display, in characters.
pub const TAGLINE_MAX_CHARS: usize = 80;

/// Lenient deserialization for unit-variant style enums: an unrecognized
/// value falls back to the documented default instead of failing the whole
/// config parse.
macro_rules! lenient_unit_enum {
    ($ty:ident { $($json:literal => $variant:ident),+ $(,)? }) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(match s.as_str() {
                    $($json => Self::$variant,)+
                    _ => Self::default(),
                })
            }
        }
    };
}

/// Poster background selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Plain white background with the dark text set.
    #[default]
    FlatLight,
    /// Warm paper tone with the dark text set.
    FlatBeige,
    /// Near-black background with the light text set.
    FlatDark,
    /// Caller-chosen flat color; the text set is derived from its luminance.
    Custom {
        /// Background fill color.
        hex: Rgba,
    },
    /// The artwork itself, blurred and dimmed, behind the content.
    Blur {
        /// How strong the gaussian blur is.
        intensity: BlurIntensity,
    },
}

impl<'de> Deserialize<'de> for BackgroundMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum Tagged {
            Custom {
                hex: Rgba,
            },
            Blur {
                #[serde(default)]
                intensity: BlurIntensity,
            },
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Unit(String),
            Tagged(Tagged),
            // Anything else (wrong shape, unknown tag) fails closed below.
            Unknown(serde::de::IgnoredAny),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Unit(s) => match s.as_str() {
                "flat_light" => Self::FlatLight,
                "flat_beige" => Self::FlatBeige,
                "flat_dark" => Self::FlatDark,
                // Bare "blur" selects the light step.
                "blur" => Self::Blur {
                    intensity: BlurIntensity::Light,
                },
                _ => Self::default(),
            },
            Repr::Tagged(Tagged::Custom { hex }) => Self::Custom { hex },
            Repr::Tagged(Tagged::Blur { intensity }) => Self::Blur { intensity },
            Repr::Unknown(_) => Self::default(),
        })
    }
}

/// Blur strength steps for [`BackgroundMode::Blur`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurIntensity {
    /// Soft wash, artwork still recognizable.
    #[default]
    Light,
    /// Medium diffusion.
    Medium,
    /// Heavy diffusion, artwork reads as a color field.
    Intense,
}

lenient_unit_enum!(BlurIntensity {
    "light" => Light,
    "medium" => Medium,
    "intense" => Intense,
});

/// Frame treatment around the poster content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStyle {
    /// Content bleeds to the poster edge.
    #[default]
    None,
    /// Narrow mat.
    Thin,
    /// Wide gallery mat.
    Gallery,
}

lenient_unit_enum!(FrameStyle {
    "none" => None,
    "thin" => Thin,
    "gallery" => Gallery,
});

/// Vertical split between the artwork region and the info region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutRatio {
    /// 60% artwork / 40% info.
    #[default]
    Split60_40,
    /// Even 50/50 split.
    Split50_50,
}

lenient_unit_enum!(LayoutRatio {
    "split60_40" => Split60_40,
    "split50_50" => Split50_50,
});

impl LayoutRatio {
    /// Fraction of the content height given to the artwork region.
    pub fn artwork_fraction(self) -> f64 {
        match self {
            Self::Split60_40 => 0.6,
            Self::Split50_50 => 0.5,
        }
    }
}

/// Corner treatment of the palette chips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteShape {
    /// Hard corners.
    Square,
    /// Slightly rounded corners.
    #[default]
    Rounded,
    /// Fully rounded (pill) chips.
    Circle,
}

lenient_unit_enum!(PaletteShape {
    "square" => Square,
    "rounded" => Rounded,
    "circle" => Circle,
});

/// Column selection for the sub-item listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMode {
    /// Pick columns and font tier from the sub-item count.
    #[default]
    Auto,
    /// Always a single column, regardless of count.
    ForcedOne,
    /// Always two columns, regardless of count.
    ForcedTwo,
}

lenient_unit_enum!(ColumnMode {
    "auto" => Auto,
    "forced_one" => ForcedOne,
    "forced_two" => ForcedTwo,
});

/// Typography selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// CSS-style family stack handed to the shaper.
    pub stack: String,
    /// Title weight; body and strong weights are derived from it.
    pub weight: u16,
    /// Optional font file (relative to the assets root) registered before
    /// falling back to system families.
    pub source: Option<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            stack: "Inter, Helvetica Neue, Arial, sans-serif".to_owned(),
            weight: 700,
            source: None,
        }
    }
}

/// The complete set of user-tunable poster choices.
///
/// Every field is independent of the others; the only cross-field derivation
/// is the luminance-based text contrast for [`BackgroundMode::Custom`], which
/// happens in [`resolve`](crate::style::resolve::resolve). Out-of-range
/// numerics are clamped by the accessors rather than rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Background selection.
    pub background: BackgroundMode,
    /// Frame treatment.
    pub frame: FrameStyle,
    /// Artwork/info height split.
    pub layout: LayoutRatio,
    /// Artwork corner radius in layout units, clamped to `0..=24`.
    pub corner_radius: f64,
    /// Free-text line under the artist names, truncated to 80 chars.
    pub tagline: String,
    /// Show the track-count/total-duration row.
    pub show_duration: bool,
    /// Show the label/copyright line.
    pub show_copyright: bool,
    /// Show the synthetic waveform.
    pub show_waveform: bool,
    /// Palette chip corner treatment.
    pub palette_shape: PaletteShape,
    /// Sub-item listing column selection.
    pub columns: ColumnMode,
    /// Global spacing multiplier, clamped to `0.8..=1.4`.
    pub spacing: f64,
    /// Typography selection.
    pub font: FontConfig,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: BackgroundMode::default(),
            frame: FrameStyle::default(),
            layout: LayoutRatio::default(),
            corner_radius: 12.0,
            tagline: String::new(),
            show_duration: true,
            show_copyright: true,
            show_waveform: true,
            palette_shape: PaletteShape::default(),
            columns: ColumnMode::default(),
            spacing: 1.0,
            font: FontConfig::default(),
        }
    }
}

impl StyleConfig {
    /// Corner radius clamped to its declared bounds.
    pub fn corner_radius(&self) -> f64 {
        if self.corner_radius.is_finite() {
            self.corner_radius.clamp(0.0, CORNER_RADIUS_MAX)
        } else {
            0.0
        }
    }

    /// Spacing multiplier clamped to its declared bounds.
    pub fn spacing(&self) -> f64 {
        if self.spacing.is_finite() {
            self.spacing.clamp(SPACING_MIN, SPACING_MAX)
        } else {
            1.0
        }
    }

    /// Tagline truncated to the display limit, trimmed.
    pub fn tagline(&self) -> &str {
        let trimmed = self.tagline.trim();
        match trimmed.char_indices().nth(TAGLINE_MAX_CHARS) {
            Some((byte_idx, _)) => &trimmed[..byte_idx],
            None => trimmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_flat_light_auto() {
        let cfg = StyleConfig::default();
        assert_eq!(cfg.background, BackgroundMode::FlatLight);
        assert_eq!(cfg.columns, ColumnMode::Auto);
        assert_eq!(cfg.corner_radius(), 12.0);
    }

    #[test]
    fn numeric_fields_clamp_instead_of_erroring() {
        let cfg = StyleConfig {
            corner_radius: 99.0,
            spacing: 0.1,
            ..StyleConfig::default()
        };
        assert_eq!(cfg.corner_radius(), CORNER_RADIUS_MAX);
        assert_eq!(cfg.spacing(), SPACING_MIN);

        let cfg = StyleConfig {
            corner_radius: f64::NAN,
            spacing: f64::INFINITY,
            ..StyleConfig::default()
        };
        assert_eq!(cfg.corner_radius(), 0.0);
        assert_eq!(cfg.spacing(), SPACING_MAX);
    }

    #[test]
    fn tagline_is_truncated_to_limit() {
        let cfg = StyleConfig {
            tagline: "x".repeat(200),
            ..StyleConfig::default()
        };
        assert_eq!(cfg.tagline().chars().count(), TAGLINE_MAX_CHARS);
    }

    #[test]
    fn json_shapes_parse() {
        let cfg: StyleConfig = serde_json::from_value(json!({
            "background": { "custom": { "hex": "#112233" } },
            "frame": "gallery",
            "layout": "split50_50",
            "columns": "forced_two",
            "corner_radius": 8,
        }))
        .unwrap();
        assert_eq!(
            cfg.background,
            BackgroundMode::Custom {
                hex: Rgba::rgb(0x11, 0x22, 0x33)
            }
        );
        assert_eq!(cfg.frame, FrameStyle::Gallery);
        assert_eq!(cfg.layout, LayoutRatio::Split50_50);
        assert_eq!(cfg.columns, ColumnMode::ForcedTwo);
        // Omitted fields come from the defaults.
        assert!(cfg.show_waveform);
    }

    #[test]
    fn unknown_values_fail_closed_to_defaults() {
        let cfg: StyleConfig = serde_json::from_value(json!({
            "background": "plasma",
            "frame": "baroque",
            "columns": "forced_five",
        }))
        .unwrap();
        assert_eq!(cfg.background, BackgroundMode::FlatLight);
        assert_eq!(cfg.frame, FrameStyle::None);
        assert_eq!(cfg.columns, ColumnMode::Auto);
    }

    #[test]
    fn bare_blur_selects_light_step() {
        let cfg: StyleConfig =
            serde_json::from_value(json!({ "background": "blur" })).unwrap();
        assert_eq!(
            cfg.background,
            BackgroundMode::Blur {
                intensity: BlurIntensity::Light
            }
        );
    }
}
