//! Parley-backed text shaping.
//!
//! The engine is created once per rasterizer and reused across blocks; fonts
//! are resolved before any painting happens, so no glyph is rasterized with a
//! substitute that a later load would replace.

use std::borrow::Cow;

use crate::foundation::error::{PosterError, PosterResult};

/// RGBA8 brush carried through Parley styling to the painter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Stateful helper for building Parley layouts.
pub(crate) struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    /// Construct an engine backed by the system font collection.
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register raw font bytes and return the primary family name, which can
    /// then be put at the front of a family stack.
    pub(crate) fn register_font(&mut self, font_bytes: Vec<u8>) -> PosterResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| PosterError::validation("no font families registered from font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PosterError::validation("registered font family has no name"))?
            .to_string();
        Ok(name)
    }

    /// Shape and lay out plain text against a family stack.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn layout(
        &mut self,
        text: &str,
        family_stack: &str,
        size_px: f32,
        weight: u16,
        letter_spacing_px: f32,
        brush: TextBrush,
        max_width_px: Option<f32>,
        alignment: parley::Alignment,
    ) -> PosterResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PosterError::validation("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family_stack.to_owned())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(weight)),
        ));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            letter_spacing_px,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(Some(w), alignment, parley::AlignmentOptions::default());
        } else {
            layout.break_all_lines(None);
        }
        Ok(layout)
    }
}
