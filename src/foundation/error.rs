//! Error taxonomy shared by every library API.

/// Convenience result type used across the crate.
pub type PosterResult<T> = Result<T, PosterError>;

/// Top-level error taxonomy used by the library APIs.
#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    /// Invalid user-provided configuration or catalog data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while rasterizing a composed poster scene.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while producing or delivering the export file.
    #[error("export error: {0}")]
    Export(String),

    /// Errors from the order/token store or its persistence layer.
    #[error("store error: {0}")]
    Store(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PosterError {
    /// Build a [`PosterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PosterError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PosterError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`PosterError::Store`] value.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_the_right_variant() {
        assert!(matches!(
            PosterError::validation("x"),
            PosterError::Validation(_)
        ));
        assert!(matches!(PosterError::export("x"), PosterError::Export(_)));
    }

    #[test]
    fn messages_carry_context() {
        let e = PosterError::render("glyph atlas exhausted");
        assert_eq!(e.to_string(), "render error: glyph atlas exhausted");
    }
}
