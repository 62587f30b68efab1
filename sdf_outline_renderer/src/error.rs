use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdfGlyphError {
    #[error("The SDF radius must be at least 1px.")]
    InvalidRadius,

    #[error("Glyph bitmap of {0}x{1}px exceeds the maximum supported size.")]
    GlyphTooLarge(usize, usize),

    #[error("Cutoff values must be between 0 and 1 (both non-inclusive), but {0} was provided.")]
    InvalidCutoff(f64),
}
