//! The seam between the tiling pipeline and whatever decodes glyph outlines.
//!
//! The pipeline only ever asks two things of an engine: prepare a face at a pixel size,
//! and turn a glyph id into a flattened outline in pixels.

use sdf_outline_renderer::Outline;

use crate::error::{FontParseError, RasterizeError};
use crate::font::{FontFace, GlyphId};

#[cfg(feature = "freetype")]
mod ft;
mod ttf;

#[cfg(feature = "freetype")]
pub use self::ft::{FreetypeEngine, FreetypeFaceHandle};
pub use self::ttf::{TtfParserEngine, TtfParserFaceHandle};

/// A glyph outline scaled to pixels, with y pointing up from the baseline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphOutline {
    pub outline: Outline,
    /// The unrounded horizontal advance in px.
    pub advance: f64,
}

/// Produces per-face handles for outline decoding.
///
/// Engines are shared between worker threads; the handles they produce are not, so each
/// worker shapes its own.
pub trait OutlineEngine: Sync {
    type Handle<'a>: FaceHandle
    where
        Self: 'a;

    /// Prepares `face` for decoding at `size` px per em.
    fn shape_face<'a>(
        &self,
        face: &'a FontFace,
        size: u32,
    ) -> Result<Self::Handle<'a>, FontParseError>;
}

/// A face prepared for decoding at a fixed size.
pub trait FaceHandle {
    fn decode_outline(&self, glyph_id: GlyphId) -> Result<GlyphOutline, RasterizeError>;
}
