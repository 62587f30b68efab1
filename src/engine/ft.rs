use std::rc::Rc;

use freetype::face::LoadFlag;
use freetype::outline::Curve;
use freetype::{Face, Library, Vector};
use sdf_outline_renderer::OutlineBuilder;

use crate::engine::{FaceHandle, GlyphOutline, OutlineEngine};
use crate::error::{FontParseError, RasterizeError};
use crate::font::{FontFace, GlyphId};

/// Decodes unhinted outlines with FreeType.
///
/// FreeType libraries can't be shared between threads, so every handle owns its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreetypeEngine;

pub struct FreetypeFaceHandle {
    // Declared before the library so that it is dropped first
    face: Face,
    _library: Library,
}

impl OutlineEngine for FreetypeEngine {
    type Handle<'a> = FreetypeFaceHandle;

    fn shape_face<'a>(
        &self,
        face: &'a FontFace,
        size: u32,
    ) -> Result<FreetypeFaceHandle, FontParseError> {
        let engine_error = |e: freetype::Error| FontParseError::Engine(e.to_string());

        let library = Library::init().map_err(engine_error)?;
        let ft_face = library
            .new_memory_face(Rc::new(face.data().to_vec()), face.index() as isize)
            .map_err(engine_error)?;

        // FreeType conventions: char width of zero means "same as the height" and
        // resolutions of zero mean the default of 72 dpi, so 1pt == 1px.
        ft_face
            .set_char_size(0, (size << 6) as isize, 0, 0)
            .map_err(engine_error)?;

        Ok(FreetypeFaceHandle {
            face: ft_face,
            _library: library,
        })
    }
}

fn px(v: Vector) -> (f64, f64) {
    // 26.6 fixed point
    (v.x as f64 / 64.0, v.y as f64 / 64.0)
}

impl FaceHandle for FreetypeFaceHandle {
    fn decode_outline(&self, glyph_id: GlyphId) -> Result<GlyphOutline, RasterizeError> {
        self.face.load_glyph(
            u32::from(glyph_id.0),
            LoadFlag::NO_HINTING | LoadFlag::NO_BITMAP,
        )?;

        let glyph = self.face.glyph();
        let mut builder = OutlineBuilder::default();
        if let Some(outline) = glyph.outline() {
            for contour in outline.contours_iter() {
                let (x, y) = px(*contour.start());
                builder.move_to(x, y);
                for curve in contour {
                    match curve {
                        Curve::Line(p) => {
                            let (x, y) = px(p);
                            builder.line_to(x, y);
                        }
                        Curve::Bezier2(c, p) => {
                            let ((cx, cy), (x, y)) = (px(c), px(p));
                            builder.quad_to(cx, cy, x, y);
                        }
                        Curve::Bezier3(c1, c2, p) => {
                            let ((c1x, c1y), (c2x, c2y), (x, y)) = (px(c1), px(c2), px(p));
                            builder.curve_to(c1x, c1y, c2x, c2y, x, y);
                        }
                    }
                }
                builder.close();
            }
        }

        Ok(GlyphOutline {
            outline: builder.finish(),
            advance: glyph.metrics().horiAdvance as f64 / 64.0,
        })
    }
}
