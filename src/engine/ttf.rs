use sdf_outline_renderer::OutlineBuilder;

use crate::engine::{FaceHandle, GlyphOutline, OutlineEngine};
use crate::error::{FontParseError, RasterizeError};
use crate::font::{FontFace, GlyphId};

/// Decodes outlines with `ttf-parser`. Pure Rust, and the default engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct TtfParserEngine;

pub struct TtfParserFaceHandle<'a> {
    face: ttf_parser::Face<'a>,
    scale: f64,
}

impl OutlineEngine for TtfParserEngine {
    type Handle<'a> = TtfParserFaceHandle<'a>;

    fn shape_face<'a>(
        &self,
        face: &'a FontFace,
        size: u32,
    ) -> Result<TtfParserFaceHandle<'a>, FontParseError> {
        let parsed = ttf_parser::Face::parse(face.data(), face.index())
            .map_err(|e| FontParseError::Engine(e.to_string()))?;
        let scale = f64::from(size) / f64::from(parsed.units_per_em());

        Ok(TtfParserFaceHandle {
            face: parsed,
            scale,
        })
    }
}

impl FaceHandle for TtfParserFaceHandle<'_> {
    fn decode_outline(&self, glyph_id: GlyphId) -> Result<GlyphOutline, RasterizeError> {
        if glyph_id.0 >= self.face.number_of_glyphs() {
            return Err(RasterizeError::Decode {
                glyph_id: glyph_id.0,
                reason: "glyph id is out of range".to_string(),
            });
        }

        let id = ttf_parser::GlyphId(glyph_id.0);
        let mut builder = ScaledBuilder {
            inner: OutlineBuilder::default(),
            scale: self.scale,
        };
        if self.face.outline_glyph(id, &mut builder).is_none() {
            if let Some(reason) = self.undecodable(id) {
                return Err(RasterizeError::Decode {
                    glyph_id: glyph_id.0,
                    reason,
                });
            }
        }

        let advance =
            self.face
                .glyph_hor_advance(id)
                .ok_or_else(|| RasterizeError::Decode {
                    glyph_id: glyph_id.0,
                    reason: "no horizontal metrics".to_string(),
                })?;

        Ok(GlyphOutline {
            outline: builder.inner.finish(),
            advance: f64::from(advance) * self.scale,
        })
    }
}

impl TtfParserFaceHandle<'_> {
    /// Tells a glyph without contours, like a space, apart from one whose outline is broken.
    fn undecodable(&self, id: ttf_parser::GlyphId) -> Option<String> {
        let tables = self.face.tables();
        if let Some(glyf) = tables.glyf {
            // Empty glyphs have no data at all, so no header bounding box either
            return glyf
                .bbox(id)
                .map(|_| "malformed glyf outline".to_string());
        }
        if let Some(cff) = &tables.cff {
            return match cff.outline(id, &mut NoOutline) {
                Ok(_) | Err(ttf_parser::CFFError::ZeroBBox) => None,
                Err(e) => Some(format!("malformed CFF charstring ({e:?})")),
            };
        }
        None
    }
}

struct NoOutline;

impl ttf_parser::OutlineBuilder for NoOutline {
    fn move_to(&mut self, _: f32, _: f32) {}
    fn line_to(&mut self, _: f32, _: f32) {}
    fn quad_to(&mut self, _: f32, _: f32, _: f32, _: f32) {}
    fn curve_to(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
    fn close(&mut self) {}
}

/// Scales font units to pixels while flattening.
struct ScaledBuilder {
    inner: OutlineBuilder,
    scale: f64,
}

impl ttf_parser::OutlineBuilder for ScaledBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let s = self.scale;
        self.inner.move_to(f64::from(x) * s, f64::from(y) * s);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let s = self.scale;
        self.inner.line_to(f64::from(x) * s, f64::from(y) * s);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let s = self.scale;
        self.inner.quad_to(
            f64::from(x1) * s,
            f64::from(y1) * s,
            f64::from(x) * s,
            f64::from(y) * s,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let s = self.scale;
        self.inner.curve_to(
            f64::from(x1) * s,
            f64::from(y1) * s,
            f64::from(x2) * s,
            f64::from(y2) * s,
            f64::from(x) * s,
            f64::from(y) * s,
        );
    }

    fn close(&mut self) {
        self.inner.close();
    }
}
