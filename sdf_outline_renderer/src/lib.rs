//! This crate generates signed distance fields for glyph outlines, following the techniques
//! demonstrated by [Valve](https://steamcdn-a.akamaihd.net/apps/valve/2007/SIGGRAPH2007_AlphaTestedMagnification.pdf)
//! and [Mapbox](https://blog.mapbox.com/drawing-text-with-signed-distance-fields-in-mapbox-gl-b0933af6f817).
//!
//! Unlike raster approaches such as [TinySDF](https://github.com/mapbox/tiny-sdf), the field is
//! sampled directly from the vector outline, in the style of
//! [sdf-glyph-foundry](https://github.com/mapbox/sdf-glyph-foundry): curves are flattened into
//! line segments by an [`OutlineBuilder`], and every pixel of the buffered glyph box records
//! its distance to the nearest segment.
//!
//! The crate does not decode fonts itself. Any outline decoder can drive the
//! [`OutlineBuilder`] with its `move_to`/`line_to`/`quad_to`/`curve_to` callbacks; see
//! `pbf_glyph_tiles` for decoders backed by `ttf-parser` and FreeType.

mod core;
pub use crate::core::*;

mod error;
pub use crate::error::SdfGlyphError;

mod outline;
pub use crate::outline::*;
