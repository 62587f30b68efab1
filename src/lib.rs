//! # PBF Glyph Tiles
//!
//! Converts TrueType/OpenType fonts into signed distance field glyph tiles, encoded as
//! protocol buffers for renderers such as Mapbox GL, in the manner of
//! [node-fontnik](https://github.com/mapbox/node-fontnik).
//!
//! The code point space `[0, 65535]` is always split into 256 blocks of 256 code points,
//! and every run produces one `<start>-<end>.pbf` artifact per block, whether or not the
//! font covers anything in it. Glyph outlines are decoded by an [`OutlineEngine`]
//! (`ttf-parser` by default, or FreeType with the `freetype` feature) and rendered by
//! [`sdf_outline_renderer`].
//!
//! The crate also reports font coverage: which code points a font, or a whole directory of
//! fonts, can actually render. See [`resolve`].
//!
//! ## References
//!   * [sdf-glyph-foundry](https://github.com/mapbox/sdf-glyph-foundry)
//!   * [glyph-pbf-composite](https://github.com/mapbox/glyph-pbf-composite)

mod coverage;
mod encode;
mod engine;
mod error;
mod font;
mod generate;
mod proto;
mod range;
mod registry;
mod tile;

#[cfg(test)]
#[path = "../tests/support/font_builder.rs"]
mod font_builder;

pub use proto::glyphs::{Fontstack, Glyph, Glyphs};
// Re-export protobuf lib
pub use protobuf;
// Re-export freetype lib
#[cfg(feature = "freetype")]
pub use freetype;

pub use crate::coverage::{coverage, Coverage};
pub use crate::encode::*;
pub use crate::engine::*;
pub use crate::error::{ConfigError, EncodeError, FontParseError, RasterizeError, TileError};
pub use crate::font::{Charmap, FontFace, GlyphId, Tag};
pub use crate::generate::*;
pub use crate::range::*;
pub use crate::registry::*;
pub use crate::tile::*;
