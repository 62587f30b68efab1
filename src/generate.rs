use sdf_outline_renderer::{clamp_to_u8, render_sdf_from_outline};

use crate::coverage::Coverage;
use crate::engine::FaceHandle;
use crate::error::{ConfigError, RasterizeError};
use crate::font::FontFace;
use crate::range::BlockRange;

/// The largest em size glyphs can be rendered at.
pub const MAX_FONT_SIZE: u32 = 1024;

/// Parameters for SDF glyph generation.
///
/// The defaults match what Mapbox GL style renderers expect; you are probably best off
/// sticking with them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdfConfig {
    /// The em size in px that glyphs are rendered at.
    pub size: u32,

    /// The number of pixels of padding around each glyph bitmap.
    pub buffer: usize,

    /// How many pixels out from the glyph outline distances are recorded
    /// (the rest will be clamped).
    pub radius: usize,

    /// The fraction of the byte range used to record negative values (inside the glyph),
    /// since the SDF is encoded as bytes which have no sign. Must be between 0 and 1.
    pub cutoff: f64,
}

impl Default for SdfConfig {
    fn default() -> Self {
        SdfConfig {
            size: 24,
            buffer: 3,
            radius: 8,
            cutoff: 0.25,
        }
    }
}

impl SdfConfig {
    /// Checks that every glyph can be rendered with these parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 || self.size > MAX_FONT_SIZE {
            return Err(ConfigError::InvalidSize(self.size));
        }
        if self.radius == 0 {
            return Err(ConfigError::InvalidRadius);
        }
        // Also rejects NaN
        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(ConfigError::InvalidCutoff(self.cutoff));
        }
        Ok(())
    }
}

/// A single rendered glyph, with metrics in whole pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRecord {
    pub codepoint: u32,
    pub advance: u32,
    pub left: i32,
    /// The top of the glyph relative to the ascender line (usually negative).
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// `(width + 2 * buffer) * (height + 2 * buffer)` bytes, or empty for glyphs with no ink.
    pub bitmap: Vec<u8>,
}

/// The rendered glyphs of one face that fall within a block, in ascending code point order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeBlock {
    pub range: BlockRange,
    pub face_name: String,
    pub records: Vec<GlyphRecord>,
}

impl RangeBlock {
    /// A block with no glyphs. Still a perfectly valid tile.
    #[must_use]
    pub fn empty(range: BlockRange, face_name: String) -> RangeBlock {
        RangeBlock {
            range,
            face_name,
            records: Vec::new(),
        }
    }
}

/// Truncates a pixel value the way FreeType does with 26.6 fixed point metrics.
fn floor_26_6(value: f64) -> i64 {
    ((value * 64.0).round() as i64) >> 6
}

/// The face's ascender in whole pixels at `size`, rounded up like FreeType's size metrics.
#[must_use]
pub fn ascender_px(face: &FontFace, size: u32) -> i32 {
    let scaled = f64::from(face.ascender()) * f64::from(size) / f64::from(face.units_per_em());
    let fixed = (scaled * 64.0).round() as i64;
    ((fixed + 63) >> 6) as i32
}

/// Renders the glyph mapped to `codepoint`.
pub fn rasterize<H: FaceHandle + ?Sized>(
    face: &FontFace,
    handle: &H,
    codepoint: u32,
    config: &SdfConfig,
) -> Result<GlyphRecord, RasterizeError> {
    let glyph_id = face
        .codepoint_to_glyph_id(codepoint)
        .ok_or(RasterizeError::Unmapped(codepoint))?;
    let glyph = handle.decode_outline(glyph_id)?;

    let sdf = render_sdf_from_outline(&glyph.outline, config.buffer, config.radius)?;
    let bitmap = clamp_to_u8(&sdf.sdf, config.cutoff)?;

    Ok(GlyphRecord {
        codepoint,
        advance: floor_26_6(glyph.advance).max(0) as u32,
        left: sdf.metrics.left_bearing,
        top: sdf.metrics.top_bearing - ascender_px(face, config.size),
        width: sdf.metrics.width as u32,
        height: sdf.metrics.height as u32,
        bitmap,
    })
}

/// Renders every covered glyph of `face` within `range`.
///
/// Glyphs that fail to render are left out of the block and returned alongside it; a single
/// bad outline never costs the rest of the block.
pub fn glyph_range_for_face<H: FaceHandle + ?Sized>(
    face: &FontFace,
    handle: &H,
    coverage: &Coverage,
    range: BlockRange,
    config: &SdfConfig,
) -> (RangeBlock, Vec<RasterizeError>) {
    let mut block = RangeBlock::empty(range, face.face_name());
    let mut failures = Vec::new();

    for &codepoint in coverage.within(range) {
        match rasterize(face, handle, codepoint, config) {
            Ok(record) => block.records.push(record),
            Err(e) => {
                log::warn!(
                    "Skipping U+{codepoint:04X} in {}: {e}",
                    block.face_name
                );
                failures.push(e);
            }
        }
    }

    (block, failures)
}
