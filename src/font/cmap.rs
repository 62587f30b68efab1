//! Character to glyph index mapping (`cmap`) subtables.

use std::collections::BTreeMap;

use crate::error::FontParseError;
use crate::font::reader::Reader;
use crate::font::{GlyphId, Tag};

/// The largest valid Unicode scalar value.
const UNICODE_MAX: u32 = 0x10_FFFF;

/// Subtables we never read: Unicode variation sequences.
const FORMAT_VARIATION_SEQUENCES: u16 = 14;

/// An encoding record pointing at a subtable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    offset: u32,
}

impl EncodingRecord {
    /// Priority of Unicode subtables when they disagree (lower wins), or `None` if the
    /// subtable does not map Unicode code points.
    fn unicode_priority(&self) -> Option<u8> {
        match (self.platform_id, self.encoding_id) {
            (3, 10) => Some(0),
            (0, 6) => Some(1),
            (0, 4) => Some(2),
            (3, 1) => Some(3),
            (0, 3) => Some(4),
            (0, 5) => None,
            (0, _) => Some(5),
            _ => None,
        }
    }
}

/// The merged code point to glyph mapping of every Unicode subtable in a font.
///
/// Mappings to glyph 0 (the missing glyph) or to glyph ids beyond the end of the font are
/// dropped while merging, so every entry points at a real glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Charmap {
    map: BTreeMap<u32, GlyphId>,
}

impl Charmap {
    pub(crate) fn parse(r: Reader<'_>, num_glyphs: u16) -> Result<Charmap, FontParseError> {
        let mut header = r;
        let _version = header.u16()?;
        let num_tables = header.u16()?;

        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            records.push(EncodingRecord {
                platform_id: header.u16()?,
                encoding_id: header.u16()?,
                offset: header.u32()?,
            });
        }

        let mut unicode: Vec<(u8, EncodingRecord)> = records
            .into_iter()
            .filter_map(|record| record.unicode_priority().map(|p| (p, record)))
            .collect();
        unicode.sort_by_key(|(priority, record)| (*priority, record.offset));
        // Several encoding records frequently share a single subtable
        unicode.dedup_by_key(|(_, record)| record.offset);

        let mut charmap = Charmap::default();
        if unicode.is_empty() {
            log::debug!("Font has no Unicode cmap subtable");
        }

        // A subtable that can't be read is skipped as long as another one can
        let mut first_error = None;
        let mut merged_any = false;
        for (_, record) in unicode {
            let mut mappings = Vec::new();
            let result = r.tail(record.offset as usize).and_then(|subtable| {
                read_subtable(subtable, num_glyphs, &mut |codepoint, glyph| {
                    mappings.push((codepoint, glyph))
                })
            });

            match result {
                Ok(()) => {
                    charmap.merge(mappings, num_glyphs);
                    merged_any = true;
                }
                Err(e) => {
                    log::debug!(
                        "Skipping cmap subtable ({}, {}): {e}",
                        record.platform_id,
                        record.encoding_id
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if !merged_any => Err(e),
            _ => Ok(charmap),
        }
    }

    /// Adds the mappings of one subtable, keeping existing entries on conflict.
    fn merge(&mut self, mappings: Vec<(u32, u32)>, num_glyphs: u16) {
        for (codepoint, glyph) in mappings {
            if glyph != 0 && glyph < u32::from(num_glyphs) && codepoint <= UNICODE_MAX {
                self.map.entry(codepoint).or_insert(GlyphId(glyph as u16));
            }
        }
    }

    #[must_use]
    pub fn get(&self, codepoint: u32) -> Option<GlyphId> {
        self.map.get(&codepoint).copied()
    }

    /// Iterates over every mapping in ascending code point order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, GlyphId)> + '_ {
        self.map.iter().map(|(cp, glyph)| (*cp, *glyph))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn malformed(reason: &'static str) -> FontParseError {
    FontParseError::Malformed {
        table: Tag::CMAP,
        reason,
    }
}

fn read_subtable(
    r: Reader<'_>,
    num_glyphs: u16,
    insert: &mut impl FnMut(u32, u32),
) -> Result<(), FontParseError> {
    let format = r.at(0)?.u16()?;
    match format {
        0 => parse_format0(r, insert),
        4 => parse_format4(r, insert),
        6 => parse_format6(r, insert),
        10 => parse_format10(r, insert),
        12 => parse_segmented(r, false, num_glyphs, insert),
        13 => parse_segmented(r, true, num_glyphs, insert),
        FORMAT_VARIATION_SEQUENCES => Ok(()),
        other => {
            log::debug!("Skipping unsupported cmap subtable format {other}");
            Ok(())
        }
    }
}

/// Format 0: byte encoding table.
fn parse_format0(
    mut r: Reader<'_>,
    insert: &mut impl FnMut(u32, u32),
) -> Result<(), FontParseError> {
    // format, length, language
    r.skip(6)?;
    for (codepoint, glyph) in r.bytes(256)?.iter().enumerate() {
        insert(codepoint as u32, u32::from(*glyph));
    }
    Ok(())
}

/// Format 4: segment mapping to delta values.
fn parse_format4(
    r: Reader<'_>,
    insert: &mut impl FnMut(u32, u32),
) -> Result<(), FontParseError> {
    let mut header = r.at(6)?;
    let seg_count_x2 = header.u16()? as usize;
    if seg_count_x2 % 2 != 0 {
        return Err(malformed("odd segCountX2 in format 4 subtable"));
    }
    let seg_count = seg_count_x2 / 2;

    let mut end_codes = r.at(14)?;
    let mut start_codes = r.at(16 + seg_count_x2)?;
    let mut id_deltas = r.at(16 + 2 * seg_count_x2)?;
    let id_range_offsets_pos = 16 + 3 * seg_count_x2;
    let mut id_range_offsets = r.at(id_range_offsets_pos)?;

    for segment in 0..seg_count {
        let end = end_codes.u16()?;
        let start = start_codes.u16()?;
        let delta = id_deltas.u16()?;
        let range_offset = id_range_offsets.u16()? as usize;

        if start > end {
            return Err(malformed("segment start after end in format 4 subtable"));
        }
        if start == 0xFFFF {
            // Terminating segment
            continue;
        }

        for codepoint in start..=end {
            let glyph = if range_offset == 0 {
                codepoint.wrapping_add(delta)
            } else {
                // idRangeOffset is relative to its own position in the subtable
                let glyph_pos = id_range_offsets_pos
                    + segment * 2
                    + range_offset
                    + (codepoint - start) as usize * 2;
                let glyph = r.at(glyph_pos)?.u16()?;
                if glyph == 0 {
                    continue;
                }
                glyph.wrapping_add(delta)
            };
            insert(u32::from(codepoint), u32::from(glyph));
        }
    }
    Ok(())
}

/// Format 6: trimmed table mapping (a dense run of 16-bit code points).
fn parse_format6(
    r: Reader<'_>,
    insert: &mut impl FnMut(u32, u32),
) -> Result<(), FontParseError> {
    let mut r = r.at(6)?;
    let first_code = u32::from(r.u16()?);
    let entry_count = u32::from(r.u16()?);
    for index in 0..entry_count {
        let glyph = r.u16()?;
        insert(first_code + index, u32::from(glyph));
    }
    Ok(())
}

/// Format 10: trimmed array (a dense run of 32-bit code points).
fn parse_format10(
    r: Reader<'_>,
    insert: &mut impl FnMut(u32, u32),
) -> Result<(), FontParseError> {
    // format, reserved, length, language
    let mut r = r.at(12)?;
    let start_char = r.u32()?;
    let num_chars = r.u32()?;
    if start_char > UNICODE_MAX || num_chars > UNICODE_MAX + 1 - start_char {
        return Err(malformed("format 10 subtable extends past U+10FFFF"));
    }
    for index in 0..num_chars {
        let glyph = r.u16()?;
        insert(start_char + index, u32::from(glyph));
    }
    Ok(())
}

/// Formats 12 (segmented coverage) and 13 (many-to-one range mappings).
///
/// Groups are clamped to the glyphs that exist. Across the whole subtable no more code points
/// are expanded than Unicode has, which only overlapping groups can exceed.
fn parse_segmented(
    r: Reader<'_>,
    many_to_one: bool,
    num_glyphs: u16,
    insert: &mut impl FnMut(u32, u32),
) -> Result<(), FontParseError> {
    let num_glyphs = u32::from(num_glyphs);
    // format, reserved, length, language
    let mut r = r.at(12)?;
    let num_groups = r.u32()?;
    let mut budget = UNICODE_MAX + 1;

    for _ in 0..num_groups {
        let start = r.u32()?;
        let mut end = r.u32()?.min(UNICODE_MAX);
        let start_glyph = r.u32()?;
        if start > end || start_glyph >= num_glyphs {
            continue;
        }
        if !many_to_one {
            end = end.min(start.saturating_add(num_glyphs - 1 - start_glyph));
        }

        let span = end - start + 1;
        if span > budget {
            return Err(malformed("overlapping groups in segmented subtable"));
        }
        budget -= span;

        for codepoint in start..=end {
            let glyph = if many_to_one {
                start_glyph
            } else {
                start_glyph + (codepoint - start)
            };
            insert(codepoint, glyph);
        }
    }
    Ok(())
}
