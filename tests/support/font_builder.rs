//! Builds small but complete TrueType fonts in memory for tests.
//!
//! Every mapped code point gets its own glyph: a 500x700 unit box sitting on the baseline,
//! except U+0020 which gets an empty outline like a real space.
#![allow(dead_code)]

use std::collections::BTreeSet;

pub const UNITS_PER_EM: u16 = 1000;
pub const ASCENDER: i16 = 800;
pub const DESCENDER: i16 = -200;
pub const ADVANCE: u16 = 700;

/// The box every inked glyph is drawn with, in font units.
pub const GLYPH_BOX: (i16, i16, i16, i16) = (100, 0, 600, 700);

#[derive(Clone, Debug)]
pub struct FontBuilder {
    family: String,
    style: Option<String>,
    codepoints: BTreeSet<u32>,
    notdef: BTreeSet<u32>,
    corrupt: BTreeSet<u32>,
    omitted: Vec<[u8; 4]>,
}

impl FontBuilder {
    pub fn new(family: &str) -> FontBuilder {
        FontBuilder {
            family: family.to_string(),
            style: Some("Regular".to_string()),
            codepoints: BTreeSet::new(),
            notdef: BTreeSet::new(),
            corrupt: BTreeSet::new(),
            omitted: Vec::new(),
        }
    }

    pub fn style(mut self, style: &str) -> FontBuilder {
        self.style = Some(style.to_string());
        self
    }

    pub fn no_style(mut self) -> FontBuilder {
        self.style = None;
        self
    }

    /// Maps each code point to a glyph of its own.
    pub fn codepoints<I: IntoIterator<Item = u32>>(mut self, codepoints: I) -> FontBuilder {
        self.codepoints.extend(codepoints);
        self
    }

    /// Maps `codepoint` explicitly to the missing glyph.
    pub fn notdef(mut self, codepoint: u32) -> FontBuilder {
        self.notdef.insert(codepoint);
        self
    }

    /// Gives the glyph of `codepoint` a contour count that runs past the end of its data.
    pub fn corrupt_outline(mut self, codepoint: u32) -> FontBuilder {
        self.corrupt.insert(codepoint);
        self
    }

    /// Leaves a table out of the table directory.
    pub fn omit_table(mut self, tag: [u8; 4]) -> FontBuilder {
        self.omitted.push(tag);
        self
    }

    /// The glyph id assigned to `codepoint`, if it is mapped.
    pub fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.codepoints
            .iter()
            .position(|cp| *cp == codepoint)
            .map(|index| index as u16 + 1)
    }

    pub fn build(&self) -> Vec<u8> {
        let num_glyphs = self.codepoints.len() + 1;
        let mut glyphs = vec![box_glyph()];
        for codepoint in &self.codepoints {
            let mut glyph = if *codepoint == 0x20 {
                Vec::new()
            } else {
                box_glyph()
            };
            if self.corrupt.contains(codepoint) {
                // endPtsOfContours
                glyph[10..12].copy_from_slice(&be16(200));
            }
            glyphs.push(glyph);
        }

        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        for glyph in &glyphs {
            loca.extend(be32(glyf.len() as u32));
            glyf.extend_from_slice(glyph);
        }
        loca.extend(be32(glyf.len() as u32));

        let tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"cmap", self.cmap()),
            (*b"glyf", glyf),
            (*b"head", head()),
            (*b"hhea", hhea(num_glyphs as u16)),
            (*b"hmtx", hmtx(num_glyphs)),
            (*b"loca", loca),
            (*b"maxp", maxp(num_glyphs as u16)),
            (*b"name", self.name()),
        ];
        let tables: Vec<_> = tables
            .into_iter()
            .filter(|(tag, _)| !self.omitted.contains(tag))
            .collect();

        sfnt(&tables)
    }

    fn cmap(&self) -> Vec<u8> {
        let mut mappings: Vec<(u32, u16)> = self
            .codepoints
            .iter()
            .enumerate()
            .map(|(index, cp)| (*cp, index as u16 + 1))
            .collect();
        mappings.extend(self.notdef.iter().map(|cp| (*cp, 0)));
        mappings.sort();

        let format4 = format4(
            &mappings
                .iter()
                .copied()
                .filter(|(cp, _)| *cp < 0xFFFF)
                .collect::<Vec<_>>(),
        );
        let format12 = format12(&mappings);

        let mut table = Vec::new();
        table.extend(be16(0));
        table.extend(be16(2));
        let first = 4 + 2 * 8;
        for (platform, encoding, offset) in [(3, 1, first), (3, 10, first + format4.len())] {
            table.extend(be16(platform));
            table.extend(be16(encoding));
            table.extend(be32(offset as u32));
        }
        table.extend(format4);
        table.extend(format12);
        table
    }

    fn name(&self) -> Vec<u8> {
        let mut strings = vec![(1u16, self.family.as_str())];
        if let Some(style) = &self.style {
            strings.push((2, style.as_str()));
        }

        let mut table = Vec::new();
        table.extend(be16(0));
        table.extend(be16(strings.len() as u16));
        table.extend(be16(6 + 12 * strings.len() as u16));

        let mut storage = Vec::new();
        for (name_id, text) in strings {
            let encoded: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
            for field in [3, 1, 0x0409, name_id, encoded.len() as u16, storage.len() as u16] {
                table.extend(be16(field));
            }
            storage.extend(encoded);
        }
        table.extend(storage);
        table
    }
}

/// Packs several fonts into a TrueType collection.
pub fn collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let header_len = 12 + 4 * fonts.len();
    let mut offsets = Vec::new();
    let mut body: Vec<u8> = Vec::new();
    for font in fonts {
        let base = header_len + body.len();
        offsets.push(base as u32);

        let mut font = font.clone();
        let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
        for table in 0..num_tables {
            let pos = 12 + 16 * table + 8;
            let offset = u32::from_be_bytes([font[pos], font[pos + 1], font[pos + 2], font[pos + 3]]);
            font[pos..pos + 4].copy_from_slice(&(offset + base as u32).to_be_bytes());
        }
        body.extend(font);
        pad(&mut body);
    }

    let mut data = b"ttcf".to_vec();
    data.extend(be32(0x0001_0000));
    data.extend(be32(fonts.len() as u32));
    for offset in offsets {
        data.extend(be32(offset));
    }
    data.extend(body);
    data
}

fn be16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

fn be32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

fn pad(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

fn sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
    let search_range = 16 << entry_selector;

    let mut data = Vec::new();
    data.extend(be32(0x0001_0000));
    data.extend(be16(num_tables));
    data.extend(be16(search_range));
    data.extend(be16(entry_selector));
    data.extend(be16((num_tables * 16).saturating_sub(search_range)));

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, table) in tables {
        data.extend_from_slice(tag);
        data.extend(be32(0));
        data.extend(be32(offset as u32));
        data.extend(be32(table.len() as u32));

        body.extend_from_slice(table);
        pad(&mut body);
        offset = 12 + 16 * tables.len() + body.len();
    }
    data.extend(body);
    data
}

fn head() -> Vec<u8> {
    let (x_min, y_min, x_max, y_max) = GLYPH_BOX;
    let mut table = Vec::new();
    table.extend(be16(1));
    table.extend(be16(0));
    table.extend(be32(0x0001_0000)); // fontRevision
    table.extend(be32(0)); // checksumAdjustment
    table.extend(be32(0x5F0F_3CF5));
    table.extend(be16(0)); // flags
    table.extend(be16(UNITS_PER_EM));
    table.extend([0u8; 16]); // created, modified
    for value in [x_min, y_min, x_max, y_max] {
        table.extend(value.to_be_bytes());
    }
    table.extend(be16(0)); // macStyle
    table.extend(be16(8)); // lowestRecPPEM
    table.extend(be16(2)); // fontDirectionHint
    table.extend(be16(1)); // indexToLocFormat: long offsets
    table.extend(be16(0)); // glyphDataFormat
    table
}

fn hhea(num_h_metrics: u16) -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(be32(0x0001_0000));
    table.extend(ASCENDER.to_be_bytes());
    table.extend(DESCENDER.to_be_bytes());
    table.extend(be16(0)); // lineGap
    table.extend(be16(ADVANCE)); // advanceWidthMax
    table.extend(GLYPH_BOX.0.to_be_bytes()); // minLeftSideBearing
    table.extend(be16(100)); // minRightSideBearing
    table.extend(GLYPH_BOX.2.to_be_bytes()); // xMaxExtent
    table.extend(be16(1)); // caretSlopeRise
    table.extend(be16(0)); // caretSlopeRun
    table.extend([0u8; 10]); // caretOffset, reserved
    table.extend(be16(0)); // metricDataFormat
    table.extend(be16(num_h_metrics));
    table
}

fn hmtx(num_glyphs: usize) -> Vec<u8> {
    (0..num_glyphs)
        .flat_map(|_| {
            let mut metric = be16(ADVANCE).to_vec();
            metric.extend(GLYPH_BOX.0.to_be_bytes());
            metric
        })
        .collect()
}

fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(be32(0x0001_0000));
    table.extend(be16(num_glyphs));
    table.extend(be16(4)); // maxPoints
    table.extend(be16(1)); // maxContours
    table.extend([0u8; 22]);
    table
}

/// A single clockwise contour covering [`GLYPH_BOX`].
fn box_glyph() -> Vec<u8> {
    let (x_min, y_min, x_max, y_max) = GLYPH_BOX;
    let mut glyph = Vec::new();
    glyph.extend(1i16.to_be_bytes()); // numberOfContours
    for value in [x_min, y_min, x_max, y_max] {
        glyph.extend(value.to_be_bytes());
    }
    glyph.extend(be16(3)); // endPtsOfContours
    glyph.extend(be16(0)); // instructionLength
    // On-curve points with 16-bit deltas
    glyph.extend([0x01; 4]);
    let xs = [x_min, 0, x_max - x_min, 0];
    let ys = [y_min, y_max - y_min, 0, y_min - y_max];
    for delta in xs.iter().chain(ys.iter()) {
        glyph.extend(delta.to_be_bytes());
    }
    pad(&mut glyph);
    glyph
}

fn format4(mappings: &[(u32, u16)]) -> Vec<u8> {
    let seg_count = mappings.len() as u16 + 1;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = 2 << entry_selector;

    let mut end_codes = Vec::new();
    let mut start_codes = Vec::new();
    let mut deltas = Vec::new();
    for (cp, glyph) in mappings {
        end_codes.extend(be16(*cp as u16));
        start_codes.extend(be16(*cp as u16));
        deltas.extend(be16(glyph.wrapping_sub(*cp as u16)));
    }
    end_codes.extend(be16(0xFFFF));
    start_codes.extend(be16(0xFFFF));
    deltas.extend(be16(1));

    let mut table = Vec::new();
    table.extend(be16(4));
    table.extend(be16(16 + 8 * seg_count));
    table.extend(be16(0)); // language
    table.extend(be16(seg_count * 2));
    table.extend(be16(search_range));
    table.extend(be16(entry_selector));
    table.extend(be16(seg_count * 2 - search_range));
    table.extend(end_codes);
    table.extend(be16(0)); // reservedPad
    table.extend(start_codes);
    table.extend(deltas);
    table.extend(vec![0u8; seg_count as usize * 2]); // idRangeOffset
    table
}

fn format12(mappings: &[(u32, u16)]) -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(be16(12));
    table.extend(be16(0));
    table.extend(be32(16 + 12 * mappings.len() as u32));
    table.extend(be32(0)); // language
    table.extend(be32(mappings.len() as u32));
    for (cp, glyph) in mappings {
        table.extend(be32(*cp));
        table.extend(be32(*cp));
        table.extend(be32(u32::from(*glyph)));
    }
    table
}
