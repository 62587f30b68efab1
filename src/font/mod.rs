//! Minimal sfnt parsing: just enough of a TrueType/OpenType binary to identify each face,
//! read its vertical metrics and map code points to glyph ids.
//!
//! Outline decoding is left to an [`OutlineEngine`](crate::OutlineEngine).

use std::fmt;
use std::sync::Arc;

use crate::error::FontParseError;

mod cmap;
pub(crate) mod reader;
mod tables;

pub use self::cmap::Charmap;
use self::reader::Reader;
use self::tables::{
    parse_num_glyphs, Head, Hhea, Names, NAME_FAMILY, NAME_SUBFAMILY, NAME_TYPOGRAPHIC_FAMILY,
    NAME_TYPOGRAPHIC_SUBFAMILY,
};

const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
const SFNT_VERSION_APPLE: Tag = Tag(*b"true");
const SFNT_VERSION_CFF: Tag = Tag(*b"OTTO");
const COLLECTION_TAG: Tag = Tag(*b"ttcf");

/// A four byte table (or format) identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const CMAP: Tag = Tag(*b"cmap");
    pub const HEAD: Tag = Tag(*b"head");
    pub const HHEA: Tag = Tag(*b"hhea");
    pub const MAXP: Tag = Tag(*b"maxp");
    pub const NAME: Tag = Tag(*b"name");
    pub const DIRECTORY: Tag = Tag(*b"sfnt");
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// The index of a glyph within a face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u16);

/// One record of the table directory.
#[derive(Clone, Copy, Debug)]
struct TableRecord {
    tag: Tag,
    offset: u32,
    length: u32,
}

/// The table directory of a single face.
struct TableDirectory<'a> {
    data: Reader<'a>,
    records: Vec<TableRecord>,
}

impl<'a> TableDirectory<'a> {
    fn parse(data: &'a [u8], offset: u32) -> Result<TableDirectory<'a>, FontParseError> {
        let data = Reader::new(data, Some(Tag::DIRECTORY));
        let mut header = data.at(offset as usize)?;

        let version = header.u32()?;
        let tag = Tag(version.to_be_bytes());
        if version != SFNT_VERSION_TRUETYPE && tag != SFNT_VERSION_APPLE && tag != SFNT_VERSION_CFF
        {
            return Err(FontParseError::UnknownFormat(version));
        }

        let num_tables = header.u16()?;
        // searchRange, entrySelector, rangeShift
        header.skip(6)?;

        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let tag = header.tag()?;
            let _checksum = header.u32()?;
            let offset = header.u32()?;
            let length = header.u32()?;
            records.push(TableRecord {
                tag,
                offset,
                length,
            });
        }

        Ok(TableDirectory { data, records })
    }

    fn table(&self, tag: Tag) -> Result<Reader<'a>, FontParseError> {
        let record = self
            .records
            .iter()
            .find(|record| record.tag == tag)
            .ok_or(FontParseError::MissingTable(tag))?;
        self.data
            .slice(record.offset as usize, record.length as usize)
            .map(|table| table.with_table(tag))
            .map_err(|_| FontParseError::Truncated(Some(tag)))
    }
}

/// Returns the offsets of every face's table directory.
fn face_offsets(data: &[u8]) -> Result<Vec<u32>, FontParseError> {
    let mut header = Reader::new(data, Some(Tag::DIRECTORY));
    let tag = header.tag()?;
    if tag != COLLECTION_TAG {
        return Ok(vec![0]);
    }

    let _version = header.u32()?;
    let num_fonts = header.u32()?;
    // Each offset takes four bytes, so a count beyond the data length is garbage
    if num_fonts as usize > data.len() / 4 {
        return Err(FontParseError::Malformed {
            table: COLLECTION_TAG,
            reason: "font count exceeds the size of the collection",
        });
    }
    (0..num_fonts).map(|_| header.u32()).collect()
}

/// A single parsed face of a font binary.
///
/// The binary itself is shared, so every face of a collection refers to the same bytes.
#[derive(Clone)]
pub struct FontFace {
    data: Arc<[u8]>,
    index: u32,
    family_name: String,
    style_name: Option<String>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    num_glyphs: u16,
    charmap: Charmap,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("index", &self.index)
            .field("family_name", &self.family_name)
            .field("style_name", &self.style_name)
            .field("units_per_em", &self.units_per_em)
            .field("num_glyphs", &self.num_glyphs)
            .finish_non_exhaustive()
    }
}

impl FontFace {
    /// Loads the first face of a font binary.
    pub fn load<D: Into<Arc<[u8]>>>(data: D) -> Result<FontFace, FontParseError> {
        FontFace::load_index(data, 0)
    }

    /// Loads the face at `index`. Anything but a collection only has face 0.
    pub fn load_index<D: Into<Arc<[u8]>>>(data: D, index: u32) -> Result<FontFace, FontParseError> {
        let data = data.into();
        let offsets = face_offsets(&data)?;
        let offset = *offsets
            .get(index as usize)
            .ok_or(FontParseError::FaceIndexOutOfRange {
                index,
                count: offsets.len() as u32,
            })?;
        FontFace::parse(data, index, offset)
    }

    /// Loads every face of a font binary, in index order.
    pub fn load_all<D: Into<Arc<[u8]>>>(data: D) -> Result<Vec<FontFace>, FontParseError> {
        let data = data.into();
        face_offsets(&data)?
            .into_iter()
            .enumerate()
            .map(|(index, offset)| FontFace::parse(data.clone(), index as u32, offset))
            .collect()
    }

    /// The number of faces in a font binary (1 unless it is a collection).
    pub fn face_count(data: &[u8]) -> Result<u32, FontParseError> {
        Ok(face_offsets(data)?.len() as u32)
    }

    fn parse(data: Arc<[u8]>, index: u32, offset: u32) -> Result<FontFace, FontParseError> {
        let directory = TableDirectory::parse(&data, offset)?;

        let head = Head::parse(directory.table(Tag::HEAD)?)?;
        let hhea = Hhea::parse(directory.table(Tag::HHEA)?)?;
        let num_glyphs = parse_num_glyphs(directory.table(Tag::MAXP)?)?;
        let names = Names::parse(directory.table(Tag::NAME)?)?;
        let charmap = Charmap::parse(directory.table(Tag::CMAP)?, num_glyphs)?;

        let family_name = names
            .get(NAME_TYPOGRAPHIC_FAMILY)
            .or_else(|| names.get(NAME_FAMILY))
            .ok_or(FontParseError::MissingFamilyName)?;
        let style_name = names
            .get(NAME_TYPOGRAPHIC_SUBFAMILY)
            .or_else(|| names.get(NAME_SUBFAMILY));

        log::debug!(
            "Loaded face {index} ({family_name}) with {num_glyphs} glyphs and {} mapped code points",
            charmap.len()
        );

        Ok(FontFace {
            data,
            index,
            family_name,
            style_name,
            units_per_em: head.units_per_em,
            ascender: hhea.ascender,
            descender: hhea.descender,
            line_gap: hhea.line_gap,
            num_glyphs,
            charmap,
        })
    }

    /// The face identity used to name font stacks: `"<family> <style>"`.
    #[must_use]
    pub fn face_name(&self) -> String {
        match &self.style_name {
            Some(style) => format!("{} {}", self.family_name, style),
            None => self.family_name.clone(),
        }
    }

    #[must_use]
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    #[must_use]
    pub fn style_name(&self) -> Option<&str> {
        self.style_name.as_deref()
    }

    #[must_use]
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    #[must_use]
    pub fn ascender(&self) -> i16 {
        self.ascender
    }

    #[must_use]
    pub fn descender(&self) -> i16 {
        self.descender
    }

    #[must_use]
    pub fn line_gap(&self) -> i16 {
        self.line_gap
    }

    #[must_use]
    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    /// The index of this face within its binary.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The complete font binary this face was loaded from.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn charmap(&self) -> &Charmap {
        &self.charmap
    }

    #[must_use]
    pub fn codepoint_to_glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        self.charmap.get(codepoint)
    }
}
