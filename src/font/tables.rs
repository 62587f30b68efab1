use crate::error::FontParseError;
use crate::font::reader::Reader;
use crate::font::Tag;

const HEAD_MAGIC: u32 = 0x5F0F_3CF5;

/// The fields of the `head` table needed to scale outlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Head {
    pub(crate) units_per_em: u16,
}

impl Head {
    pub(crate) fn parse(mut r: Reader<'_>) -> Result<Head, FontParseError> {
        // majorVersion, minorVersion, fontRevision, checksumAdjustment
        r.skip(12)?;
        if r.u32()? != HEAD_MAGIC {
            return Err(FontParseError::Malformed {
                table: Tag::HEAD,
                reason: "bad magic number",
            });
        }
        let _flags = r.u16()?;
        let units_per_em = r.u16()?;
        if !(16..=16384).contains(&units_per_em) {
            return Err(FontParseError::Malformed {
                table: Tag::HEAD,
                reason: "units per em must be between 16 and 16384",
            });
        }

        Ok(Head { units_per_em })
    }
}

/// Horizontal header metrics, in font units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Hhea {
    pub(crate) ascender: i16,
    pub(crate) descender: i16,
    pub(crate) line_gap: i16,
}

impl Hhea {
    pub(crate) fn parse(mut r: Reader<'_>) -> Result<Hhea, FontParseError> {
        let _version = r.u32()?;
        let ascender = r.i16()?;
        let descender = r.i16()?;
        let line_gap = r.i16()?;
        // The rest of the table must be present even though we don't use it
        r.skip(24)?;
        let _number_of_h_metrics = r.u16()?;

        Ok(Hhea {
            ascender,
            descender,
            line_gap,
        })
    }
}

pub(crate) fn parse_num_glyphs(mut r: Reader<'_>) -> Result<u16, FontParseError> {
    let _version = r.u32()?;
    r.u16()
}

pub(crate) const NAME_FAMILY: u16 = 1;
pub(crate) const NAME_SUBFAMILY: u16 = 2;
pub(crate) const NAME_TYPOGRAPHIC_FAMILY: u16 = 16;
pub(crate) const NAME_TYPOGRAPHIC_SUBFAMILY: u16 = 17;

const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_MACINTOSH: u16 = 1;
const PLATFORM_WINDOWS: u16 = 3;
const LANGUAGE_WINDOWS_EN_US: u16 = 0x0409;

#[derive(Clone, Copy, Debug)]
struct NameRecord<'a> {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: u16,
    bytes: &'a [u8],
}

impl NameRecord<'_> {
    /// Lower is better; `None` for records we cannot decode.
    fn rank(&self) -> Option<u8> {
        match (self.platform_id, self.encoding_id) {
            (PLATFORM_WINDOWS, 1 | 10) if self.language_id == LANGUAGE_WINDOWS_EN_US => Some(0),
            (PLATFORM_WINDOWS, 1 | 10) => Some(1),
            (PLATFORM_UNICODE, _) => Some(2),
            (PLATFORM_MACINTOSH, 0) if self.language_id == 0 => Some(3),
            _ => None,
        }
    }

    fn decode(&self) -> Option<String> {
        let text = if self.platform_id == PLATFORM_MACINTOSH {
            // Mac Roman agrees with ASCII, which covers the names fonts actually use
            self.bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
                .collect()
        } else {
            let units: Vec<u16> = self
                .bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        };
        let text = text.trim_matches(char::from(0)).trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// The `name` table, decoded far enough to look up face identity strings.
#[derive(Clone, Debug)]
pub(crate) struct Names<'a> {
    records: Vec<NameRecord<'a>>,
}

impl<'a> Names<'a> {
    pub(crate) fn parse(r: Reader<'a>) -> Result<Names<'a>, FontParseError> {
        let mut header = r;
        let _format = header.u16()?;
        let count = header.u16()?;
        let storage_offset = header.u16()? as usize;
        let storage = r.tail(storage_offset)?;

        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let platform_id = header.u16()?;
            let encoding_id = header.u16()?;
            let language_id = header.u16()?;
            let name_id = header.u16()?;
            let length = header.u16()? as usize;
            let offset = header.u16()? as usize;
            let Ok(mut string) = storage.slice(offset, length) else {
                // A single bad record shouldn't make the whole font unusable
                log::debug!("Skipping name record {name_id} pointing outside the name table");
                continue;
            };
            records.push(NameRecord {
                platform_id,
                encoding_id,
                language_id,
                name_id,
                bytes: string.bytes(length)?,
            });
        }

        Ok(Names { records })
    }

    /// Looks up the best decodable string for `name_id`.
    pub(crate) fn get(&self, name_id: u16) -> Option<String> {
        let mut candidates: Vec<(u8, &NameRecord)> = self
            .records
            .iter()
            .filter(|record| record.name_id == name_id)
            .filter_map(|record| record.rank().map(|rank| (rank, record)))
            .collect();
        candidates.sort_by_key(|(rank, _)| *rank);
        candidates
            .into_iter()
            .find_map(|(_, record)| record.decode())
    }
}
