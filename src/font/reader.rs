use crate::error::FontParseError;
use crate::font::Tag;

/// A bounds-checked, big-endian cursor over a slice of font data.
///
/// Every failed read reports the table being parsed, when known.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    table: Option<Tag>,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8], table: Option<Tag>) -> Reader<'a> {
        Reader {
            data,
            pos: 0,
            table,
        }
    }

    fn truncated(&self) -> FontParseError {
        FontParseError::Truncated(self.table)
    }

    /// Attributes future errors to `table`.
    pub(crate) fn with_table(self, table: Tag) -> Reader<'a> {
        Reader {
            table: Some(table),
            ..self
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Returns a new reader positioned at `offset`, relative to the start of this reader.
    pub(crate) fn at(&self, offset: usize) -> Result<Reader<'a>, FontParseError> {
        if offset > self.data.len() {
            return Err(self.truncated());
        }
        Ok(Reader {
            data: self.data,
            pos: offset,
            table: self.table,
        })
    }

    /// Returns a reader over `len` bytes starting at `offset`, with its own origin.
    pub(crate) fn slice(&self, offset: usize, len: usize) -> Result<Reader<'a>, FontParseError> {
        let end = offset.checked_add(len).ok_or_else(|| self.truncated())?;
        let data = self.data.get(offset..end).ok_or_else(|| self.truncated())?;
        Ok(Reader::new(data, self.table))
    }

    /// Returns everything from `offset` to the end of the data, with its own origin.
    pub(crate) fn tail(&self, offset: usize) -> Result<Reader<'a>, FontParseError> {
        let data = self.data.get(offset..).ok_or_else(|| self.truncated())?;
        Ok(Reader::new(data, self.table))
    }

    pub(crate) fn skip(&mut self, count: usize) -> Result<(), FontParseError> {
        self.bytes(count).map(|_| ())
    }

    pub(crate) fn bytes(&mut self, count: usize) -> Result<&'a [u8], FontParseError> {
        let end = self.pos.checked_add(count).ok_or_else(|| self.truncated())?;
        let bytes = self.data.get(self.pos..end).ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FontParseError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FontParseError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, FontParseError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub(crate) fn i16(&mut self) -> Result<i16, FontParseError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, FontParseError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub(crate) fn tag(&mut self) -> Result<Tag, FontParseError> {
        Ok(Tag(self.array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::error::FontParseError;
    use crate::font::Tag;

    #[test]
    fn test_big_endian_reads() {
        let data = [0x00, 0x01, 0xFF, 0xFE, 0x12, 0x34, 0x56, 0x78, b'c', b'm', b'a', b'p'];
        let mut reader = Reader::new(&data, None);

        assert_eq!(reader.u16().unwrap(), 1);
        assert_eq!(reader.i16().unwrap(), -2);
        assert_eq!(reader.u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.tag().unwrap(), Tag(*b"cmap"));
        assert_eq!(reader.position(), data.len());
    }

    #[test]
    fn test_truncation_names_table() {
        let data = [0x00, 0x01, 0x02];
        let mut reader = Reader::new(&data, Some(Tag::HEAD));

        assert_eq!(reader.u16().unwrap(), 1);
        assert_eq!(reader.u16(), Err(FontParseError::Truncated(Some(Tag::HEAD))));
        assert!(reader.slice(2, 2).is_err());
        assert!(reader.at(4).is_err());
        assert_eq!(reader.slice(1, 2).unwrap().len(), 2);
        assert_eq!(reader.tail(3).unwrap().len(), 0);
    }
}
