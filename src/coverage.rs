use serde::Serialize;

use crate::font::FontFace;
use crate::range::BlockRange;

const SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDFFF;

/// The code points a face can render, in strictly ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Coverage(Vec<u32>);

impl Coverage {
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, codepoint: u32) -> bool {
        self.0.binary_search(&codepoint).is_ok()
    }

    /// The covered code points that fall within `range`.
    #[must_use]
    pub fn within(&self, range: BlockRange) -> &[u32] {
        let from = self.0.partition_point(|cp| *cp < range.start);
        let to = self.0.partition_point(|cp| *cp <= range.end);
        &self.0[from..to]
    }
}

impl<'a> IntoIterator for &'a Coverage {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Collects the code points of `face` that map to a real glyph.
///
/// The NUL character and surrogate code points are never reported, even when a font maps
/// them.
#[must_use]
pub fn coverage(face: &FontFace) -> Coverage {
    // The charmap iterates in ascending order without duplicates
    Coverage(
        face.charmap()
            .iter()
            .map(|(codepoint, _)| codepoint)
            .filter(|codepoint| *codepoint != 0 && !SURROGATES.contains(codepoint))
            .collect(),
    )
}
