use std::fmt;

/// The number of code points in every block.
pub const BLOCK_SIZE: u32 = 256;

/// The highest code point addressed by the tile set.
pub const CODEPOINT_MAX: u32 = 65535;

/// The number of blocks that make up the addressable code point space.
pub const BLOCK_COUNT: usize = ((CODEPOINT_MAX + 1) / BLOCK_SIZE) as usize;

/// An inclusive range of code points covered by one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRange {
    pub start: u32,
    pub end: u32,
}

impl BlockRange {
    /// The block at position `index` within the code point space.
    #[must_use]
    pub const fn nth(index: usize) -> BlockRange {
        let start = index as u32 * BLOCK_SIZE;
        BlockRange {
            start,
            end: start + BLOCK_SIZE - 1,
        }
    }

    /// The canonical name of this range, e.g. `0-255`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// The file name of the artifact holding this range, e.g. `0-255.pbf`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.pbf", self.start, self.end)
    }

    #[must_use]
    pub fn contains(&self, codepoint: u32) -> bool {
        (self.start..=self.end).contains(&codepoint)
    }

    /// The position of this block in [`blocks`].
    #[must_use]
    pub fn index(&self) -> usize {
        (self.start / BLOCK_SIZE) as usize
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// The block containing `codepoint`, or `None` for code points beyond [`CODEPOINT_MAX`].
#[must_use]
pub fn block_for(codepoint: u32) -> Option<BlockRange> {
    (codepoint <= CODEPOINT_MAX).then(|| BlockRange::nth((codepoint / BLOCK_SIZE) as usize))
}

/// Every block of the code point space, in ascending order.
///
/// The result never depends on any font: a tile set always has [`BLOCK_COUNT`] members,
/// however sparse the font's coverage.
pub fn blocks() -> impl ExactSizeIterator<Item = BlockRange> + Clone {
    (0..BLOCK_COUNT).map(BlockRange::nth)
}
