use std::fs::File;
use std::path::Path;

use protobuf::Message;
use tokio::task::spawn_blocking;

use crate::error::{EncodeError, TileError};
use crate::generate::{GlyphRecord, RangeBlock};
use crate::proto::glyphs::{Fontstack, Glyph, Glyphs};
use crate::range::BlockRange;

/// The serialized tile for one block, ready to be written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputArtifact {
    pub range: BlockRange,
    pub bytes: Vec<u8>,
}

impl OutputArtifact {
    /// The file name this artifact is published under, e.g. `0-255.pbf`.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.range.file_name()
    }
}

fn glyph_message(record: &GlyphRecord) -> Glyph {
    let mut glyph = Glyph::new();
    glyph.set_id(record.codepoint);
    // Glyphs without ink carry metrics only
    if !record.bitmap.is_empty() {
        glyph.set_bitmap(record.bitmap.clone());
    }
    glyph.set_width(record.width);
    glyph.set_height(record.height);
    glyph.set_left(record.left);
    glyph.set_top(record.top);
    glyph.set_advance(record.advance);
    glyph
}

fn fontstack_message(block: &RangeBlock) -> Fontstack {
    let mut stack = Fontstack::new();
    stack.set_name(block.face_name.clone());
    stack.set_range(block.range.name());

    let mut records: Vec<&GlyphRecord> = block.records.iter().collect();
    records.sort_by_key(|record| record.codepoint);
    records.dedup_by_key(|record| record.codepoint);
    stack.glyphs = records.into_iter().map(glyph_message).collect();
    stack
}

/// Serializes a single face's block.
pub fn encode(block: &RangeBlock) -> Result<OutputArtifact, EncodeError> {
    encode_faces(block.range, std::slice::from_ref(block))
}

/// Serializes the blocks of every face in a font into a single artifact, with one font
/// stack per face in the order given.
///
/// An empty slice, or blocks without any glyphs, still produce a valid artifact.
pub fn encode_faces(range: BlockRange, blocks: &[RangeBlock]) -> Result<OutputArtifact, EncodeError> {
    let mut glyphs = Glyphs::new();
    for block in blocks {
        if block.range != range {
            return Err(EncodeError::RangeMismatch {
                expected: range.name(),
                found: block.range.name(),
            });
        }
        glyphs.stacks.push(fontstack_message(block));
    }

    Ok(OutputArtifact {
        range,
        bytes: glyphs.write_to_bytes()?,
    })
}

/// Parses an artifact back into its protobuf message.
pub fn decode(bytes: &[u8]) -> Result<Glyphs, protobuf::Error> {
    Glyphs::parse_from_bytes(bytes)
}

/// Loads a single tile from disk.
///
/// Tiles are assumed to be stored in `<dir>/<start>-<end>.pbf`.
pub async fn load_glyphs<P: AsRef<Path>>(dir: P, start: u32, end: u32) -> Result<Glyphs, TileError> {
    let full_path = dir.as_ref().join(format!("{start}-{end}.pbf"));

    // Note: Counter-intuitively, it's much faster to use blocking IO with `spawn_blocking` here,
    // since the `Message::parse_` call will block as well.
    Ok(spawn_blocking(move || -> Result<Glyphs, TileError> {
        let mut file = File::open(full_path)?;
        Ok(Message::parse_from_reader(&mut file)?)
    })
    .await??)
}
