use std::path::PathBuf;

use crate::font::Tag;

/// A font binary could not be loaded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FontParseError {
    #[error("Unrecognized font format (sfnt version 0x{0:08X})")]
    UnknownFormat(u32),
    #[error("Font data is truncated{}", in_table(.0))]
    Truncated(Option<Tag>),
    #[error("Required table '{0}' is missing")]
    MissingTable(Tag),
    #[error("Table '{table}' is malformed: {reason}")]
    Malformed { table: Tag, reason: &'static str },
    #[error("Face index {index} is out of range; the font contains {count} face(s)")]
    FaceIndexOutOfRange { index: u32, count: u32 },
    #[error("Font family name is not set")]
    MissingFamilyName,
    #[error("Outline engine rejected the font: {0}")]
    Engine(String),
}

fn in_table(table: &Option<Tag>) -> String {
    table
        .map(|tag| format!(" in table '{tag}'"))
        .unwrap_or_default()
}

/// A single glyph could not be rendered. These are never fatal to a tiling run.
#[derive(thiserror::Error, Debug)]
pub enum RasterizeError {
    #[error("No glyph is mapped to U+{0:04X}")]
    Unmapped(u32),
    #[error("Unable to decode outline for glyph {glyph_id}: {reason}")]
    Decode { glyph_id: u16, reason: String },
    #[error("SDF glyph error: {0}")]
    SdfGlyphError(#[from] sdf_outline_renderer::SdfGlyphError),
    #[cfg(feature = "freetype")]
    #[error("Freetype error: {0}")]
    FreetypeError(#[from] crate::freetype::Error),
}

/// Rendering parameters that cannot produce usable glyphs.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("Font size must be between 1 and {max}px, but {0}px was provided", max = crate::generate::MAX_FONT_SIZE)]
    InvalidSize(u32),
    #[error("The SDF radius must be at least 1px")]
    InvalidRadius,
    #[error("Cutoff must be between 0 and 1 (both non-inclusive), but {0} was provided")]
    InvalidCutoff(f64),
}

/// A block could not be serialized.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("Protobuf encoding error: {0}")]
    ProtobufError(#[from] protobuf::Error),
    #[error("Block {found} cannot be encoded into artifact {expected}")]
    RangeMismatch { expected: String, found: String },
}

#[derive(thiserror::Error, Debug)]
pub enum TileError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Sub-process error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("Font parse error: {0}")]
    FontParseError(#[from] FontParseError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to load font {}: {source}", .path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: FontParseError,
    },
    #[error("Unable to encode block {range}: {source}")]
    Encode {
        range: String,
        #[source]
        source: EncodeError,
    },
    #[error("Protobuf decoding error: {0}")]
    ProtobufError(#[from] protobuf::Error),
    #[error("Only {produced} of {expected} blocks were produced; failed: {}", .failures.join("; "))]
    Incomplete {
        produced: usize,
        expected: usize,
        failures: Vec<String>,
    },
    #[error("Run cancelled after {produced} of {expected} blocks")]
    Cancelled { produced: usize, expected: usize },
    #[error("A tiling worker panicked")]
    WorkerPanicked,
}
