//! Renders a whole font into its tile set: one artifact for every block of the code point
//! space, written to an output directory by a pool of worker threads.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use spmc::{channel, Receiver};
use tempfile::NamedTempFile;

use crate::coverage::{coverage, Coverage};
use crate::encode::{encode_faces, OutputArtifact};
use crate::engine::{FaceHandle, OutlineEngine};
use crate::error::{EncodeError, FontParseError, TileError};
use crate::font::FontFace;
use crate::generate::{glyph_range_for_face, SdfConfig};
use crate::range::{blocks, BlockRange, BLOCK_COUNT};

/// Options for a tiling run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileOptions {
    pub config: SdfConfig,

    /// Re-render blocks whose artifact already exists. Note that the contents of existing
    /// files are not inspected; only the name.
    pub overwrite: bool,

    /// The number of worker threads.
    pub workers: usize,
}

impl Default for TileOptions {
    fn default() -> Self {
        TileOptions {
            config: SdfConfig::default(),
            overwrite: false,
            workers: num_cpus::get(),
        }
    }
}

/// A handle for aborting a tiling run from another thread.
///
/// Workers check the flag between blocks, so the block in progress is always finished (and
/// published) or never started.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The outcome of a complete tiling run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileReport {
    /// The name of every face in the font, in face index order.
    pub faces: Vec<String>,
    pub blocks_written: usize,
    /// Blocks left alone because their artifact already existed.
    pub blocks_skipped: usize,
    pub glyphs_rendered: usize,
    /// Glyphs that could not be rendered and were left out of their block.
    pub glyphs_failed: usize,
}

impl TileReport {
    /// The number of blocks that have an artifact on disk.
    #[must_use]
    pub fn blocks_produced(&self) -> usize {
        self.blocks_written + self.blocks_skipped
    }
}

/// A face ready for rendering on the current thread.
struct PreparedFace<'a, H> {
    face: &'a FontFace,
    coverage: &'a Coverage,
    handle: H,
}

fn prepare<'a, E: OutlineEngine>(
    faces: &'a [FontFace],
    coverages: &'a [Coverage],
    engine: &'a E,
    size: u32,
) -> Result<Vec<PreparedFace<'a, E::Handle<'a>>>, FontParseError> {
    faces
        .iter()
        .zip(coverages)
        .map(|(face, coverage)| {
            Ok(PreparedFace {
                face,
                coverage,
                handle: engine.shape_face(face, size)?,
            })
        })
        .collect()
}

struct RenderedBlock {
    artifact: OutputArtifact,
    glyphs_rendered: usize,
    glyphs_failed: usize,
}

fn render_prepared<H: FaceHandle>(
    prepared: &[PreparedFace<'_, H>],
    range: BlockRange,
    config: &SdfConfig,
) -> Result<RenderedBlock, EncodeError> {
    let mut range_blocks = Vec::with_capacity(prepared.len());
    let mut glyphs_failed = 0;
    for face in prepared {
        let (block, failures) =
            glyph_range_for_face(face.face, &face.handle, face.coverage, range, config);
        glyphs_failed += failures.len();
        range_blocks.push(block);
    }

    Ok(RenderedBlock {
        glyphs_rendered: range_blocks.iter().map(|block| block.records.len()).sum(),
        glyphs_failed,
        artifact: encode_faces(range, &range_blocks)?,
    })
}

/// Renders a single block of every face entirely in memory.
pub fn render_block<E: OutlineEngine>(
    faces: &[FontFace],
    engine: &E,
    range: BlockRange,
    config: &SdfConfig,
) -> Result<OutputArtifact, TileError> {
    config.validate()?;
    let coverages: Vec<Coverage> = faces.iter().map(coverage).collect();
    let prepared = prepare(faces, &coverages, engine, config.size)?;

    render_prepared(&prepared, range, config)
        .map(|rendered| rendered.artifact)
        .map_err(|source| TileError::Encode {
            range: range.name(),
            source,
        })
}

/// Writes an artifact next to its final location, then renames it into place so that readers
/// never observe a partially written file.
fn publish(out_dir: &Path, artifact: &OutputArtifact) -> std::io::Result<()> {
    let mut file = NamedTempFile::new_in(out_dir)?;
    file.write_all(&artifact.bytes)?;
    file.flush()?;
    file.persist(out_dir.join(artifact.file_name()))
        .map_err(|e| e.error)?;
    Ok(())
}

#[derive(Default)]
struct Counters {
    blocks_written: AtomicUsize,
    blocks_skipped: AtomicUsize,
    glyphs_rendered: AtomicUsize,
    glyphs_failed: AtomicUsize,
}

/// Everything the workers share. All of it is read-only apart from the counters and the
/// failure list.
struct TileContext<'a, E> {
    faces: &'a [FontFace],
    coverages: &'a [Coverage],
    engine: &'a E,
    out_dir: &'a Path,
    options: &'a TileOptions,
    cancel: &'a CancelFlag,
    counters: Counters,
    failures: Mutex<Vec<String>>,
}

impl<E> TileContext<'_, E> {
    fn fail(&self, range: BlockRange, reason: String) {
        log::error!("Failed to produce block {range}: {reason}");
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{range}: {reason}"));
    }
}

/// A worker that renders and publishes blocks until it receives the `None` sentinel.
fn tile_worker<E: OutlineEngine>(
    ctx: &TileContext<'_, E>,
    rx: Receiver<Option<BlockRange>>,
) -> Result<(), FontParseError> {
    // Handles are not shared between threads, so shape the faces once per worker
    let prepared = prepare(ctx.faces, ctx.coverages, ctx.engine, ctx.options.config.size)?;

    while let Ok(Some(range)) = rx.recv() {
        if ctx.cancel.is_cancelled() {
            // Consume the remaining jobs without starting them
            continue;
        }

        if !ctx.options.overwrite && ctx.out_dir.join(range.file_name()).exists() {
            ctx.counters.blocks_skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let rendered = match render_prepared(&prepared, range, &ctx.options.config) {
            Ok(rendered) => rendered,
            Err(e) => {
                ctx.fail(range, e.to_string());
                continue;
            }
        };

        if let Err(e) = publish(ctx.out_dir, &rendered.artifact) {
            ctx.fail(range, e.to_string());
            continue;
        }

        log::debug!(
            "Wrote {} with {} glyph(s)",
            rendered.artifact.file_name(),
            rendered.glyphs_rendered
        );
        ctx.counters.blocks_written.fetch_add(1, Ordering::Relaxed);
        ctx.counters
            .glyphs_rendered
            .fetch_add(rendered.glyphs_rendered, Ordering::Relaxed);
        ctx.counters
            .glyphs_failed
            .fetch_add(rendered.glyphs_failed, Ordering::Relaxed);
    }

    Ok(())
}

/// Renders every block of `faces` into `out_dir`, one `<start>-<end>.pbf` artifact per block
/// with one font stack per face.
///
/// The configuration is validated before anything is written. A run only succeeds once all
/// [`BLOCK_COUNT`] artifacts exist. Glyphs that fail to render
/// are logged and left out of their block; blocks that fail to encode or publish make the
/// run [`Incomplete`](TileError::Incomplete).
pub fn tile_font<E: OutlineEngine>(
    faces: &[FontFace],
    engine: &E,
    out_dir: &Path,
    options: &TileOptions,
    cancel: &CancelFlag,
) -> Result<TileReport, TileError> {
    options.config.validate()?;
    std::fs::create_dir_all(out_dir)?;

    let coverages: Vec<Coverage> = faces.iter().map(coverage).collect();
    // Surface engine problems once, up front, rather than from every worker
    drop(prepare(faces, &coverages, engine, options.config.size)?);

    let ctx = TileContext {
        faces,
        coverages: &coverages,
        engine,
        out_dir,
        options,
        cancel,
        counters: Counters::default(),
        failures: Mutex::new(Vec::new()),
    };
    let num_workers = options.workers.max(1);

    thread::scope(|scope| -> Result<(), TileError> {
        let (mut tx, rx) = channel();
        let ctx = &ctx;
        let join_handles: Vec<_> = (0..num_workers)
            .map(|_| {
                let rx = rx.clone();
                scope.spawn(move || tile_worker(ctx, rx))
            })
            .collect();
        drop(rx);

        for range in blocks() {
            if tx.send(Some(range)).is_err() {
                // Every worker has already exited; the join below reports why
                break;
            }
        }
        for _ in 0..num_workers {
            // Sentinel value to signal the end of the work pool for each thread
            let _ = tx.send(None);
        }

        for handle in join_handles {
            handle.join().map_err(|_| TileError::WorkerPanicked)??;
        }
        Ok(())
    })?;

    let report = TileReport {
        faces: faces.iter().map(FontFace::face_name).collect(),
        blocks_written: ctx.counters.blocks_written.load(Ordering::Relaxed),
        blocks_skipped: ctx.counters.blocks_skipped.load(Ordering::Relaxed),
        glyphs_rendered: ctx.counters.glyphs_rendered.load(Ordering::Relaxed),
        glyphs_failed: ctx.counters.glyphs_failed.load(Ordering::Relaxed),
    };
    let failures = ctx.failures.into_inner().unwrap_or_else(PoisonError::into_inner);
    let produced = report.blocks_produced();

    if !failures.is_empty() {
        return Err(TileError::Incomplete {
            produced,
            expected: BLOCK_COUNT,
            failures,
        });
    }
    if produced < BLOCK_COUNT {
        return Err(if cancel.is_cancelled() {
            TileError::Cancelled {
                produced,
                expected: BLOCK_COUNT,
            }
        } else {
            TileError::Incomplete {
                produced,
                expected: BLOCK_COUNT,
                failures,
            }
        });
    }

    log::info!(
        "Rendered {} glyph(s) from [{}] into {} ({} block(s) skipped)",
        report.glyphs_rendered,
        report.faces.join(", "),
        out_dir.display(),
        report.blocks_skipped
    );
    Ok(report)
}

/// Loads every face of the font at `path` and tiles it into `out_dir`.
pub fn tile_font_file<E: OutlineEngine>(
    path: &Path,
    out_dir: &Path,
    engine: &E,
    options: &TileOptions,
    cancel: &CancelFlag,
) -> Result<TileReport, TileError> {
    let font_error = |source: FontParseError| TileError::Font {
        path: PathBuf::from(path),
        source,
    };

    let data = std::fs::read(path).map_err(|source| TileError::Read {
        path: PathBuf::from(path),
        source,
    })?;
    let faces = FontFace::load_all(data).map_err(font_error)?;
    tile_font(&faces, engine, out_dir, options, cancel).map_err(|e| match e {
        TileError::FontParseError(source) => font_error(source),
        e => e,
    })
}
