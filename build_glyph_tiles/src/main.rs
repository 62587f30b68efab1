//! This binary crate provides a CLI utility for converting a font, or a directory of fonts,
//! into signed distance field glyph tiles, encoded in a protocol buffer for renderers such as
//! Mapbox GL. It is a frontend to `pbf_glyph_tiles` that behaves similar to
//! [node-fontnik](https://github.com/mapbox/node-fontnik).
//!
//! ## Usage
//!
//! Every run writes all 256 blocks (`0-255.pbf` through `65280-65535.pbf`), whether or not the
//! font has anything to draw in them. A single font is tiled straight into `out_dir`; for a
//! directory, each font gets a new subdirectory bearing its file stem. Blocks that already exist
//! are skipped unless `--overwrite` is given.
//!
//! ```
//! $ build-glyphs /path/to/font.ttf /path/to/out_dir
//! $ build-glyphs /path/to/font_dir /path/to/out_dir --overwrite
//! ```

use std::fs::read_dir;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{command, crate_authors, crate_description, crate_version, value_parser, Arg};
use pbf_glyph_tiles::{tile_font_file, CancelFlag, SdfConfig, TileOptions};

#[cfg(feature = "freetype")]
const ENGINE: pbf_glyph_tiles::FreetypeEngine = pbf_glyph_tiles::FreetypeEngine;
#[cfg(not(feature = "freetype"))]
const ENGINE: pbf_glyph_tiles::TtfParserEngine = pbf_glyph_tiles::TtfParserEngine;

/// Lists the `(font, output directory)` pairs to tile.
fn jobs(font: &Path, out_dir: &Path) -> Vec<(PathBuf, PathBuf)> {
    if !font.is_dir() {
        return vec![(font.to_path_buf(), out_dir.to_path_buf())];
    }

    let mut jobs: Vec<(PathBuf, PathBuf)> = read_dir(font)
        .expect("Unable to open font directory")
        .flatten()
        .filter_map(|dir_entry| {
            let path = dir_entry.path();
            let stem = path.file_stem()?.to_owned();
            let extension = path.extension()?.to_str()?.to_ascii_lowercase();

            if path.is_file() && ["otf", "ttf", "ttc"].contains(&extension.as_str()) {
                Some((path, out_dir.join(stem)))
            } else {
                None
            }
        })
        .collect();
    jobs.sort();
    jobs
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let defaults = SdfConfig::default();
    let matches = command!()
        .name("build-glyphs")
        .author(crate_authors!())
        .version(crate_version!())
        .before_help(crate_description!())
        .arg(Arg::new("FONT")
            .help("A font file (otf, ttf or ttc), or a directory to be scanned for fonts")
            .required(true)
            .index(1))
        .arg(Arg::new("OUT_DIR")
            .help("Sets the output directory in which the PBF glyphs will be placed (fonts found in a directory will each be placed in a new subdirectory named after the file)")
            .required(true)
            .index(2))
        .arg(Arg::new("OVERWRITE")
            .help("Overwrite existing glyphs; by default, generation will be skipped for any range with a matching file in the output directory. Note that the contents of the file are not inspected; only the name.")
            .required(false)
            .long("overwrite")
            .takes_value(false))
        .arg(Arg::new("THREADS")
            .help("Number of worker threads (defaults to the number of CPUs)")
            .long("threads")
            .takes_value(true)
            .value_parser(value_parser!(usize)))
        .arg(Arg::new("SIZE")
            .help("Font size (em) in pixels")
            .long("size")
            .takes_value(true)
            .value_parser(value_parser!(u32)))
        .arg(Arg::new("RADIUS")
            .help("Distance field radius in pixels")
            .long("radius")
            .takes_value(true)
            .value_parser(value_parser!(usize)))
        .arg(Arg::new("CUTOFF")
            .help("Fraction of the quantized range reserved for distances inside the glyph")
            .long("cutoff")
            .takes_value(true)
            .value_parser(value_parser!(f64)))
        .get_matches();

    let font = PathBuf::from(matches.get_one::<String>("FONT").unwrap());
    let out_dir = PathBuf::from(matches.get_one::<String>("OUT_DIR").unwrap());

    let mut options = TileOptions {
        config: SdfConfig {
            size: matches.get_one::<u32>("SIZE").copied().unwrap_or(defaults.size),
            radius: matches.get_one::<usize>("RADIUS").copied().unwrap_or(defaults.radius),
            cutoff: matches.get_one::<f64>("CUTOFF").copied().unwrap_or(defaults.cutoff),
            ..defaults
        },
        overwrite: matches.is_present("OVERWRITE"),
        ..TileOptions::default()
    };
    if let Err(e) = options.config.validate() {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
    if let Some(threads) = matches.get_one::<usize>("THREADS") {
        options.workers = (*threads).max(1);
    }
    println!("Starting {} worker threads...", options.workers);

    let cancel = CancelFlag::new();
    let render_start = Instant::now();
    let mut total_glyphs_rendered = 0;
    let mut failures = 0;

    for (path, font_out_dir) in jobs(&font, &out_dir) {
        println!("Processing {}", path.display());

        match tile_font_file(&path, &font_out_dir, &ENGINE, &options, &cancel) {
            Ok(report) => {
                if report.blocks_skipped > 0 {
                    println!(
                        "Skipped {} existing block(s) in {}",
                        report.blocks_skipped,
                        font_out_dir.display()
                    );
                }
                println!(
                    "Found {} valid glyphs across {} face(s) in {}",
                    report.glyphs_rendered,
                    report.faces.len(),
                    path.display()
                );
                if report.glyphs_failed > 0 {
                    println!(
                        "Failed to render {} glyph(s) in {}",
                        report.glyphs_failed,
                        path.display()
                    );
                }
                total_glyphs_rendered += report.glyphs_rendered;
            }
            Err(e) => {
                eprintln!("ERROR: {e}");
                failures += 1;
            }
        }
    }

    let render_duration = render_start.elapsed();

    if total_glyphs_rendered > 0 {
        let duration_per_glyph = render_duration / total_glyphs_rendered as u32;

        println!(
            "Rendered {} glyph(s) in {:?} ({:?}/glyph)",
            total_glyphs_rendered, render_duration, duration_per_glyph
        );
    }

    if failures > 0 {
        eprintln!("{failures} font(s) failed");
        std::process::exit(1);
    }
}
