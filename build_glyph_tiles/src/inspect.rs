//! Reports which code points a font, or every font in a directory, can render.
//!
//! The report is a JSON array of `{"face": ..., "coverage": [...]}` objects on stdout, sorted
//! by face name. With `--verbose`, the font files that were loaded are listed on stderr first,
//! ahead of any warnings about skipped files, so stdout stays machine-readable.
//!
//! ```
//! $ font-inspect --face /path/to/font.ttf
//! $ font-inspect --register /path/to/font_dir --verbose
//! ```

use clap::{command, crate_authors, crate_version, Arg, ArgGroup};
use pbf_glyph_tiles::resolve;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = command!()
        .name("font-inspect")
        .author(crate_authors!())
        .version(crate_version!())
        .before_help("Prints the code point coverage of a font, or of every font in a directory, as JSON.")
        .arg(Arg::new("FACE")
            .help("A single font file; face 0 is reported")
            .long("face")
            .takes_value(true))
        .arg(Arg::new("REGISTER")
            .help("A directory to be scanned recursively for fonts; files that are not fonts are skipped")
            .long("register")
            .takes_value(true))
        .group(ArgGroup::new("SOURCE")
            .args(&["FACE", "REGISTER"])
            .required(true))
        .arg(Arg::new("VERBOSE")
            .help("List the resolved font files on stderr before the report")
            .short('v')
            .long("verbose")
            .takes_value(false))
        .get_matches();

    let path = matches
        .get_one::<String>("FACE")
        .or_else(|| matches.get_one::<String>("REGISTER"))
        .unwrap();

    let registry = match resolve(path).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    if matches.is_present("VERBOSE") {
        eprintln!(
            "resolved {}",
            serde_json::to_string(&registry.resolved).expect("Unable to serialize file list")
        );
    }
    for warning in &registry.warnings {
        log::warn!("Skipping {}: {}", warning.path.display(), warning.reason);
    }
    println!(
        "{}",
        serde_json::to_string(&registry.faces).expect("Unable to serialize coverage report")
    );
}
