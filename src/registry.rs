//! Font inspection: what a font file, or a whole directory of them, can render.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;
use tokio::task::spawn_blocking;

use crate::coverage::{coverage, Coverage};
use crate::error::{FontParseError, TileError};
use crate::font::FontFace;

/// The coverage report for one face.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaceCoverage {
    pub face: String,
    pub coverage: Coverage,
}

impl FaceCoverage {
    fn of(face: &FontFace) -> FaceCoverage {
        FaceCoverage {
            face: face.face_name(),
            coverage: coverage(face),
        }
    }
}

/// A directory entry that was skipped because it could not be loaded as a font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// The result of resolving a font file or directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    /// Every face found, sorted by face name.
    pub faces: Vec<FaceCoverage>,
    /// The font files that were loaded, in discovery order.
    pub resolved: Vec<PathBuf>,
    pub warnings: Vec<ResolverWarning>,
}

/// Lists every file under `dir`, recursively, visiting entries in file name order.
///
/// Symbolic links are followed, but each directory is only walked once.
fn discover(
    dir: &Path,
    visited: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    if !visited.insert(dir.canonicalize()?) {
        return Ok(());
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for path in entries {
        if path.is_dir() {
            discover(&path, visited, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, TileError> {
    std::fs::read(path).map_err(|source| TileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_face(path: &Path) -> Result<FaceCoverage, TileError> {
    let data = read(path)?;
    FontFace::load(data)
        .map(|face| FaceCoverage::of(&face))
        .map_err(|source| TileError::Font {
            path: path.to_path_buf(),
            source,
        })
}

fn load_file(path: &Path) -> Result<Vec<FontFace>, TileError> {
    let data = read(path)?;
    FontFace::load_all(data).map_err(|source| TileError::Font {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves `path` into a coverage report.
///
/// A file is loaded as a single face (face 0) and any failure is an error. A directory is
/// walked recursively; every face of every font found is reported, and files that are not
/// fonts are skipped and listed in [`Registry::warnings`]. Faces are sorted by name, so the
/// report for a given directory is stable.
pub async fn resolve<P: AsRef<Path>>(path: P) -> Result<Registry, TileError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_dir() {
        let face = {
            let path = path.clone();
            spawn_blocking(move || load_face(&path)).await??
        };
        return Ok(Registry {
            faces: vec![face],
            resolved: vec![path],
            warnings: Vec::new(),
        });
    }

    let files = {
        let path = path.clone();
        spawn_blocking(move || {
            let mut files = Vec::new();
            discover(&path, &mut HashSet::new(), &mut files).map(|_| files)
        })
        .await??
    };

    // Fonts load in parallel; the ordering below doesn't depend on completion order
    let loaded = join_all(files.into_iter().map(|file| {
        spawn_blocking(move || {
            let result = load_file(&file).map(|faces| {
                faces.iter().map(FaceCoverage::of).collect::<Vec<_>>()
            });
            (file, result)
        })
    }))
    .await;

    let mut registry = Registry::default();
    for joined in loaded {
        let (file, result) = joined?;
        match result {
            Ok(faces) => {
                registry.faces.extend(faces);
                registry.resolved.push(file);
            }
            Err(e) => {
                let reason = match e {
                    TileError::Font { source, .. } => source.to_string(),
                    TileError::Read { source, .. } => source.to_string(),
                    e => e.to_string(),
                };
                registry.warnings.push(ResolverWarning { path: file, reason });
            }
        }
    }
    // Stable, so faces with the same name stay in discovery order
    registry.faces.sort_by(|a, b| a.face.cmp(&b.face));

    Ok(registry)
}

/// Loads face 0 of a font binary and reports its coverage.
pub fn inspect_face(data: Vec<u8>) -> Result<FaceCoverage, FontParseError> {
    FontFace::load(data).map(|face| FaceCoverage::of(&face))
}

#[cfg(test)]
mod tests {
    use super::{inspect_face, resolve, FaceCoverage};
    use crate::error::TileError;
    use crate::font_builder::{collection, FontBuilder};

    #[tokio::test]
    async fn test_resolve_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.ttf");
        std::fs::write(
            &path,
            FontBuilder::new("Single").codepoints([0x41, 0x20]).build(),
        )
        .unwrap();

        let registry = resolve(&path).await.unwrap();

        assert_eq!(registry.faces.len(), 1);
        assert_eq!(registry.faces[0].face, "Single Regular");
        assert_eq!(registry.faces[0].coverage.as_slice(), &[0x20, 0x41]);
        assert_eq!(registry.resolved, vec![path]);
    }

    #[tokio::test]
    async fn test_single_file_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert!(matches!(
            resolve(&path).await,
            Err(TileError::Font { path: p, .. }) if p == path
        ));
    }

    #[tokio::test]
    async fn test_resolve_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            dir.path().join("a.ttf"),
            FontBuilder::new("Zeta").codepoints([0x41]).build(),
        )
        .unwrap();
        std::fs::write(dir.path().join("b.txt"), b"some notes").unwrap();
        std::fs::write(
            nested.join("c.ttc"),
            collection(&[
                FontBuilder::new("Alpha").codepoints([0x42]).build(),
                FontBuilder::new("Alpha").style("Bold").codepoints([0x43]).build(),
            ]),
        )
        .unwrap();

        let registry = resolve(dir.path()).await.unwrap();

        let names: Vec<&str> = registry.faces.iter().map(|f| f.face.as_str()).collect();
        assert_eq!(names, vec!["Alpha Bold", "Alpha Regular", "Zeta Regular"]);
        assert_eq!(
            registry.resolved,
            vec![dir.path().join("a.ttf"), nested.join("c.ttc")]
        );
        assert_eq!(registry.warnings.len(), 1);
        assert_eq!(registry.warnings[0].path, dir.path().join("b.txt"));
    }

    #[tokio::test]
    async fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ttf");

        let err = resolve(&path).await.unwrap_err();

        assert!(matches!(err, TileError::Read { path: ref p, .. } if p == &path));
        assert!(err.to_string().contains("missing.ttf"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_loops_are_walked_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.ttf"),
            FontBuilder::new("Looped").codepoints([0x41]).build(),
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let registry = resolve(dir.path()).await.unwrap();

        assert_eq!(registry.faces.len(), 1);
        assert_eq!(registry.resolved, vec![dir.path().join("a.ttf")]);
        assert!(registry.warnings.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let entry: FaceCoverage =
            inspect_face(FontBuilder::new("Json").codepoints([0x41, 0x42]).build()).unwrap();

        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"face":"Json Regular","coverage":[65,66]}"#
        );
    }
}
