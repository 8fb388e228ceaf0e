//! Loading and saving of pass artifacts.
//!
//! File layout for a package `pkg`:
//!
//! | File | Direction | Format |
//! |------|-----------|--------|
//! | `<map_dir>/pkg.{params,returns,attrs}.map` | read | `raw#canonical` lines |
//! | `<output_dir>/pkg.{params,returns,attrs}.map.missing` | write | `[@]count#raw#canonical` lines |
//! | `<output_dir>/pkg.fullmap.json` | write | correlation map |
//! | `<output_dir>/pkg.imports.json` | write | `class -> module` |
//! | `<output_dir>/pkg.docstrings.json` | write | docstring cache |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{KnownMap, Report};
use crate::sections::{Section, Sections};
use crate::state::{DocstringCache, FullMap, ImportMap};

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while reading or writing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A known-type map line without a `#` separator.
    #[error("{path}:{line}: malformed map line '{content}'")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Paths
// ============================================================================

/// `<map_dir>/<package>.<section>.map`
pub fn known_map_path(map_dir: &Path, package: &str, section: Section) -> PathBuf {
    map_dir.join(format!("{}.{}.map", package, section))
}

/// `<output_dir>/<package>.<section>.map.missing`
pub fn report_path(output_dir: &Path, package: &str, section: Section) -> PathBuf {
    output_dir.join(format!("{}.{}.map.missing", package, section))
}

pub fn fullmap_path(output_dir: &Path, package: &str) -> PathBuf {
    output_dir.join(format!("{}.fullmap.json", package))
}

pub fn imports_path(output_dir: &Path, package: &str) -> PathBuf {
    output_dir.join(format!("{}.imports.json", package))
}

pub fn docstrings_path(output_dir: &Path, package: &str) -> PathBuf {
    output_dir.join(format!("{}.docstrings.json", package))
}

// ============================================================================
// Known-type maps
// ============================================================================

/// Load the three known-type maps of `package`.
///
/// A missing map file yields an empty map for that section.
pub fn load_known_maps(map_dir: &Path, package: &str) -> StoreResult<Sections<KnownMap>> {
    let mut maps = Sections::<KnownMap>::default();
    for section in Section::ALL {
        let path = known_map_path(map_dir, package, section);
        if path.exists() {
            *maps.get_mut(section) = load_known_map(&path)?;
            tracing::debug!(
                "loaded {} {} mappings from {}",
                maps.get(section).len(),
                section,
                path.display()
            );
        }
    }
    Ok(maps)
}

/// Parse one `raw#canonical` map file.
///
/// Blank lines are skipped. The separator is the last `#`, since canonical
/// type strings never contain one.
pub fn load_known_map(path: &Path) -> StoreResult<KnownMap> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut map = KnownMap::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (raw, canonical) = line.rsplit_once('#').ok_or_else(|| StoreError::MalformedLine {
            path: path.to_path_buf(),
            line: idx + 1,
            content: line.to_string(),
        })?;
        map.insert(raw.to_string(), canonical.trim().to_string());
    }
    Ok(map)
}

// ============================================================================
// Outputs
// ============================================================================

/// Write the per-section reports of `package`.
pub fn save_reports(output_dir: &Path, package: &str, reports: &Sections<Report>) -> StoreResult<()> {
    for (section, report) in reports.iter() {
        let path = report_path(output_dir, package, section);
        write_file(&path, report.render().as_bytes())?;
    }
    Ok(())
}

pub fn save_fullmap(output_dir: &Path, package: &str, fullmap: &FullMap) -> StoreResult<()> {
    save_json(&fullmap_path(output_dir, package), fullmap)
}

pub fn save_imports(output_dir: &Path, package: &str, imports: &ImportMap) -> StoreResult<()> {
    save_json(&imports_path(output_dir, package), imports)
}

pub fn save_docstrings(
    output_dir: &Path,
    package: &str,
    docstrings: &DocstringCache,
) -> StoreResult<()> {
    save_json(&docstrings_path(output_dir, package), docstrings)
}

/// Read a previously saved correlation map.
pub fn load_fullmap(output_dir: &Path, package: &str) -> StoreResult<FullMap> {
    load_json(&fullmap_path(output_dir, package))
}

/// Serialize `value` as pretty JSON to `path`.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_file(path, content.as_bytes())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path`, creating parent directories.
fn write_file(path: &Path, content: &[u8]) -> StoreResult<()> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    atomic_write(path, content).map_err(io_err)
}

/// Write through a temp file and rename, so readers never see a partial file.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = path.with_file_name(format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id()
    ));
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ReportLine;
    use tempfile::TempDir;

    #[test]
    fn known_maps_missing_files_are_empty() {
        let dir = TempDir::new().unwrap();
        let maps = load_known_maps(dir.path(), "pkg").unwrap();
        assert!(maps.params.is_empty());
        assert!(maps.returns.is_empty());
        assert!(maps.attrs.is_empty());
    }

    #[test]
    fn known_map_lines_split_on_last_hash() {
        let dir = TempDir::new().unwrap();
        fs::write(
            known_map_path(dir.path(), "pkg", Section::Params),
            "array-like of shape (n_samples,)#ArrayLike\n\nint, default=5#int\n",
        )
        .unwrap();
        let maps = load_known_maps(dir.path(), "pkg").unwrap();
        assert_eq!(maps.params["array-like of shape (n_samples,)"], "ArrayLike");
        assert_eq!(maps.params["int, default=5"], "int");
        assert_eq!(maps.params.len(), 2);
    }

    #[test]
    fn known_map_without_separator_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = known_map_path(dir.path(), "pkg", Section::Returns);
        fs::write(&path, "int#int\nbroken line\n").unwrap();
        let err = load_known_maps(dir.path(), "pkg").unwrap_err();
        match err {
            StoreError::MalformedLine { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "broken line");
            }
            other => panic!("Expected MalformedLine, got {:?}", other),
        }
    }

    #[test]
    fn reports_are_written_per_section() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("analysis");
        let mut reports = Sections::<Report>::default();
        reports.params.lines.push(ReportLine {
            trivial: true,
            count: Some(1),
            raw_type: "bool".to_string(),
            canonical: "bool".to_string(),
        });

        save_reports(&out, "pkg", &reports).unwrap();

        let params = fs::read_to_string(report_path(&out, "pkg", Section::Params)).unwrap();
        assert_eq!(params, "@1#bool#bool\n");
        let attrs = fs::read_to_string(report_path(&out, "pkg", Section::Attrs)).unwrap();
        assert_eq!(attrs, "");
    }

    #[test]
    fn fullmap_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let mut fullmap = FullMap::default();
        fullmap
            .params
            .insert("pkg.Scaler.copy".to_string(), "bool".to_string());
        save_fullmap(dir.path(), "pkg", &fullmap).unwrap();
        assert_eq!(load_fullmap(dir.path(), "pkg").unwrap(), fullmap);
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temp file left behind");
    }
}
