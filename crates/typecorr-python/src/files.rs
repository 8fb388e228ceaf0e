//! Python package discovery.
//!
//! Walks a package directory and names every source file as a module. A
//! file in a private submodule (`pkg/_impl.py`, `pkg/_lib/x.py`) is
//! addressed under the public namespace users import it from, the longest
//! prefix of its module path without private segments.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The package root is not a directory.
    #[error("not a package directory: {path}")]
    NotADirectory { path: String },

    /// The package root has no usable name.
    #[error("cannot derive a package name from {path}")]
    NoPackageName { path: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// Discovery
// ============================================================================

/// One source file of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the package's parent directory (`pkg/a/b.py`).
    pub rel_path: String,
    /// Dotted module name (`pkg.a.b`, `pkg` for `pkg/__init__.py`).
    pub module: String,
    /// Public namespace the module's symbols are addressed under.
    pub namespace: String,
    /// True for `__init__.py`.
    pub is_package: bool,
}

impl SourceFile {
    /// File name without extension (`__init__`, `_data`).
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// The discovered files of a package, sorted by path.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    pub name: String,
    pub root: PathBuf,
    pub files: Vec<SourceFile>,
}

/// `_x` names are private; dunders are not.
pub(crate) fn is_private(segment: &str) -> bool {
    segment.starts_with('_') && !(segment.starts_with("__") && segment.ends_with("__"))
}

/// Longest prefix of `module` without private segments.
pub fn public_namespace(module: &str) -> String {
    module
        .split('.')
        .take_while(|s| !is_private(s))
        .collect::<Vec<_>>()
        .join(".")
}

/// Discover the Python files of the package rooted at `root`.
///
/// Hidden directories and `__pycache__` are skipped. With
/// `include_submodules` false only files directly in `root` are returned.
pub fn discover_package(root: &Path, include_submodules: bool) -> FileResult<PackageLayout> {
    if !root.is_dir() {
        return Err(FileError::NotADirectory {
            path: root.display().to_string(),
        });
    }
    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| FileError::NoPackageName {
            path: root.display().to_string(),
        })?
        .to_string();

    let max_depth = if include_submodules { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| {
            let n = e.file_name().to_string_lossy();
            e.depth() == 0 || !(n.starts_with('.') || n == "__pycache__")
        })
    {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop"))
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "py") {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };

        let mut segments: Vec<String> = vec![name.clone()];
        segments.extend(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string()),
        );
        let file_name = segments.pop().unwrap_or_default();
        let stem = file_name.trim_end_matches(".py");
        let is_package = stem == "__init__";
        if !is_package {
            segments.push(stem.to_string());
        }
        let module = segments.join(".");

        files.push(SourceFile {
            path: path.to_path_buf(),
            rel_path: format!("{}/{}", name, rel.to_string_lossy().replace('\\', "/")),
            namespace: public_namespace(&module),
            module,
            is_package,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(PackageLayout {
        name,
        root: root.to_path_buf(),
        files,
    })
}
