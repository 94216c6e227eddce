//! File discovery for finding images in directories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ConfigError;

/// Discovers files under a root directory whose extension is accepted.
pub struct FileDiscovery {
    extensions: HashSet<String>,
}

/// Ordered set of candidate files produced by one discovery pass.
///
/// Immutable once built; discovery can be re-run to derive it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    paths: Vec<PathBuf>,
}

impl FileSet {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

impl IntoIterator for FileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl FromIterator<PathBuf> for FileSet {
    fn from_iter<T: IntoIterator<Item = PathBuf>>(iter: T) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Normalize an extension for comparison: no leading dot, lowercase.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

impl FileDiscovery {
    /// Create a discovery instance accepting the given extensions.
    ///
    /// Extensions are matched case-insensitively and may be written with or
    /// without a leading dot (`".JPG"`, `"jpg"`).
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
        }
    }

    /// Recursively find all accepted regular files under `root`.
    ///
    /// Entries are visited in directory-traversal order with siblings sorted
    /// by file name.
    pub fn discover(&self, root: &Path) -> Result<FileSet, ConfigError> {
        if !root.is_dir() {
            return Err(ConfigError::InputNotFound(root.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let entry_path = entry.path();
            if entry.file_type().is_file() && self.is_supported(entry_path) {
                paths.push(entry_path.to_path_buf());
            }
        }

        tracing::debug!("Discovered {} file(s) under {:?}", paths.len(), root);
        Ok(FileSet { paths })
    }

    /// Check if a file has an accepted extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}
