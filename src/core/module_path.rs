use crate::domain::model::{ModuleLocation, ModulePath, MODULE_SUFFIX};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Accumulates a [`ModulePath`] from individual paths, path lists, and
/// directory scans.
///
/// Paths that do not exist or cannot be canonicalized are skipped without
/// error; deciding whether an empty result is fatal is the caller's job.
#[derive(Debug, Default, Clone)]
pub struct ModulePathBuilder {
    path: ModulePath,
    seen: HashSet<PathBuf>,
}

impl ModulePathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_separated_list(list: &str) -> Self {
        let mut builder = Self::new();
        builder.add_from_separated_list(list);
        builder
    }

    /// Adds one location. Returns `true` only if a new entry was appended.
    pub fn add_location(&mut self, candidate: impl AsRef<Path>) -> bool {
        let candidate = candidate.as_ref();
        if candidate.as_os_str().is_empty() {
            return false;
        }

        let canonical = match fs::canonicalize(candidate) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("Skipping module location {}: {}", candidate.display(), e);
                return false;
            }
        };

        if !self.seen.insert(canonical.clone()) {
            tracing::debug!("Duplicate module location {}", canonical.display());
            return false;
        }

        tracing::debug!("Added module location {}", canonical.display());
        self.path.push(ModuleLocation::from_canonical(canonical));
        true
    }

    /// Adds every entry of a platform path list (`a:b:c`, or `a;b;c` on
    /// Windows), in order. Returns `true` if at least one entry was added.
    pub fn add_from_separated_list(&mut self, list: &str) -> bool {
        let mut added = false;
        for entry in std::env::split_paths(list) {
            added |= self.add_location(entry);
        }
        added
    }

    /// Recursively adds every module archive under `root`. Directories are
    /// descended into, never added. Returns the number of new entries.
    pub fn scan_directory(&mut self, root: impl AsRef<Path>) -> usize {
        let mut visited = HashSet::new();
        let before = self.path.len();
        self.scan_into(root.as_ref(), &mut visited);
        self.path.len() - before
    }

    fn scan_into(&mut self, dir: &Path, visited: &mut HashSet<PathBuf>) {
        // A symlinked directory can point back up the tree.
        match fs::canonicalize(dir) {
            Ok(canonical) => {
                if !visited.insert(canonical) {
                    return;
                }
            }
            Err(_) => return,
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.scan_into(&path, visited);
            } else if is_module_archive(&path) {
                self.add_location(&path);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn render(&self) -> String {
        self.path.render()
    }

    pub fn as_loader_path(&self) -> &ModulePath {
        &self.path
    }

    pub fn into_loader_path(self) -> ModulePath {
        self.path
    }
}

// Byte comparison, so names that are not valid UTF-8 still match.
fn is_module_archive(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(MODULE_SUFFIX.as_bytes()))
}
