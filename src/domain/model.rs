use std::fmt;
use std::path::{Path, PathBuf};

/// File-name suffix that marks a module archive.
pub const MODULE_SUFFIX: &str = ".mod";

#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

/// Canonical, absolute location of one module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocation(PathBuf);

impl ModuleLocation {
    /// Callers must pass an already canonicalized path.
    pub(crate) fn from_canonical(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Name of the module stored at this location.
    ///
    /// `greeter.mod` and `greeter-1.4.2.mod` are both `greeter`. Locations
    /// without the archive suffix are named by their whole file name.
    pub fn module_name(&self) -> &str {
        let file_name = match self.0.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return "",
        };

        let stem = match file_name.strip_suffix(MODULE_SUFFIX) {
            Some(stem) if !stem.is_empty() => stem,
            _ => return file_name,
        };

        match stem.rsplit_once('-') {
            Some((name, version))
                if !name.is_empty() && version.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                name
            }
            _ => stem,
        }
    }
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Ordered, duplicate-free list of module locations. Earlier entries win
/// during symbol resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePath {
    locations: Vec<ModuleLocation>,
}

impl ModulePath {
    pub(crate) fn push(&mut self, location: ModuleLocation) {
        self.locations.push(location);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModuleLocation> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.locations.iter().map(ModuleLocation::module_name).collect()
    }

    /// Platform path-list rendering, for diagnostics.
    pub fn render(&self) -> String {
        let mut rendered = String::new();
        for location in &self.locations {
            if !rendered.is_empty() {
                rendered.push(PATH_SEPARATOR);
            }
            rendered.push_str(&location.path().to_string_lossy());
        }
        rendered
    }
}

impl<'a> IntoIterator for &'a ModulePath {
    type Item = &'a ModuleLocation;
    type IntoIter = std::slice::Iter<'a, ModuleLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

/// Signature of every invocable method: the full argument vector in, success
/// or an error chain out.
pub type EntryFn = fn(&[String]) -> anyhow::Result<()>;

/// Name of the method the launcher invokes.
pub const MAIN_METHOD: &str = "main";

#[derive(Clone, Copy)]
pub struct Method {
    pub name: &'static str,
    pub func: EntryFn,
}

impl Method {
    pub const fn new(name: &'static str, func: EntryFn) -> Self {
        Self { name, func }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}

/// A named, resolvable definition exported by a module.
///
/// `module` is empty for symbols built into the launcher itself.
#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    pub module: &'static str,
    pub name: &'static str,
    pub methods: &'static [Method],
}

impl Symbol {
    pub const fn new(module: &'static str, name: &'static str, methods: &'static [Method]) -> Self {
        Self {
            module,
            name,
            methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<EntryFn> {
        self.methods.iter().find(|m| m.name == name).map(|m| m.func)
    }

    pub fn is_builtin(&self) -> bool {
        self.module.is_empty()
    }
}
