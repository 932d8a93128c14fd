use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source of template text. Paths are `/`-separated and relative to the
/// loader's root.
pub trait TemplateLoader: Send + Sync {
    fn load(&self, path: &str) -> io::Result<String>;

    /// All template files below `dir`, as sorted paths relative to `dir`
    fn list(&self, dir: &str) -> io::Result<Vec<String>>;
}

/// Loads templates from a directory on disk
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    base: PathBuf,
}

impl FileSystemLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.base.join(path))
    }

    fn list(&self, dir: &str) -> io::Result<Vec<String>> {
        let root = self.base.join(dir);
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }
}

/// In-memory templates keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(path.into(), source.into());
    }

    pub fn with(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        self.templates
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("template '{}' not found", path)))
    }

    fn list(&self, dir: &str) -> io::Result<Vec<String>> {
        let dir = dir.trim_matches('/');
        let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };
        Ok(self
            .templates
            .keys()
            .filter_map(|path| path.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .collect())
    }
}
