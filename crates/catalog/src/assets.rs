use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::CatalogError;

/// Text assets read from one directory, memoized by file name.
#[derive(Debug)]
pub struct AssetCache {
    root: PathBuf,
    entries: HashMap<String, String>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cache_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub cached_items: Vec<String>,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the text of `name`, reading it from disk on first use.
    ///
    /// Failed reads are not cached, so a later call retries the file.
    pub fn load(&mut self, name: &str) -> Result<&str, CatalogError> {
        validate_name(name)?;
        if self.entries.contains_key(name) {
            self.hits += 1;
        } else {
            let path = self.root.join(name);
            let contents = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), bytes = contents.len(), "cached asset");
            self.misses += 1;
            self.entries.insert(name.to_string(), contents);
        }
        Ok(self.entries[name].as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let mut cached_items: Vec<String> = self.entries.keys().cloned().collect();
        cached_items.sort();
        CacheStats {
            cache_size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            cached_items,
        }
    }
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    let path = Path::new(name);
    let plain = !name.trim().is_empty()
        && path.components().count() == 1
        && path.file_name().is_some_and(|file| file == name);
    if plain {
        Ok(())
    } else {
        Err(CatalogError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memoizes_by_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.glsl"), "void main() {}").unwrap();
        let mut cache = AssetCache::new(dir.path());

        assert_eq!(cache.load("a.glsl").unwrap(), "void main() {}");
        fs::write(dir.path().join("a.glsl"), "changed").unwrap();
        assert_eq!(cache.load("a.glsl").unwrap(), "void main() {}");

        let stats = cache.stats();
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cached_items, vec!["a.glsl".to_string()]);

        cache.clear();
        assert_eq!(cache.load("a.glsl").unwrap(), "changed");
    }

    #[test]
    fn missing_files_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let mut cache = AssetCache::new(dir.path());
        assert!(matches!(cache.load("late.md"), Err(CatalogError::Io { .. })));
        fs::write(dir.path().join("late.md"), "# Late").unwrap();
        assert_eq!(cache.load("late.md").unwrap(), "# Late");
    }

    #[test]
    fn rejects_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let mut cache = AssetCache::new(dir.path());
        for name in ["../secret", "nested/file.glsl", "", "/etc/passwd"] {
            assert!(
                matches!(cache.load(name), Err(CatalogError::InvalidName(_))),
                "accepted {name:?}"
            );
        }
    }
}
