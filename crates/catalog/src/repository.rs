//! Resolves shader entries into ready-to-load programs and documentation.
//!
//! The playground hands it the configured base names; it consults an
//! `AssetCache` rooted at the shader directory, splices each fragment into the
//! shared wrapper template, and extracts the card description from the
//! markdown.
//!
//! - `Catalog` owns the cache and the optional wrapper file name.
//! - `LoadedShader` bundles an entry with its wrapped program and
//!   description.
//! - `wrap_shader` performs the marker substitution used for every entry.
use tracing::{info, warn};

use crate::assets::{AssetCache, CacheStats};
use crate::entry::{extract_description, ShaderEntry};
use crate::CatalogError;

/// Line in the wrapper template that receives the shader body.
pub const REPLACE_MARKER: &str = "//$REPLACE$";

#[derive(Debug, Clone)]
pub struct LoadedShader {
    pub entry: ShaderEntry,
    pub wrapped: String,
    pub description: String,
}

#[derive(Debug)]
pub struct Catalog {
    cache: AssetCache,
    wrapper: Option<String>,
}

impl Catalog {
    pub fn new(cache: AssetCache, wrapper: Option<String>) -> Self {
        Self { cache, wrapper }
    }

    /// Loads every entry in order. Entries whose files are missing are skipped
    /// with a warning; a missing wrapper template fails the whole load.
    pub fn load(&mut self, entries: &[ShaderEntry]) -> Result<Vec<LoadedShader>, CatalogError> {
        let wrapper = match self.wrapper.clone() {
            Some(name) => Some(self.cache.load(&name)?.to_string()),
            None => None,
        };

        let mut loaded = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.load_entry(entry, wrapper.as_deref()) {
                Ok(shader) => loaded.push(shader),
                Err(err) => {
                    warn!(shader = %entry.name, error = %err, "skipping shader");
                }
            }
        }
        info!(
            root = %self.cache.root().display(),
            requested = entries.len(),
            loaded = loaded.len(),
            "loaded shader catalog"
        );
        Ok(loaded)
    }

    fn load_entry(
        &mut self,
        entry: &ShaderEntry,
        wrapper: Option<&str>,
    ) -> Result<LoadedShader, CatalogError> {
        let source = self.cache.load(&entry.file)?.to_string();
        let wrapped = match wrapper {
            Some(template) => wrap_shader(&source, template)?,
            None => source,
        };
        let markdown = self.cache.load(&entry.markdown_file)?;
        Ok(LoadedShader {
            entry: entry.clone(),
            description: extract_description(markdown),
            wrapped,
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

pub fn wrap_shader(shader: &str, wrapper: &str) -> Result<String, CatalogError> {
    if shader.trim().is_empty() || wrapper.trim().is_empty() {
        return Err(CatalogError::EmptyContent);
    }
    if !wrapper.contains(REPLACE_MARKER) {
        warn!("shader replacement marker not found in wrapper");
        return Ok(wrapper.to_string());
    }
    Ok(wrapper.replacen(REPLACE_MARKER, shader, 1))
}
