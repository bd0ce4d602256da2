mod assets;
mod entry;
mod repository;

pub use assets::{AssetCache, CacheStats};
pub use entry::{extract_description, shader_title, ShaderEntry, DEFAULT_DESCRIPTION};
pub use repository::{wrap_shader, Catalog, LoadedShader, REPLACE_MARKER};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset name '{0}' must be a plain file name")]
    InvalidName(String),
    #[error("invalid shader or wrapper content")]
    EmptyContent,
}
