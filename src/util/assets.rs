use std::{
    borrow::Cow,
    fs, io,
    path::{Path, PathBuf},
};

use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("embedded asset {0} not found")]
    Missing(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Deserializes a JSON document compiled in from `assets/`.
pub fn load_json<T: DeserializeOwned>(path: &str) -> Result<T, AssetError> {
    let data = load_asset(path)?;
    serde_json::from_slice(&data).map_err(|source| AssetError::Parse {
        name: path.to_string(),
        source,
    })
}

/// Same as [`load_json`] but reads an override file from disk.
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, AssetError> {
    let data = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| AssetError::Parse {
        name: path.display().to_string(),
        source,
    })
}

fn load_asset(path: &str) -> Result<Cow<'static, [u8]>, AssetError> {
    let canonical = canonical_asset_path(path);
    EmbeddedAssets::get(&canonical)
        .map(|file| file.data)
        .ok_or(AssetError::Missing(canonical))
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
