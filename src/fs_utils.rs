use std::path::{Path, PathBuf};

use llmapi::utils::detect_mime_type;
use tokio::fs;
use tokio::fs::try_exists;

use crate::constants::{DEFAULT_IMAGE_MIME, PRODUCT_SLUG};

pub async fn ensure_dir(path: &Path) -> std::io::Result<PathBuf> {
    if !try_exists(path).await? {
        fs::create_dir_all(path).await?;
    }
    Ok(path.to_path_buf())
}

pub async fn ensure_unique_file_name(dir: &Path, original: &str) -> std::io::Result<String> {
    if !try_exists(dir.join(original)).await? {
        return Ok(original.to_string());
    }

    let original_path = Path::new(original);
    let stem = original_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    let extension = original_path.extension().and_then(|ext| ext.to_str());

    let mut counter = 1;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{stem}-{counter}.{ext}"),
            None => format!("{stem}-{counter}"),
        };

        if !try_exists(dir.join(&candidate)).await? {
            return Ok(candidate);
        }

        counter += 1;
    }
}

pub fn resolve_mime_type(candidate: Option<String>, path: &Path) -> String {
    if let Some(value) = candidate {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    detect_mime_type(path, DEFAULT_IMAGE_MIME)
}

/// `nano-banana-gen-<epoch-millis>.png`
pub fn download_filename(epoch_millis: u64) -> String {
    format!("{PRODUCT_SLUG}-gen-{epoch_millis}.png")
}
