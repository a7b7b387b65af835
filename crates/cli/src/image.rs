//! Loading image files as `data:` URIs for attachment.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Errors from reading an image for attachment.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unsupported image type: {0} (use png, jpg, webp, gif or heic)")]
    Unsupported(String),

    #[error("Failed to read image at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image file is empty: {0}")]
    Empty(PathBuf),
}

/// Mime type for a supported image file, from its extension.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Read `path` and encode it as a `data:` URI.
pub fn load_image(path: &Path) -> Result<String, ImageError> {
    let mime_type = mime_for(path).ok_or_else(|| {
        ImageError::Unsupported(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("no extension")
                .to_string(),
        )
    })?;

    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(ImageError::Empty(path.to_path_buf()));
    }

    tracing::debug!(path = %path.display(), mime_type, bytes = bytes.len(), "Loaded image");
    Ok(encode_data_uri(mime_type, &bytes))
}
