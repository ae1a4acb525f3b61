//! Recipe images.
//!
//! Images arrive as base64 data URLs and are written below the media root as
//! `recipes/images/<uuid>.<ext>`. The stored path is relative to the root.

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const IMAGE_DIR: &str = "recipes/images";

/// A decoded image ready to be written.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DecodedImage {
    pub(crate) extension: &'static str,
    pub(crate) bytes: Vec<u8>,
}

fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Parse `data:<mime>;base64,<payload>`.
pub(crate) fn decode_data_url(value: &str) -> ResultEngine<DecodedImage> {
    let invalid = |message: &str| EngineError::validation("image", message);

    let rest = value
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| invalid("image must be a base64 data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("image must be a base64 data URL"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("image must be base64 encoded"))?;
    let extension = extension_for(&mime.to_ascii_lowercase())
        .ok_or_else(|| invalid("unsupported image type"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| invalid("image payload is not valid base64"))?;
    if bytes.is_empty() {
        return Err(invalid("image must not be empty"));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Write `image` below `media_root`, returning the relative path.
pub(crate) async fn store(media_root: &Path, image: &DecodedImage) -> ResultEngine<String> {
    let dir = media_root.join(IMAGE_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
    tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

    Ok(format!("{IMAGE_DIR}/{file_name}"))
}

/// Best-effort removal; a missing file is not an error.
pub(crate) async fn discard(media_root: &Path, relative: &str) {
    let path: PathBuf = media_root.join(relative);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("failed to remove image {}: {err}", path.display()),
    }
}
