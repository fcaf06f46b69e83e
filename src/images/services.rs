use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::storage::StorageClient;

/// Header-level facts about an uploaded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoInfo {
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("unsupported image format: {0:?}")]
    Unsupported(ImageFormat),
    #[error("image header could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Reads only the header: enough to know the bytes are a PNG/JPEG/WebP photo
/// with real dimensions, without decoding pixels.
pub fn inspect_photo(bytes: &[u8]) -> Result<PhotoInfo, PhotoError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PhotoError::Decode(image::ImageError::IoError(e)))?;
    let format = reader.format().ok_or(PhotoError::UnknownFormat)?;
    let content_type = mime_from_format(format).ok_or(PhotoError::Unsupported(format))?;
    let (width, height) = reader.into_dimensions()?;
    Ok(PhotoInfo {
        content_type,
        width,
        height,
    })
}

fn mime_from_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Hex SHA-256 of the photo bytes. Identifies a photo independent of the
/// request it arrived in.
pub fn photo_digest(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    format!("{hash:x}")
}

/// The same photo from the same user always maps to the same key.
pub fn meal_photo_key(user_id: Uuid, photo_digest: &str, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("meals/{}/{}.{}", user_id, photo_digest, ext)
}

pub async fn upload_meal_photo(
    storage: &dyn StorageClient,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<()> {
    storage
        .put_object(key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))
}

pub async fn presign_many(
    storage: &dyn StorageClient,
    keys: &[String],
    expires_seconds: u64,
) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::with_capacity(keys.len());
    for k in keys {
        out.push(
            storage
                .presign_get(k, expires_seconds)
                .await
                .with_context(|| format!("presign url for {}", k))?,
        );
    }
    Ok(out)
}
