use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use image::ImageFormat;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Every recipe image lives under this prefix.
pub const UPLOAD_DIR: &str = "uploads/recipe";

pub const NO_FILE: &str = "No file was submitted.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// One file pulled out of a multipart body.
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub body: Bytes,
}

/// Decodes the payload fully and reports its format. Runs on the blocking pool.
pub async fn inspect_image(body: Bytes) -> anyhow::Result<Option<ImageFormat>> {
    tokio::task::spawn_blocking(move || {
        let format = match image::guess_format(&body) {
            Ok(f) => f,
            Err(e) => {
                debug!(error = %e, "unrecognised image format");
                return None;
            }
        };
        match image::load_from_memory_with_format(&body, format) {
            Ok(_) => Some(format),
            Err(e) => {
                debug!(error = %e, ?format, "image failed to decode");
                None
            }
        }
    })
    .await
    .context("image decode task")
}

/// The uploaded name's extension when it has a usable one, else the
/// detected format's.
fn pick_extension(file_name: Option<&str>, format: ImageFormat) -> String {
    let original = file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    match original {
        Some(ext) => ext.to_string(),
        None => format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("bin")
            .to_string(),
    }
}

/// `uploads/recipe/<uuid>.<ext>`, fresh on every call.
pub fn recipe_image_key(file_name: Option<&str>, format: ImageFormat) -> String {
    format!("{UPLOAD_DIR}/{}.{}", Uuid::new_v4(), pick_extension(file_name, format))
}

pub async fn store_recipe_image(
    st: &AppState,
    upload: ImageUpload,
    format: ImageFormat,
) -> anyhow::Result<String> {
    let key = recipe_image_key(upload.file_name.as_deref(), format);
    st.storage
        .put_object(&key, upload.body, format.to_mime_type())
        .await
        .with_context(|| format!("put_object {key}"))?;
    Ok(key)
}

/// Best effort; a leftover object is logged, not surfaced.
pub async fn discard_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, key, "failed to delete stored image");
    }
}

#[cfg(test)]
pub(crate) fn png_bytes() -> Bytes {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    Bytes::from(buf.into_inner())
}
