use std::path::Path as FsPath;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::products::owned_product;
use crate::state::{AppState, db_call};

/// 10 MB upload limit for images
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Lower-cased extension of an uploaded file name, if it is on the allow-list.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Pull the `file` part out of a multipart body.
async fn read_image(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let ext = field
            .file_name()
            .and_then(allowed_extension)
            .ok_or(ApiError::BadRequest("File extension not allowed"))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::PayloadTooLarge("File too large"))?;
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ApiError::PayloadTooLarge("File too large"));
        }
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Empty file"));
        }

        return Ok((ext, bytes));
    }

    Err(ApiError::BadRequest("Missing file field"))
}

/// Write the image under a random name and return the stored path.
async fn store_image(dir: &FsPath, prefix: &str, ext: &str, bytes: &[u8]) -> Result<String, ApiError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", dir.display(), e);
        ApiError::Internal(e.into())
    })?;

    let name = format!("{}{}.{}", prefix, hex::encode(rand::random::<[u8; 10]>()), ext);
    let path = dir.join(&name);

    let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
        error!("Failed to create file {}: {}", path.display(), e);
        ApiError::Internal(e.into())
    })?;
    file.write_all(bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", path.display(), e);
        ApiError::Internal(e.into())
    })?;
    file.flush().await.map_err(|e| ApiError::Internal(e.into()))?;

    let stored = path.to_string_lossy();
    Ok(stored.strip_prefix("./").unwrap_or(&*stored).to_string())
}

/// POST /uploadfile/profile — replace the caller's storefront logo.
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = user.id;
    let business = db_call(&state, move |db| db.get_business_by_owner(owner_id))
        .await?
        .ok_or(ApiError::NotFound("Business Not Found"))?;

    let (ext, bytes) = read_image(multipart).await?;
    let logo = store_image(&state.upload_dir, "logo", &ext, &bytes).await?;

    let business_id = business.id;
    let stored = logo.clone();
    let updated = db_call(&state, move |db| db.set_business_logo(business_id, &stored))
        .await?
        .ok_or(ApiError::NotFound("Business Not Found"))?;

    info!("Business {} logo set to {}", business_id, logo);
    Ok(Json(updated))
}

/// POST /uploadfile/product/{id} — set a product image; owner only.
pub async fn upload_product_image(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    owned_product(&state, id, user.id).await?;

    let (ext, bytes) = read_image(multipart).await?;
    let image = store_image(&state.upload_dir, "product", &ext, &bytes).await?;

    let stored = image.clone();
    let updated = db_call(&state, move |db| db.set_product_image(id, &stored))
        .await?
        .ok_or(ApiError::NotFound("Product Not Found"))?;

    info!("Product {} image set to {}", id, image);
    Ok(Json(updated))
}
