//! Upload ingress, download and listing of stored files.

use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use mediashrink_core::{is_storage_name, StorageError, StorageNamer, UploadDescriptor};

use super::handlers::{api_error, ApiError};
use crate::metrics::{UPLOADS_TOTAL, UPLOAD_BYTES_TOTAL};
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub status: String,
}

fn storage_error(err: StorageError) -> ApiError {
    let (status, result) = match &err {
        StorageError::UnsupportedMimeType(_) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_type")
        }
        StorageError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "too_large"),
    };
    UPLOADS_TOTAL.with_label_values(&[result]).inc();
    api_error(status, err.to_string())
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    let status = err.status();
    let result = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "too_large"
    } else {
        "invalid"
    };
    UPLOADS_TOTAL.with_label_values(&[result]).inc();
    api_error(status, err.body_text())
}

/// Accept one file, store it under its storage name and submit a job for it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    info!("Started file upload");

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mime_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        let original_name = field.file_name().unwrap_or_default().to_string();
        let filename = state
            .namer()
            .storage_name_now(&original_name, &mime_type)
            .map_err(storage_error)?;
        let path = state.upload_dir().join(&filename);

        let size = store_field(&mut field, &path, state.namer()).await?;

        let descriptor = UploadDescriptor {
            path,
            filename: filename.clone(),
            size,
            mime_type,
            submitted_at: Utc::now(),
        };
        state.coordinator().submit(descriptor);

        UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        UPLOAD_BYTES_TOTAL.inc_by(size);
        info!(
            filename = %filename,
            size,
            seconds = started.elapsed().as_secs_f64(),
            "File uploaded"
        );

        let location = format!("download/{}", filename);
        let body = UploadResponse {
            filename,
            status: "uploaded".to_string(),
        };
        return Ok((
            StatusCode::CREATED,
            [(header::LOCATION, location)],
            Json(body),
        )
            .into_response());
    }

    warn!("Bad request on file upload: no file field");
    UPLOADS_TOTAL.with_label_values(&["invalid"]).inc();
    Err(api_error(StatusCode::BAD_REQUEST, "No file uploaded"))
}

/// Streams a multipart field to a hidden staging file beside `path`, then
/// renames it into place, so `list` and `download` never see a partial upload.
///
/// On any error the staging file is removed.
async fn store_field(
    field: &mut Field<'_>,
    path: &Path,
    namer: &StorageNamer,
) -> Result<u64, ApiError> {
    let staging = staging_path(path);
    let mut result = write_field(field, &staging, namer).await;
    if let Ok(size) = result {
        result = fs::rename(&staging, path)
            .await
            .map(|()| size)
            .map_err(|e| store_error(path, e));
    }
    if result.is_err() {
        if let Err(e) = fs::remove_file(&staging).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove partial upload {}: {}", staging.display(), e);
            }
        }
    }
    result
}

async fn write_field(
    field: &mut Field<'_>,
    path: &Path,
    namer: &StorageNamer,
) -> Result<u64, ApiError> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| store_error(path, e))?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        written += chunk.len() as u64;
        namer.check_size(written).map_err(storage_error)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| store_error(path, e))?;
    }

    file.flush().await.map_err(|e| store_error(path, e))?;
    Ok(written)
}

/// `.<name>.partial` in the same directory.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

fn store_error(path: &Path, e: io::Error) -> ApiError {
    error!("Failed to store upload {}: {}", path.display(), e);
    UPLOADS_TOTAL.with_label_values(&["error"]).inc();
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file")
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub filename: String,
}

/// Stream a stored file back as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let filename = query.filename;
    if !is_storage_name(&filename) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid filename"));
    }

    let path = state.upload_dir().join(&filename);
    let file = match fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(api_error(StatusCode::NOT_FOUND, "File not found"));
        }
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file",
            ));
        }
    };
    let size = file.metadata().await.map(|m| m.len()).ok();

    let content_type = filename
        .rsplit_once('.')
        .and_then(|(_, ext)| state.namer().mime_for_extension(ext))
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );
    if let Some(size) = size {
        response = response.header(header::CONTENT_LENGTH, size);
    }

    response
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            error!("Failed to build download response: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file")
        })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredFile {
    pub location: String,
    pub size: u64,
}

/// List stored files. Hidden staging files are skipped.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StoredFile>>, ApiError> {
    let read_error = |e: io::Error| {
        error!("Failed to list uploads: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list files")
    };

    let mut entries = fs::read_dir(state.upload_dir()).await.map_err(read_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        files.push(StoredFile {
            location: name,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.location.cmp(&b.location));
    Ok(Json(files))
}
