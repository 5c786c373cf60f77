// Image upload handler
//
// The one route that looks inside the request before forwarding: size
// and MIME checks run here so a rejected upload never leaves the box.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use super::{relay_json, upstream_failure};
use crate::error::{AppError, AppResult};
use crate::proxy::server::AppState;

/// Hard cap for a single image.
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Image formats LINE clients can render inside a Flex bubble.
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

const UPLOAD_FAILED: &str = "Upload failed";

pub(crate) fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type)
}

/// POST /api/upload/image
pub async fn image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let auth = state.upstream_auth()?;
    let mut multipart = multipart.map_err(|e| {
        warn!("rejecting upload, not a multipart request: {}", e);
        AppError::InvalidMultipart
    })?;

    // Rebuild the form part by part; the file part is validated in flight
    // and everything else forwards untouched.
    let mut form = Form::new();
    let mut file_validated = false;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            // Plain form value.
            let text = field.text().await.map_err(malformed)?;
            form = form.text(name, text);
            continue;
        };

        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(malformed)?;

        if name == "file" && !file_validated {
            if data.len() > MAX_FILE_SIZE {
                debug!("rejecting upload of {} bytes", data.len());
                return Err(AppError::FileTooLarge);
            }
            if !is_allowed_type(content_type.as_deref().unwrap_or_default()) {
                debug!("rejecting upload with type {:?}", content_type);
                return Err(AppError::InvalidFileType);
            }
            file_validated = true;
        }

        let mut part = Part::bytes(data.to_vec()).file_name(file_name);
        if let Some(mime) = &content_type {
            part = part.mime_str(mime).map_err(|e| {
                warn!("unusable content type on multipart field: {}", e);
                AppError::InvalidMultipart
            })?;
        }
        form = form.part(name, part);
    }

    if !file_validated {
        return Err(AppError::NoFileProvided);
    }

    let response = state
        .upstream
        .send_multipart(auth, "/api/upload/image", form)
        .await
        .map_err(upstream_failure)?;
    relay_json(response, StatusCode::OK, UPLOAD_FAILED)
}

async fn next_field(
    multipart: &mut Multipart,
) -> AppResult<Option<axum::extract::multipart::Field<'_>>> {
    multipart.next_field().await.map_err(malformed)
}

fn malformed<E: std::fmt::Display>(err: E) -> AppError {
    warn!("malformed multipart body: {}", err);
    AppError::InvalidMultipart
}
