//! Multipart form reading and file download responses shared by reports,
//! chat and avatars.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Multipart;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use taskflow_core::blob::{BlobStore, StoredBlob};
use taskflow_db::models::attachment::Attachment;

use crate::error::{AppError, AppResult};

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Text fields and at most one file from a multipart body.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    /// Trimmed text field, empty when absent.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).to_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        )
    }
}

/// Drain `multipart`, rejecting a file longer than `max_file_bytes`.
/// Empty file parts are treated as no file.
pub async fn read_form(mut multipart: Multipart, max_file_bytes: usize) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == FILE_FIELD {
            let file_name = field.file_name().unwrap_or("file").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if data.len() > max_file_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "File exceeds the {max_file_bytes} byte limit"
                )));
            }
            if !data.is_empty() {
                form.file = Some(UploadedFile {
                    name: file_name,
                    bytes: data.to_vec(),
                });
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Save an uploaded file under `category` and describe it for the store.
pub async fn store_file(
    blobs: &dyn BlobStore,
    category: &str,
    file: &UploadedFile,
) -> AppResult<Attachment> {
    let StoredBlob { path, size } = blobs.save(category, &file.name, &file.bytes).await?;
    Ok(Attachment {
        name: file.name.clone(),
        path,
        size,
    })
}

/// Best-effort removal of a blob whose row never got written.
pub async fn discard_file(blobs: &dyn BlobStore, attachment: &Attachment) {
    if let Err(e) = blobs.remove(&attachment.path).await {
        tracing::warn!(path = %attachment.path, error = %e, "Failed to remove orphaned file");
    }
}

/// Serve `bytes` as a download named `file_name`.
pub fn attachment_response(file_name: &str, bytes: Vec<u8>) -> AppResult<Response> {
    file_response(bytes, content_type_for(file_name), Some(file_name))
}

/// Serve `bytes` inline with a content type guessed from `path`.
pub fn inline_response(path: &str, bytes: Vec<u8>) -> AppResult<Response> {
    file_response(bytes, content_type_for(path), None)
}

fn file_response(
    bytes: Vec<u8>,
    content_type: &'static str,
    download_name: Option<&str>,
) -> AppResult<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len().to_string());
    if let Some(name) = download_name {
        let disposition = HeaderValue::from_str(&content_disposition(name))
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        builder = builder.header(header::CONTENT_DISPOSITION, disposition);
    }
    builder
        .body(Body::from(bytes))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// `attachment` disposition with an ASCII fallback name and the RFC 5987
/// UTF-8 form for names such as Cyrillic ones.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain; charset=utf-8",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}
