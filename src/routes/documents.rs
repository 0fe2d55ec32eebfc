use axum::body::Body;
use axum::extract::{Json, Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use bytes::Bytes;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::models::Document;
use crate::services::documents::{self, UploadRequest};
use crate::state::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

fn inline_content_disposition(filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }

    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            _ if ch.is_control() => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    let ascii_fallback: String = sanitized
        .chars()
        .map(|ch| if ch.is_ascii() { ch } else { '_' })
        .collect();
    Some(format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback, encoded
    ))
}

fn guess_content_type(filename: Option<&str>) -> String {
    filename
        .map(|name| mime_guess::from_path(name).first_or_octet_stream().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Descriptive fields may also arrive as query parameters; multipart text
/// fields take precedence.
#[derive(Deserialize, Default)]
pub struct UploadQuery {
    pub caso_id: Option<String>,
    pub nombre: Option<String>,
    pub tipo: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: i32,
    #[serde(rename = "caso_id")]
    pub case_id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub doc_type: String,
    #[serde(rename = "s3_key")]
    pub blob_key: String,
    #[serde(rename = "fecha_subida")]
    pub uploaded_at: NaiveDateTime,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            case_id: document.case_id,
            name: document.name,
            doc_type: document.doc_type,
            blob_key: document.blob_key,
            uploaded_at: document.uploaded_at,
        }
    }
}

#[derive(Serialize)]
pub struct UploadedDocumentResponse {
    pub id: i32,
    #[serde(rename = "caso_id")]
    pub case_id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub doc_type: String,
    #[serde(rename = "fecha_subida")]
    pub uploaded_at: NaiveDateTime,
}

impl From<Document> for UploadedDocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            case_id: document.case_id,
            name: document.name,
            doc_type: document.doc_type,
            uploaded_at: document.uploaded_at,
        }
    }
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    label: &str,
) -> AppResult<String> {
    field.text().await.map_err(|err| {
        error!(error = %err, field = label, "invalid multipart text field");
        AppError::bad_request(format!("invalid {label}: {err}"))
    })
}

fn required(value: Option<String>, label: &str) -> AppResult<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            error!(field = label, "upload rejected: missing field");
            AppError::bad_request(format!("{label} is required"))
        })
}

pub async fn upload_document(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadedDocumentResponse>> {
    let mut file_bytes: Option<Bytes> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut case_id = query.caso_id;
    let mut name = query.nombre;
    let mut doc_type = query.tipo;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        let msg = format!("invalid multipart data: {err}");
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(msg)
    })? {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(|n| n.to_string());
                content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|err| {
                    let msg = format!("failed to read file bytes: {err}");
                    error!(error = %err, "failed to read file bytes");
                    AppError::bad_request(msg)
                })?;
                file_bytes = Some(data);
            }
            Some("caso_id") => case_id = Some(read_text_field(field, "caso_id").await?),
            Some("nombre") => name = Some(read_text_field(field, "nombre").await?),
            Some("tipo") => doc_type = Some(read_text_field(field, "tipo").await?),
            _ => {}
        }
    }

    let case_id: i32 = required(case_id, "caso_id")?
        .parse()
        .map_err(|_| AppError::bad_request("caso_id must be an integer"))?;
    let name = required(name, "nombre")?;
    let doc_type = required(doc_type, "tipo")?;
    let file_bytes = file_bytes.ok_or_else(|| {
        error!("upload rejected: missing file field");
        AppError::bad_request("file field is required")
    })?;
    if file_bytes.is_empty() {
        error!("upload rejected: empty file payload");
        return Err(AppError::bad_request("file field must not be empty"));
    }

    let content_type = content_type.or_else(|| Some(guess_content_type(filename.as_deref())));
    let request = UploadRequest {
        case_id,
        name,
        doc_type,
        bytes: file_bytes,
        filename,
        content_type,
    };

    let document = documents::upload(
        &state.pool,
        state.blobs.as_ref(),
        request,
        Utc::now().naive_utc(),
    )
    .await?;

    info!(document_id = document.id, case_id, "document upload succeeded");
    Ok(Json(document.into()))
}

pub async fn list_case_documents(
    State(state): State<AppState>,
    Path(case_id): Path<i32>,
) -> AppResult<Json<Vec<DocumentResponse>>> {
    let mut conn = state.db()?;
    let rows = documents::list_for_case(&mut conn, case_id)?;
    Ok(Json(rows.into_iter().map(DocumentResponse::from).collect()))
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(document_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let (_, blob) = documents::download(&state.pool, state.blobs.as_ref(), document_id).await?;

    let content_type = blob
        .metadata
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(blob.metadata.filename.as_deref()));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE)),
    );
    if let Some(disposition) = blob
        .metadata
        .filename
        .as_deref()
        .and_then(inline_content_disposition)
    {
        let value = HeaderValue::from_str(&disposition).map_err(AppError::internal)?;
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Body::from(blob.bytes)))
}
