#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use casefile::config::{AppConfig, StorageBackend, DEFAULT_MAX_UPLOAD_BYTES};
use casefile::db;
use casefile::routes;
use casefile::state::AppState;
use casefile::storage::{BlobMetadata, BlobStore, MemoryBlobStore, StoredBlob};
use diesel::sqlite::SqliteConnection;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

/// Blob store whose writes always fail, as an unreachable bucket would.
#[derive(Default)]
pub struct UnavailableStore;

#[async_trait]
impl BlobStore for UnavailableStore {
    async fn put(&self, _bytes: Bytes, _metadata: BlobMetadata) -> Result<String> {
        bail!("object store unavailable")
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredBlob>> {
        bail!("object store unavailable")
    }
}

pub struct UploadForm {
    pub case_id: Option<String>,
    pub name: Option<String>,
    pub doc_type: Option<String>,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadForm {
    pub fn new(case_id: i64, name: &str, data: &[u8]) -> Self {
        Self {
            case_id: Some(case_id.to_string()),
            name: Some(name.to_string()),
            doc_type: Some("contrato".to_string()),
            filename: "contract.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: data.to_vec(),
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    blobs: Arc<MemoryBlobStore>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let blobs = Arc::new(MemoryBlobStore::new());
        let blobs_for_state: Arc<dyn BlobStore> = blobs.clone();
        Self::build(blobs, blobs_for_state).await
    }

    pub async fn with_unavailable_storage() -> Result<Self> {
        let blobs_for_state: Arc<dyn BlobStore> = Arc::new(UnavailableStore);
        Self::build(Arc::new(MemoryBlobStore::new()), blobs_for_state).await
    }

    async fn build(blobs: Arc<MemoryBlobStore>, blobs_for_state: Arc<dyn BlobStore>) -> Result<Self> {
        let dir = TempDir::new().context("failed to create temp dir")?;
        let database_url = dir
            .path()
            .join("records.db")
            .to_str()
            .ok_or_else(|| anyhow!("temp path is not UTF-8"))?
            .to_string();

        let config = AppConfig {
            database_url,
            database_max_pool_size: 2,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_allowed_origin: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            storage_backend: StorageBackend::Memory,
            aws_endpoint_url: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_region: "us-east-1".to_string(),
            s3_bucket: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        let migration_pool = pool.clone();
        tokio::task::spawn_blocking(move || db::run_migrations(&migration_pool))
            .await
            .context("migration task panicked")??;

        let state = AppState::new(pool, config, blobs_for_state);
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            blobs,
            _dir: dir,
        })
    }

    pub fn blobs(&self) -> Arc<MemoryBlobStore> {
        self.blobs.clone()
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }

    async fn send(&self, request: Request<Body>) -> hyper::Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response")
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        Ok(self.send(request).await)
    }

    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())?;
        Ok(self.send(request).await)
    }

    pub async fn upload_document(
        &self,
        path: &str,
        form: &UploadForm,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        let text_fields = [
            ("caso_id", form.case_id.as_deref()),
            ("nombre", form.name.as_deref()),
            ("tipo", form.doc_type.as_deref()),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                body.extend(format!("--{boundary}\r\n").as_bytes());
                body.extend(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend(value.as_bytes());
                body.extend(b"\r\n");
            }
        }

        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                form.filename
            )
            .as_bytes(),
        );
        if let Some(content_type) = &form.content_type {
            body.extend(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend(b"\r\n");
        body.extend(&form.data);
        body.extend(b"\r\n");
        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))?;
        Ok(self.send(request).await)
    }

    pub async fn create_client(&self, name: &str, email: &str) -> Result<Value> {
        let response = self
            .post_json(
                "/api/clientes/",
                &serde_json::json!({ "nombre": name, "email": email, "telefono": null }),
            )
            .await?;
        expect_json(response, StatusCode::OK).await
    }

    pub async fn create_case(&self, client_id: i64, lawyer: &str, description: &str) -> Result<Value> {
        let response = self
            .post_json(
                "/api/casos/",
                &serde_json::json!({
                    "cliente_id": client_id,
                    "descripcion": description,
                    "estado": "abierto",
                    "abogado_asignado": lawyer,
                }),
            )
            .await?;
        expect_json(response, StatusCode::OK).await
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn expect_json<T: DeserializeOwned>(
    response: hyper::Response<Body>,
    expected: StatusCode,
) -> Result<T> {
    let status = response.status();
    let body = body_to_vec(response.into_body()).await?;
    if status != expected {
        bail!(
            "expected {expected}, got {status}: {}",
            String::from_utf8_lossy(&body)
        );
    }
    Ok(serde_json::from_slice(&body)?)
}

pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("numeric id")
}
