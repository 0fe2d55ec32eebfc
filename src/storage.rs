use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use tokio::sync::Mutex;
use uuid::Uuid;

const META_CASE_ID: &str = "case-id";
const META_NAME: &str = "name";
const META_DOC_TYPE: &str = "doc-type";
const META_FILENAME: &str = "filename";

/// Descriptive bundle stored alongside every uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub case_id: i32,
    pub name: String,
    pub doc_type: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub metadata: BlobMetadata,
}

/// Content storage for uploaded documents. `put` returns the generated key
/// only once the bytes are durably stored.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    async fn put(&self, bytes: Bytes, metadata: BlobMetadata) -> Result<String>;

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>>;
}

fn generate_key() -> String {
    Uuid::new_v4().to_string()
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Bytes, metadata: BlobMetadata) -> Result<String> {
        let key = generate_key();
        let mut guard = self.blobs.lock().await;
        guard.insert(key.clone(), StoredBlob { bytes, metadata });
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>> {
        let guard = self.blobs.lock().await;
        Ok(guard.get(key).cloned())
    }
}

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bytes: Bytes, metadata: BlobMetadata) -> Result<String> {
        let key = generate_key();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes));

        for (name, value) in encode_metadata(&metadata) {
            request = request.metadata(name, value);
        }

        if let Some(content_type) = metadata.content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .context("failed to upload object to S3")?;

        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(service_error).context("failed to download object from S3");
            }
        };

        let content_type = response.content_type().map(|value| value.to_string());
        let metadata = decode_metadata(response.metadata(), content_type)
            .with_context(|| format!("object {key} carries malformed metadata"))?;

        let bytes = response
            .body
            .collect()
            .await
            .context("failed to read object stream")?
            .into_bytes();

        Ok(Some(StoredBlob { bytes, metadata }))
    }
}

fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn decode_value(value: &str) -> Result<String> {
    Ok(percent_decode_str(value)
        .decode_utf8()
        .context("metadata value is not valid UTF-8")?
        .into_owned())
}

// S3 user metadata travels as HTTP headers, so every value is kept ASCII.
fn encode_metadata(metadata: &BlobMetadata) -> Vec<(&'static str, String)> {
    let mut entries = vec![
        (META_CASE_ID, metadata.case_id.to_string()),
        (META_NAME, encode_value(&metadata.name)),
        (META_DOC_TYPE, encode_value(&metadata.doc_type)),
    ];
    if let Some(filename) = &metadata.filename {
        entries.push((META_FILENAME, encode_value(filename)));
    }
    entries
}

fn decode_metadata(
    raw: Option<&HashMap<String, String>>,
    content_type: Option<String>,
) -> Result<BlobMetadata> {
    let empty = HashMap::new();
    let raw = raw.unwrap_or(&empty);
    let field = |name: &str| -> Result<String> {
        let value = raw
            .get(name)
            .with_context(|| format!("missing `{name}` metadata"))?;
        decode_value(value)
    };

    let case_id = field(META_CASE_ID)?
        .parse()
        .context("case id metadata is not an integer")?;
    let filename = match raw.get(META_FILENAME) {
        Some(value) => Some(decode_value(value)?),
        None => None,
    };

    Ok(BlobMetadata {
        case_id,
        name: field(META_NAME)?,
        doc_type: field(META_DOC_TYPE)?,
        filename,
        content_type,
    })
}
