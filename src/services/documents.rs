use bytes::Bytes;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{error, info, warn};

use super::{cases, insert_error, ServiceError, ServiceResult, CASE_NOT_FOUND, DOCUMENT_NOT_FOUND};
use crate::db::SqlitePool;
use crate::models::{Document, NewDocument};
use crate::schema::documents;
use crate::storage::{BlobMetadata, BlobStore, StoredBlob};

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub case_id: i32,
    pub name: String,
    pub doc_type: String,
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Stores the file in the blob store and only then records the document row.
/// A failed blob write leaves no row behind; a failed row insert may leave an
/// unreferenced blob.
///
/// No pooled connection is checked out while the blob write is in flight.
pub async fn upload(
    pool: &SqlitePool,
    blobs: &dyn BlobStore,
    request: UploadRequest,
    now: NaiveDateTime,
) -> ServiceResult<Document> {
    let case = {
        let mut conn = pool.get()?;
        cases::get(&mut conn, request.case_id)?
    };

    let metadata = BlobMetadata {
        case_id: case.id,
        name: request.name.clone(),
        doc_type: request.doc_type.clone(),
        filename: request.filename,
        content_type: request.content_type,
    };
    let size_bytes = request.bytes.len();

    let blob_key = blobs.put(request.bytes, metadata).await.map_err(|err| {
        error!(error = ?err, case_id = case.id, "blob write failed; document not recorded");
        ServiceError::Storage(err)
    })?;

    let new_document = NewDocument {
        case_id: case.id,
        name: request.name,
        doc_type: request.doc_type,
        blob_key,
        uploaded_at: now,
    };

    let mut conn = pool.get()?;
    let document: Document = diesel::insert_into(documents::table)
        .values(&new_document)
        .get_result(&mut conn)
        .map_err(|err| {
            warn!(
                blob_key = %new_document.blob_key,
                error = %err,
                "document row insert failed; blob left unreferenced"
            );
            insert_error(err, "El documento ya existe", CASE_NOT_FOUND)
        })?;

    info!(
        document_id = document.id,
        case_id = document.case_id,
        blob_key = %document.blob_key,
        size_bytes,
        "document stored"
    );
    Ok(document)
}

pub fn list_for_case(conn: &mut SqliteConnection, case_id: i32) -> ServiceResult<Vec<Document>> {
    let case = cases::get(conn, case_id)?;
    let rows = documents::table
        .filter(documents::case_id.eq(case.id))
        .order(documents::id.asc())
        .load(conn)?;
    Ok(rows)
}

pub fn get(conn: &mut SqliteConnection, document_id: i32) -> ServiceResult<Document> {
    documents::table
        .find(document_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found(DOCUMENT_NOT_FOUND))
}

/// Resolves a document row to its stored bytes. The connection is released
/// before the blob read.
pub async fn download(
    pool: &SqlitePool,
    blobs: &dyn BlobStore,
    document_id: i32,
) -> ServiceResult<(Document, StoredBlob)> {
    let document = {
        let mut conn = pool.get()?;
        get(&mut conn, document_id)?
    };
    let blob = blobs
        .get(&document.blob_key)
        .await
        .map_err(ServiceError::Storage)?;

    match blob {
        Some(blob) => Ok((document, blob)),
        None => {
            error!(
                document_id = document.id,
                blob_key = %document.blob_key,
                "document references a missing blob"
            );
            Err(ServiceError::not_found(DOCUMENT_NOT_FOUND))
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use async_trait::async_trait;

    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::{mpsc, Notify};

    use super::*;
    use crate::services::cases::CaseDraft;
    use crate::services::clients::{self, ClientDraft};
    use crate::services::test_support::{at, TestDb};
    use crate::storage::MemoryBlobStore;

    struct UnavailableStore;

    #[async_trait]
    impl BlobStore for UnavailableStore {
        async fn put(&self, _bytes: Bytes, _metadata: BlobMetadata) -> anyhow::Result<String> {
            Err(anyhow!("bucket unreachable"))
        }

        async fn get(&self, _key: &str) -> anyhow::Result<Option<StoredBlob>> {
            Ok(None)
        }
    }

    /// Parks every `put` until released, reporting each arrival.
    struct ParkedStore {
        arrived: mpsc::UnboundedSender<()>,
        release: Notify,
        inner: MemoryBlobStore,
    }

    #[async_trait]
    impl BlobStore for ParkedStore {
        async fn put(&self, bytes: Bytes, metadata: BlobMetadata) -> anyhow::Result<String> {
            let released = self.release.notified();
            let _ = self.arrived.send(());
            released.await;
            self.inner.put(bytes, metadata).await
        }

        async fn get(&self, key: &str) -> anyhow::Result<Option<StoredBlob>> {
            self.inner.get(key).await
        }
    }

    fn seed_case(conn: &mut SqliteConnection) -> i32 {
        let client = clients::create(
            conn,
            ClientDraft {
                name: "Rosa Gil".to_string(),
                email: "rosa@example.com".to_string(),
                phone: None,
            },
            at(1, 8, 0, 0),
        )
        .unwrap();
        cases::create(
            conn,
            CaseDraft {
                reference: Some("EXP-7".to_string()),
                client_id: client.id,
                description: "Divorcio".to_string(),
                status: "abierto".to_string(),
                assigned_lawyer: "Lic. Mendoza".to_string(),
            },
            at(1, 8, 30, 0),
        )
        .unwrap()
        .id
    }

    fn request(case_id: i32) -> UploadRequest {
        UploadRequest {
            case_id,
            name: "Acta de matrimonio".to_string(),
            doc_type: "acta".to_string(),
            bytes: Bytes::from_static(b"scan"),
            filename: Some("acta.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
        }
    }

    #[tokio::test]
    async fn upload_writes_blob_then_row() {
        let db = TestDb::new();
        let mut conn = db.conn();
        let case_id = seed_case(&mut conn);
        let store = MemoryBlobStore::new();

        let document = upload(&db.pool, &store, request(case_id), at(5, 12, 0, 0))
            .await
            .unwrap();

        let stored = store.get(&document.blob_key).await.unwrap().expect("blob");
        assert_eq!(stored.bytes.as_ref(), b"scan");
        assert_eq!(stored.metadata.case_id, case_id);
        assert_eq!(stored.metadata.filename.as_deref(), Some("acta.pdf"));

        let listed = list_for_case(&mut conn, case_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, document.id);
    }

    #[tokio::test]
    async fn unknown_case_stores_nothing() {
        let db = TestDb::new();
        let store = MemoryBlobStore::new();

        let err = upload(&db.pool, &store, request(404), at(5, 12, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn failed_blob_write_records_no_row() {
        let db = TestDb::new();
        let mut conn = db.conn();
        let case_id = seed_case(&mut conn);

        let err = upload(&db.pool, &UnavailableStore, request(case_id), at(5, 12, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert!(list_for_case(&mut conn, case_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_of_row_with_missing_blob_is_not_found() {
        let db = TestDb::new();
        let mut conn = db.conn();
        let case_id = seed_case(&mut conn);
        let store = MemoryBlobStore::new();
        let document = upload(&db.pool, &store, request(case_id), at(5, 12, 0, 0))
            .await
            .unwrap();

        let err = download(&db.pool, &MemoryBlobStore::new(), document.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let (_, blob) = download(&db.pool, &store, document.id).await.unwrap();
        assert_eq!(blob.metadata.name, "Acta de matrimonio");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pending_blob_writes_leave_the_pool_available() {
        let db = TestDb::new();
        let case_id = seed_case(&mut db.conn());

        let (arrived, mut arrivals) = mpsc::unbounded_channel();
        let store = Arc::new(ParkedStore {
            arrived,
            release: Notify::new(),
            inner: MemoryBlobStore::new(),
        });

        // As many in-flight uploads as the pool has connections.
        let mut uploads = Vec::new();
        for _ in 0..2 {
            let pool = db.pool.clone();
            let store = store.clone();
            uploads.push(tokio::spawn(async move {
                upload(&pool, store.as_ref(), request(case_id), at(5, 12, 0, 0)).await
            }));
        }
        for _ in 0..2 {
            arrivals.recv().await.expect("upload reached the blob store");
        }

        let conn = db.pool.get_timeout(Duration::from_millis(500));
        assert!(conn.is_ok(), "pool exhausted while blob writes were pending");
        drop(conn);

        store.release.notify_waiters();
        for handle in uploads {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(list_for_case(&mut db.conn(), case_id).unwrap().len(), 2);
        assert_eq!(store.inner.len().await, 2);
    }

    #[test]
    fn listing_for_unknown_case_is_not_found() {
        let db = TestDb::new();
        let mut conn = db.conn();
        assert!(matches!(
            list_for_case(&mut conn, 3),
            Err(ServiceError::NotFound(ref msg)) if msg == CASE_NOT_FOUND
        ));
    }
}
