//! Record lifecycle rules for clients, cases, payments and documents, plus the
//! read-only reports built on top of them.
//!
//! Services are transport-free: each operation receives the connection it runs
//! on (and the blob store where relevant) from the caller, which owns the
//! scoped acquisition.

use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

pub mod cases;
pub mod clients;
pub mod documents;
pub mod payments;
pub mod reports;

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 1000;

pub const CLIENT_NOT_FOUND: &str = "Cliente no encontrado";
pub const CASE_NOT_FOUND: &str = "Caso no encontrado";
pub const DOCUMENT_NOT_FOUND: &str = "Documento no encontrado";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] DieselError),
    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("blob storage error: {0:#}")]
    Storage(anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Translates store-level constraint rejections raised by an insert.
/// Uniqueness is enforced by the store, never by a prior lookup.
pub(crate) fn insert_error(err: DieselError, conflict: &str, missing_parent: &str) -> ServiceError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ServiceError::Conflict(conflict.to_string())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            ServiceError::NotFound(missing_parent.to_string())
        }
        other => ServiceError::Database(other),
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> ServiceResult<Self> {
        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if offset < 0 {
            return Err(ServiceError::validation("skip must not be negative"));
        }
        if limit < 0 {
            return Err(ServiceError::validation("limit must not be negative"));
        }
        Ok(Self {
            offset,
            limit: limit.min(MAX_PAGE_LIMIT),
        })
    }
}
