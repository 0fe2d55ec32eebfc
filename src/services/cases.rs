use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

use super::{clients, insert_error, Page, ServiceError, ServiceResult, CASE_NOT_FOUND, CLIENT_NOT_FOUND};
use crate::models::{Case, NewCase};
use crate::references::case_reference;
use crate::schema::cases;

#[derive(Debug, Clone)]
pub struct CaseDraft {
    pub reference: Option<String>,
    pub client_id: i32,
    pub description: String,
    pub status: String,
    pub assigned_lawyer: String,
}

pub fn create(
    conn: &mut SqliteConnection,
    draft: CaseDraft,
    now: NaiveDateTime,
) -> ServiceResult<Case> {
    let client = clients::get(conn, draft.client_id)?;

    let reference = draft
        .reference
        .map(|reference| reference.trim().to_string())
        .filter(|reference| !reference.is_empty())
        .unwrap_or_else(|| case_reference(client.id, now));

    let new_case = NewCase {
        reference,
        client_id: client.id,
        description: draft.description,
        status: draft.status,
        started_at: now,
        assigned_lawyer: draft.assigned_lawyer,
    };

    let case: Case = diesel::insert_into(cases::table)
        .values(&new_case)
        .get_result(conn)
        .map_err(|err| {
            insert_error(
                err,
                &format!("La referencia {} ya existe", new_case.reference),
                CLIENT_NOT_FOUND,
            )
        })?;

    info!(
        case_id = case.id,
        client_id = case.client_id,
        reference = %case.reference,
        "case opened"
    );
    Ok(case)
}

pub fn list(conn: &mut SqliteConnection, page: Page) -> ServiceResult<Vec<Case>> {
    let rows = cases::table
        .order(cases::id.asc())
        .offset(page.offset)
        .limit(page.limit)
        .load(conn)?;
    Ok(rows)
}

pub fn get(conn: &mut SqliteConnection, case_id: i32) -> ServiceResult<Case> {
    cases::table
        .find(case_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found(CASE_NOT_FOUND))
}
