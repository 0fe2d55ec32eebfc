use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

use super::{insert_error, require_text, Page, ServiceError, ServiceResult, CLIENT_NOT_FOUND};
use crate::models::{Client, NewClient};
use crate::schema::clients;

#[derive(Debug, Clone)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

pub fn create(
    conn: &mut SqliteConnection,
    draft: ClientDraft,
    now: NaiveDateTime,
) -> ServiceResult<Client> {
    let new_client = NewClient {
        name: require_text(&draft.name, "nombre")?,
        email: require_text(&draft.email, "email")?,
        phone: draft
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty()),
        registered_at: now,
    };

    let client: Client = diesel::insert_into(clients::table)
        .values(&new_client)
        .get_result(conn)
        .map_err(|err| insert_error(err, "El email ya está registrado", CLIENT_NOT_FOUND))?;

    info!(client_id = client.id, "client registered");
    Ok(client)
}

pub fn list(conn: &mut SqliteConnection, page: Page) -> ServiceResult<Vec<Client>> {
    let rows = clients::table
        .order(clients::id.asc())
        .offset(page.offset)
        .limit(page.limit)
        .load(conn)?;
    Ok(rows)
}

pub fn get(conn: &mut SqliteConnection, client_id: i32) -> ServiceResult<Client> {
    clients::table
        .find(client_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found(CLIENT_NOT_FOUND))
}
