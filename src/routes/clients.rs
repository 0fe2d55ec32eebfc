use axum::extract::{Json, Path, Query, State};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListQuery;
use crate::error::AppResult;
use crate::models::Client;
use crate::services::clients::{self, ClientDraft};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateClientRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

impl From<CreateClientRequest> for ClientDraft {
    fn from(value: CreateClientRequest) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
        }
    }
}

#[derive(Serialize)]
pub struct ClientResponse {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "fecha_registro")]
    pub registered_at: NaiveDateTime,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            registered_at: client.registered_at,
        }
    }
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> AppResult<Json<ClientResponse>> {
    let mut conn = state.db()?;
    let client = clients::create(&mut conn, payload.into(), Utc::now().naive_utc())?;
    Ok(Json(client.into()))
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ClientResponse>>> {
    let page = query.page()?;
    let mut conn = state.db()?;
    let rows = clients::list(&mut conn, page)?;
    Ok(Json(rows.into_iter().map(ClientResponse::from).collect()))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<i32>,
) -> AppResult<Json<ClientResponse>> {
    let mut conn = state.db()?;
    let client = clients::get(&mut conn, client_id)?;
    Ok(Json(client.into()))
}
