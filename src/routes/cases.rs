use axum::extract::{Json, Path, Query, State};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListQuery;
use crate::error::AppResult;
use crate::models::Case;
use crate::services::cases::{self, CaseDraft};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCaseRequest {
    #[serde(rename = "referencia", default)]
    pub reference: Option<String>,
    #[serde(rename = "cliente_id")]
    pub client_id: i32,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "abogado_asignado")]
    pub assigned_lawyer: String,
}

impl From<CreateCaseRequest> for CaseDraft {
    fn from(value: CreateCaseRequest) -> Self {
        Self {
            reference: value.reference,
            client_id: value.client_id,
            description: value.description,
            status: value.status,
            assigned_lawyer: value.assigned_lawyer,
        }
    }
}

#[derive(Serialize)]
pub struct CaseResponse {
    pub id: i32,
    #[serde(rename = "referencia")]
    pub reference: String,
    #[serde(rename = "cliente_id")]
    pub client_id: i32,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "abogado_asignado")]
    pub assigned_lawyer: String,
    #[serde(rename = "fecha_inicio")]
    pub started_at: NaiveDateTime,
}

impl From<Case> for CaseResponse {
    fn from(case: Case) -> Self {
        Self {
            id: case.id,
            reference: case.reference,
            client_id: case.client_id,
            description: case.description,
            status: case.status,
            assigned_lawyer: case.assigned_lawyer,
            started_at: case.started_at,
        }
    }
}

pub async fn create_case(
    State(state): State<AppState>,
    Json(payload): Json<CreateCaseRequest>,
) -> AppResult<Json<CaseResponse>> {
    let mut conn = state.db()?;
    let case = cases::create(&mut conn, payload.into(), Utc::now().naive_utc())?;
    Ok(Json(case.into()))
}

pub async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<CaseResponse>>> {
    let page = query.page()?;
    let mut conn = state.db()?;
    let rows = cases::list(&mut conn, page)?;
    Ok(Json(rows.into_iter().map(CaseResponse::from).collect()))
}

pub async fn get_case(
    State(state): State<AppState>,
    Path(case_id): Path<i32>,
) -> AppResult<Json<CaseResponse>> {
    let mut conn = state.db()?;
    let case = cases::get(&mut conn, case_id)?;
    Ok(Json(case.into()))
}
