use std::collections::BTreeMap;

use axum::extract::{Json, Query, State};
use serde::{Deserialize, Serialize};

use super::cases::CaseResponse;
use super::clients::ClientResponse;
use super::documents::DocumentResponse;
use super::payments::PaymentResponse;
use crate::error::AppResult;
use crate::services::reports;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub desde: String,
    pub hasta: String,
}

#[derive(Serialize)]
pub struct PeriodBounds {
    pub desde: String,
    pub hasta: String,
}

#[derive(Serialize)]
pub struct PaymentsInPeriodResponse {
    pub periodo: PeriodBounds,
    pub total_pagos: usize,
    pub monto_total: f64,
    pub pagos: Vec<PaymentResponse>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub termino: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub clientes: Vec<ClientResponse>,
    pub casos: Vec<CaseResponse>,
    pub documentos: Vec<DocumentResponse>,
}

pub async fn cases_by_lawyer(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, i64>>> {
    let mut conn = state.db()?;
    Ok(Json(reports::cases_by_lawyer(&mut conn)?))
}

pub async fn payments_in_period(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PaymentsInPeriodResponse>> {
    let mut conn = state.db()?;
    let report = reports::payments_in_period(&mut conn, &query.desde, &query.hasta)?;

    Ok(Json(PaymentsInPeriodResponse {
        periodo: PeriodBounds {
            desde: report.from,
            hasta: report.to,
        },
        total_pagos: report.total_count,
        monto_total: report.total_amount,
        pagos: report.payments.into_iter().map(PaymentResponse::from).collect(),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let mut conn = state.db()?;
    let results = reports::search(&mut conn, &query.termino)?;

    Ok(Json(SearchResponse {
        clientes: results.clients.into_iter().map(ClientResponse::from).collect(),
        casos: results.cases.into_iter().map(CaseResponse::from).collect(),
        documentos: results
            .documents
            .into_iter()
            .map(DocumentResponse::from)
            .collect(),
    }))
}
