use axum::extract::{Json, Query, State};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListQuery;
use crate::error::AppResult;
use crate::models::Payment;
use crate::services::payments::{self, PaymentDraft};
use crate::state::AppState;

// Unknown fields (a client-sent `recibo_ref` included) are dropped.
#[derive(Deserialize)]
pub struct RegisterPaymentRequest {
    #[serde(rename = "caso_id")]
    pub case_id: i32,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "metodo")]
    pub method: String,
}

impl From<RegisterPaymentRequest> for PaymentDraft {
    fn from(value: RegisterPaymentRequest) -> Self {
        Self {
            case_id: value.case_id,
            amount: value.amount,
            method: value.method,
        }
    }
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: i32,
    #[serde(rename = "caso_id")]
    pub case_id: i32,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "metodo")]
    pub method: String,
    #[serde(rename = "fecha")]
    pub paid_at: NaiveDateTime,
    #[serde(rename = "recibo_ref")]
    pub receipt_reference: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            case_id: payment.case_id,
            amount: payment.amount,
            method: payment.method,
            paid_at: payment.paid_at,
            receipt_reference: payment.receipt_reference,
        }
    }
}

pub async fn register_payment(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    let mut conn = state.db()?;
    let payment = payments::register(&mut conn, payload.into(), Utc::now().naive_utc())?;
    Ok(Json(payment.into()))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let page = query.page()?;
    let mut conn = state.db()?;
    let rows = payments::list(&mut conn, page)?;
    Ok(Json(rows.into_iter().map(PaymentResponse::from).collect()))
}
