use axum::{extract::State, http::StatusCode, response::Json};
use diesel::RunQueryDsl;
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

/// Reports liveness once the record store answers a trivial query.
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.db()?;
    diesel::sql_query("SELECT 1").execute(&mut conn)?;
    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}
