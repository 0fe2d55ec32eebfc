use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, MethodRouter},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::AppResult;
use crate::services::Page;
use crate::state::AppState;

pub mod cases;
pub mod clients;
pub mod documents;
pub mod health;
pub mod payments;
pub mod reports;

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn page(&self) -> AppResult<Page> {
        Ok(Page::new(self.skip, self.limit)?)
    }
}

/// Registers a collection route both with and without the trailing slash.
fn collection(
    router: Router<AppState>,
    path: &str,
    handler: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allow_origin = match state.config.cors_allowed_origin.as_ref() {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        warn!(origin = value, "ignoring invalid CORS allowed origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(&state);
    let body_limit = state.config.max_upload_bytes;

    let mut router = Router::new();
    router = collection(
        router,
        "/api/clientes",
        get(clients::list_clients).post(clients::create_client),
    );
    router = collection(
        router,
        "/api/casos",
        get(cases::list_cases).post(cases::create_case),
    );
    router = collection(
        router,
        "/api/pagos",
        get(payments::list_payments).post(payments::register_payment),
    );
    router = collection(router, "/api/documentos", post(documents::upload_document));
    router = collection(router, "/api/busqueda", get(reports::search));

    router
        .route("/api/clientes/:id", get(clients::get_client))
        .route("/api/casos/:id", get(cases::get_case))
        .route(
            "/api/documentos/caso/:id",
            get(documents::list_case_documents),
        )
        .route(
            "/api/documentos/:id/descarga",
            get(documents::download_document),
        )
        .route(
            "/api/reportes/casos-por-abogado",
            get(reports::cases_by_lawyer),
        )
        .route(
            "/api/reportes/pagos-por-periodo",
            get(reports::payments_in_period),
        )
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
}
