use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use catalog_core::{CatalogError, CatalogQuery, Durability};
use serde::{Deserialize, Serialize};
use tower::limit::ConcurrencyLimitLayer;

use crate::catalog::CatalogHandle;
use crate::config::DaemonConfig;
use crate::display::SiteView;
use crate::error::Result;
use crate::forms::EntryForm;
use crate::signals::ShutdownSignal;

pub async fn run(
    config: &DaemonConfig,
    catalog: CatalogHandle,
    shutdown: ShutdownSignal,
) -> Result<()> {
    let addr = config.socket_addr()?;
    let app = router(config, catalog);

    log::info!("listening on {addr}");

    axum::Server::try_bind(&addr)?
        .tcp_nodelay(config.server().tcp_nodelay)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    log::info!("http server stopped");
    Ok(())
}

pub fn router(config: &DaemonConfig, catalog: CatalogHandle) -> Router {
    let state = AppState {
        catalog,
        admin_token: config.admin().token().map(Arc::from),
        copyright: Arc::from(config.site().copyright.as_str()),
    };

    let mut app = Router::new()
        .route("/healthz", get(health))
        .route("/api/sites", get(list_sites))
        .route("/api/sites/:name", get(show_site))
        .route("/api/categories", get(list_categories))
        .route("/api/tags", get(list_tags))
        .route("/api/admin/sites", post(create_site))
        .route("/api/admin/sites/:name", put(update_site).delete(delete_site))
        .route("/api/admin/reload", post(reload))
        .with_state(state);

    if let Some(limit) = config.server().body_limit {
        app = app.layer(DefaultBodyLimit::max(limit));
    }

    if let Some(limit) = config.server().concurrency_limit {
        app = app.layer(ConcurrencyLimitLayer::new(limit));
    }

    app
}

#[derive(Clone)]
struct AppState {
    catalog: CatalogHandle,
    admin_token: Option<Arc<str>>,
    copyright: Arc<str>,
}

impl AppState {
    fn authorize(&self, headers: &HeaderMap) -> std::result::Result<(), ApiError> {
        let Some(expected) = self.admin_token.as_deref() else {
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                "admin access is not configured",
            ));
        };

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match presented {
            Some(token) if token == expected => Ok(()),
            _ => Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "missing or invalid admin token",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: String,
    category: String,
    sort: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    entries: usize,
    generation: u64,
}

#[derive(Serialize)]
struct SiteListing {
    sites: Vec<SiteView>,
    categories: BTreeSet<String>,
    query: String,
    selected_category: String,
    sort: Option<&'static str>,
    copyright: String,
    generation: u64,
}

#[derive(Serialize)]
struct MutationResponse {
    status: &'static str,
    persisted: bool,
    warning: Option<String>,
    generation: u64,
}

impl MutationResponse {
    fn new(durability: &Durability, generation: u64) -> Self {
        Self {
            status: "ok",
            persisted: durability.is_persisted(),
            warning: durability
                .error()
                .map(|err| format!("change kept in memory only: {err}")),
            generation,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
}

type ApiResult<T> = std::result::Result<T, ApiError>;

async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok",
        entries: state.catalog.len()?,
        generation: state.catalog.generation(),
    }))
}

async fn list_sites(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SiteListing>> {
    let query = CatalogQuery::from_params(&params.q, &params.category, &params.sort);
    let sites = state
        .catalog
        .query(&query)?
        .into_iter()
        .map(SiteView::from)
        .collect();

    Ok(Json(SiteListing {
        sites,
        categories: state.catalog.unique_categories()?,
        query: params.q,
        selected_category: params.category,
        sort: query.sort.map(|key| key.as_str()),
        copyright: state.copyright.to_string(),
        generation: state.catalog.generation(),
    }))
}

async fn show_site(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SiteView>> {
    state
        .catalog
        .get(&name)?
        .map(|entry| Json(SiteView::from(entry)))
        .ok_or_else(|| CatalogError::NotFound(name).into())
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<BTreeSet<String>>> {
    Ok(Json(state.catalog.unique_categories()?))
}

async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<BTreeSet<String>>> {
    Ok(Json(state.catalog.unique_tags()?))
}

async fn create_site(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<EntryForm>,
) -> ApiResult<(StatusCode, Json<MutationResponse>)> {
    state.authorize(&headers)?;

    let entry = form.into_entry(None);
    log::info!("adding entry {:?}", entry.name);
    let durability = state.catalog.insert(entry)?;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::new(&durability, state.catalog.generation())),
    ))
}

async fn update_site(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(form): Json<EntryForm>,
) -> ApiResult<Json<MutationResponse>> {
    state.authorize(&headers)?;

    log::info!("updating entry {name:?}");
    let durability = state
        .catalog
        .update_with(&name, move |previous| form.into_entry(Some(previous)))?;

    Ok(Json(MutationResponse::new(
        &durability,
        state.catalog.generation(),
    )))
}

async fn delete_site(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<Json<MutationResponse>> {
    state.authorize(&headers)?;

    log::info!("deleting entry {name:?}");
    let durability = state.catalog.delete(&name)?;

    Ok(Json(MutationResponse::new(
        &durability,
        state.catalog.generation(),
    )))
}

async fn reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<HealthResponse>> {
    state.authorize(&headers)?;

    let entries = state.catalog.load()?;
    Ok(Json(HealthResponse {
        status: "ok",
        entries,
        generation: state.catalog.generation(),
    }))
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let (status, message) = map_catalog_error(&err);
        if status.is_server_error() {
            log::error!("request failed: {message}");
        }
        ApiError::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = ErrorResponse {
            status: "error",
            error: self.message,
        };
        (self.status, Json(payload)).into_response()
    }
}

fn map_catalog_error(err: &CatalogError) -> (StatusCode, String) {
    match err {
        CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::Load(_) | CatalogError::LockPoisoned(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
