use crate::{
    api::{error::ApiError, response::ApiResponse},
    cache::{Statistic, TimeGap},
    models::{DomainChallenge, FavoritesPage, IncomeRecord, Page, ProjectSnapshot, ProjectUser, ProjectView, Purchase, StatisticSeries},
    state::AppState,
    validation::{parse_optional_u32, parse_u64, require, validate_address, ValidationError},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

// Query and path values arrive as raw strings so malformed numbers get the
// structured invalid_parameter payload instead of an extractor rejection.

// Cursor-paginated list query parameters
#[derive(Deserialize)]
pub struct CursorQuery {
    cursor: Option<String>,
    limit: Option<String>,
}

impl CursorQuery {
    fn limit(&self) -> Result<Option<u32>, ValidationError> {
        parse_optional_u32("limit", self.limit.as_deref())
    }
}

// Page/limit list query parameters
#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

// GET /projects/{chain}/{id}/statistics query parameters
#[derive(Deserialize)]
pub struct StatisticsQuery {
    metric: Option<String>,
    gap: Option<String>,
    payment_method: Option<String>,
}

#[derive(Deserialize)]
pub struct AvatarBody {
    url: String,
}

#[derive(Deserialize)]
pub struct CategoriesBody {
    categories: Vec<String>,
}

#[derive(Deserialize)]
pub struct DomainBody {
    domain: String,
}

#[derive(Deserialize)]
pub struct PurchaseBody {
    buyer: String,
}

#[derive(Serialize)]
pub struct SweepResult {
    swept: usize,
}

#[derive(Serialize)]
pub struct FavoriteResult {
    changed: bool,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/projects/{chain}/{id}", get(get_project))
        .route("/projects/{chain}/{id}/avatar", put(set_avatar))
        .route("/projects/{chain}/{id}/categories", put(set_categories))
        .route("/projects/{chain}/{id}/domain", post(request_domain))
        .route("/projects/{chain}/{id}/domain/verify", post(verify_domain))
        .route("/projects/{chain}/{id}/incomes", get(get_incomes))
        .route("/projects/{chain}/{id}/users", get(get_project_users))
        .route("/projects/{chain}/{id}/statistics", get(get_statistics))
        .route("/projects/{chain}/{id}/purchases", post(record_purchase))
        .route("/users/{chain}/{address}/purchases", get(get_user_purchases))
        .route("/users/{chain}/{address}/projects", get(get_owned_projects))
        .route("/users/{chain}/{address}/favorites", get(get_favorites))
        .route(
            "/users/{chain}/{address}/favorites/{id}",
            put(add_favorite).delete(remove_favorite),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

fn project_path(chain: &str, id: &str) -> Result<(u64, u64), ValidationError> {
    Ok((parse_u64("chain", chain)?, parse_u64("id", id)?))
}

// GET /projects/{chain}/{id}
async fn get_project(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
) -> Result<ApiResponse<ProjectView>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    Ok(ApiResponse::new(state.projects.get_project(chain, id).await?))
}

// PUT /projects/{chain}/{id}/avatar
async fn set_avatar(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    body: Result<Json<AvatarBody>, JsonRejection>,
) -> Result<ApiResponse<ProjectView>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    let Json(body) = body?;
    Ok(ApiResponse::new(state.projects.set_avatar(chain, id, &body.url).await?))
}

// PUT /projects/{chain}/{id}/categories
async fn set_categories(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    body: Result<Json<CategoriesBody>, JsonRejection>,
) -> Result<ApiResponse<ProjectView>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    let Json(body) = body?;
    Ok(ApiResponse::new(
        state.projects.set_categories(chain, id, &body.categories).await?,
    ))
}

// POST /projects/{chain}/{id}/domain
async fn request_domain(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    body: Result<Json<DomainBody>, JsonRejection>,
) -> Result<ApiResponse<DomainChallenge>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    let Json(body) = body?;
    Ok(ApiResponse::new(
        state.projects.request_domain_verification(chain, id, &body.domain).await?,
    ))
}

// POST /projects/{chain}/{id}/domain/verify
async fn verify_domain(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
) -> Result<ApiResponse<ProjectView>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    Ok(ApiResponse::new(
        state.projects.confirm_domain_verification(chain, id).await?,
    ))
}

// GET /projects/{chain}/{id}/incomes
async fn get_incomes(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    Query(params): Query<CursorQuery>,
) -> Result<ApiResponse<Page<IncomeRecord>>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    let page = state
        .accounting
        .get_project_incomes(chain, id, params.cursor.as_deref(), params.limit()?)
        .await?;
    Ok(ApiResponse::new(page))
}

// GET /projects/{chain}/{id}/users
async fn get_project_users(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    Query(params): Query<CursorQuery>,
) -> Result<ApiResponse<Page<ProjectUser>>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    let page = state
        .users
        .get_project_users(chain, id, params.cursor.as_deref(), params.limit()?)
        .await?;
    Ok(ApiResponse::new(page))
}

// GET /projects/{chain}/{id}/statistics
async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    Query(params): Query<StatisticsQuery>,
) -> Result<ApiResponse<StatisticSeries>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    // Validate everything before any cache access
    let gap = TimeGap::parse(require("gap", params.gap.as_deref())?)?;
    let payment_method = params
        .payment_method
        .as_deref()
        .map(validate_address)
        .transpose()?;
    let statistic = Statistic::parse(require("metric", params.metric.as_deref())?, payment_method)?;

    let series = state
        .statistics
        .get_project_statistics(chain, id, &statistic, gap)
        .await?;
    Ok(ApiResponse::new(series))
}

// POST /projects/{chain}/{id}/purchases
async fn record_purchase(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
    body: Result<Json<PurchaseBody>, JsonRejection>,
) -> Result<ApiResponse<SweepResult>, ApiError> {
    let (chain, id) = project_path(&chain, &id)?;
    let Json(body) = body?;
    info!("Purchase notification for project {}:{}", chain, id);
    let swept = state.accounting.record_purchase(chain, id, &body.buyer).await?;
    Ok(ApiResponse::new(SweepResult { swept }))
}

// GET /users/{chain}/{address}/purchases
async fn get_user_purchases(
    State(state): State<Arc<AppState>>,
    Path((chain, address)): Path<(String, String)>,
    Query(params): Query<CursorQuery>,
) -> Result<ApiResponse<Page<Purchase>>, ApiError> {
    let chain = parse_u64("chain", &chain)?;
    let page = state
        .users
        .get_user_purchases(chain, &address, params.cursor.as_deref(), params.limit()?)
        .await?;
    Ok(ApiResponse::new(page))
}

// GET /users/{chain}/{address}/projects
async fn get_owned_projects(
    State(state): State<Arc<AppState>>,
    Path((chain, address)): Path<(String, String)>,
    Query(params): Query<CursorQuery>,
) -> Result<ApiResponse<Page<ProjectSnapshot>>, ApiError> {
    let chain = parse_u64("chain", &chain)?;
    let page = state
        .projects
        .get_owned_projects(chain, &address, params.cursor.as_deref(), params.limit()?)
        .await?;
    Ok(ApiResponse::new(page))
}

// GET /users/{chain}/{address}/favorites
async fn get_favorites(
    State(state): State<Arc<AppState>>,
    Path((chain, address)): Path<(String, String)>,
    Query(params): Query<PageQuery>,
) -> Result<ApiResponse<FavoritesPage>, ApiError> {
    let chain = parse_u64("chain", &chain)?;
    let page_number = parse_optional_u32("page", params.page.as_deref())?;
    let limit = parse_optional_u32("limit", params.limit.as_deref())?;
    let page = state
        .users
        .get_favorites(chain, &address, page_number, limit)
        .await?;
    Ok(ApiResponse::new(page))
}

// PUT /users/{chain}/{address}/favorites/{id}
async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path((chain, address, id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let chain = parse_u64("chain", &chain)?;
    let id = parse_u64("id", &id)?;
    let changed = state.users.add_favorite(chain, &address, id).await?;
    let status = if changed { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(ApiResponse::new(FavoriteResult { changed }))).into_response())
}

// DELETE /users/{chain}/{address}/favorites/{id}
async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path((chain, address, id)): Path<(String, String, String)>,
) -> Result<ApiResponse<FavoriteResult>, ApiError> {
    let chain = parse_u64("chain", &chain)?;
    let id = parse_u64("id", &id)?;
    let changed = state.users.remove_favorite(chain, &address, id).await?;
    Ok(ApiResponse::new(FavoriteResult { changed }))
}
