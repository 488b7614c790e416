use crate::AppState;
use crate::auth::AdminPrincipal;
use crate::error::ApiResult;
use crate::params::CompanyQuery;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobly::{Company, CompanyFilter, CompanyPatch, NewCompany, ensure_valid};
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:handle", get(detail).patch(update).delete(remove))
}

/// `GET /companies?minEmployees=&maxEmployees=&name=`
async fn list(
    State(state): State<AppState>,
    query: Result<Query<CompanyQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(raw) = query?;
    let filter = CompanyFilter::try_from(raw)?;

    let conn = state.conn().await?;
    let companies = Company::find_all(&conn, &filter).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// `GET /companies/:handle`, including the company's jobs.
async fn detail(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let company = Company::get(&conn, &handle).await?;
    Ok(Json(json!({ "company": company })))
}

async fn create(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    body: Result<Json<NewCompany>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(input) = body?;
    ensure_valid(&input)?;

    let conn = state.conn().await?;
    let company = Company::create(&conn, &input).await?;
    tracing::info!(by = %admin.username, handle = %company.handle, "company posted");
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path(handle): Path<String>,
    body: Result<Json<CompanyPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(patch) = body?;
    ensure_valid(&patch)?;

    let conn = state.conn().await?;
    let company = Company::update(&conn, &handle, &patch).await?;
    Ok(Json(json!({ "company": company })))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path(handle): Path<String>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn().await?;
    let deleted = Company::remove(&conn, &handle).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
