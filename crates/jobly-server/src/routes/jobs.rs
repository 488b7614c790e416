use crate::AppState;
use crate::auth::AdminPrincipal;
use crate::error::ApiResult;
use crate::params::JobQuery;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobly::{Job, JobFilter, JobPatch, NewJob, ensure_valid};
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail).patch(update).delete(remove))
}

/// `GET /jobs?minSalary=&hasEquity=&title=`
async fn list(
    State(state): State<AppState>,
    query: Result<Query<JobQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(raw) = query?;
    let filter = JobFilter::try_from(raw)?;

    let conn = state.conn().await?;
    let jobs = Job::find_all(&conn, &filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

async fn detail(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let conn = state.conn().await?;
    let job = Job::get(&conn, id).await?;
    Ok(Json(json!({ "result": job })))
}

async fn create(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    body: Result<Json<NewJob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(input) = body?;
    ensure_valid(&input)?;

    let conn = state.conn().await?;
    let job = Job::create(&conn, &input).await?;
    tracing::info!(by = %admin.username, id = job.id, "job posted");
    Ok((StatusCode::CREATED, Json(json!({ "result": job }))))
}

async fn update(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<JobPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    ensure_valid(&patch)?;

    let conn = state.conn().await?;
    let job = Job::update(&conn, id, &patch).await?;
    Ok(Json(json!({ "result": job })))
}

async fn remove(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let conn = state.conn().await?;
    let deleted = Job::remove(&conn, id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
