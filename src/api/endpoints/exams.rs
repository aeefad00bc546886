//! `/examens` endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{Created, Deleted, Modified, DELETED, MODIFIED};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath};
use crate::db::repository as repo;
use crate::models::{Exam, ExamInput};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Exam>>, ApiError> {
    Ok(Json(ctx.with_conn(repo::list_exams).await?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Exam>, ApiError> {
    ctx.with_conn(move |conn| repo::get_exam(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Exam"))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<ExamInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let input = input.validated()?;
    let id = ctx.with_conn(move |conn| repo::insert_exam(conn, &input)).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ExamInput>,
) -> Result<Json<Modified>, ApiError> {
    let input = input.validated()?;
    ctx.with_conn(move |conn| repo::update_exam(conn, id, &input)).await?;
    Ok(Json(MODIFIED))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Deleted>, ApiError> {
    ctx.with_conn(move |conn| repo::delete_exam(conn, id)).await?;
    Ok(Json(DELETED))
}
