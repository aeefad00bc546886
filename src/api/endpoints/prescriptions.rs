//! `/prescriptions` endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{Created, Deleted, Modified, DELETED, MODIFIED};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::db::repository as repo;
use crate::models::{Prescription, PrescriptionFilter, PrescriptionInput};

/// `GET /prescriptions?q=&from=&to=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<PrescriptionFilter>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    Ok(Json(
        ctx.with_conn(move |conn| repo::list_prescriptions(conn, &filter)).await?,
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Prescription>, ApiError> {
    ctx.with_conn(move |conn| repo::get_prescription(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Prescription"))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<PrescriptionInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let input = input.validated()?;
    let id = ctx.with_conn(move |conn| repo::insert_prescription(conn, &input)).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<PrescriptionInput>,
) -> Result<Json<Modified>, ApiError> {
    let input = input.validated()?;
    ctx.with_conn(move |conn| repo::update_prescription(conn, id, &input)).await?;
    Ok(Json(MODIFIED))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Deleted>, ApiError> {
    ctx.with_conn(move |conn| repo::delete_prescription(conn, id)).await?;
    Ok(Json(DELETED))
}
