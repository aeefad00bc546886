//! `/consultations` endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{Created, Deleted, Modified, DELETED, MODIFIED};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::db::repository as repo;
use crate::models::{Consultation, ConsultationFilter, ConsultationInput};

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Consultation>>, ApiError> {
    Ok(Json(ctx.with_conn(repo::list_consultations).await?))
}

/// `GET /consultations/search?patient=&praticien=&date=&compteRendu=&prixMin=&prixMax=`
pub async fn search(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<ConsultationFilter>,
) -> Result<Json<Vec<Consultation>>, ApiError> {
    Ok(Json(
        ctx.with_conn(move |conn| repo::search_consultations(conn, &filter)).await?,
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Consultation>, ApiError> {
    ctx.with_conn(move |conn| repo::get_consultation(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Consultation"))
}

/// 409 when the appointment already has its consultation.
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<ConsultationInput>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let input = input.validated()?;
    let id = ctx.with_conn(move |conn| repo::insert_consultation(conn, &input)).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ConsultationInput>,
) -> Result<Json<Modified>, ApiError> {
    let input = input.validated()?;
    ctx.with_conn(move |conn| repo::update_consultation(conn, id, &input)).await?;
    Ok(Json(MODIFIED))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Deleted>, ApiError> {
    ctx.with_conn(move |conn| repo::delete_consultation(conn, id)).await?;
    Ok(Json(DELETED))
}
