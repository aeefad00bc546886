//! `/praticiens` endpoints. Practitioners are keyed by their cin.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::{Deleted, Message, DELETED};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath};
use crate::db::repository as repo;
use crate::models::{Practitioner, PractitionerInput};

#[derive(Serialize)]
pub struct PractitionerCreated {
    pub message: &'static str,
    #[serde(rename = "cinPraticien")]
    pub national_id: String,
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Practitioner>>, ApiError> {
    Ok(Json(ctx.with_conn(repo::list_practitioners).await?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(cin): ApiPath<String>,
) -> Result<Json<Practitioner>, ApiError> {
    ctx.with_conn(move |conn| repo::get_practitioner(conn, &cin))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Practitioner"))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<PractitionerInput>,
) -> Result<(StatusCode, Json<PractitionerCreated>), ApiError> {
    let record = input.into_new()?;
    let national_id = ctx
        .with_conn(move |conn| repo::insert_practitioner(conn, &record))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PractitionerCreated {
            message: "Praticien ajouté",
            national_id,
        }),
    ))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(cin): ApiPath<String>,
    ApiJson(input): ApiJson<PractitionerInput>,
) -> Result<Json<Message>, ApiError> {
    let record = input.into_record(cin)?;
    ctx.with_conn(move |conn| repo::update_practitioner(conn, &record)).await?;
    Ok(Json(Message {
        message: "Praticien mis à jour",
    }))
}

/// Their appointments, and everything hanging off those, go with them.
pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(cin): ApiPath<String>,
) -> Result<Json<Deleted>, ApiError> {
    ctx.with_conn(move |conn| repo::delete_practitioner(conn, &cin)).await?;
    Ok(Json(DELETED))
}
