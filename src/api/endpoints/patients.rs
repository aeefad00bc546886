//! `/patients` endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::{Deleted, DELETED};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::db::repository as repo;
use crate::models::{Patient, PatientFilter, PatientInput};

#[derive(Serialize)]
pub struct PatientCreated {
    #[serde(rename = "idPatient")]
    pub id: i64,
}

#[derive(Serialize)]
pub struct PatientUpdated {
    pub message: &'static str,
    #[serde(rename = "idPatient")]
    pub id: i64,
}

/// `GET /patients?nom=&prenom=&cin=&sexe=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<PatientFilter>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = ctx.with_conn(move |conn| repo::list_patients(conn, &filter)).await?;
    Ok(Json(patients))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Patient>, ApiError> {
    ctx.with_conn(move |conn| repo::get_patient(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Patient"))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<PatientInput>,
) -> Result<(StatusCode, Json<PatientCreated>), ApiError> {
    let input = input.validated()?;
    let id = ctx.with_conn(move |conn| repo::insert_patient(conn, &input)).await?;
    tracing::info!(patient_id = id, "Patient created");
    Ok((StatusCode::CREATED, Json(PatientCreated { id })))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<PatientInput>,
) -> Result<Json<PatientUpdated>, ApiError> {
    let input = input.validated()?;
    ctx.with_conn(move |conn| repo::update_patient(conn, id, &input)).await?;
    Ok(Json(PatientUpdated {
        message: "Patient mis à jour avec succès",
        id,
    }))
}

/// Appointments booked under the patient's cin go with it.
pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Deleted>, ApiError> {
    ctx.with_conn(move |conn| repo::delete_patient(conn, id)).await?;
    tracing::info!(patient_id = id, "Patient deleted");
    Ok(Json(DELETED))
}
