//! `/rendezvous` endpoints. Writes go through the lifecycle so that a
//! confirmed appointment always has its consultation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::{Deleted, DELETED};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath, ApiQuery};
use crate::appointment as lifecycle;
use crate::db::repository as repo;
use crate::models::{
    Appointment, AppointmentFilter, AppointmentInput, AppointmentUpdate, StatusChange,
};

#[derive(Serialize)]
pub struct AppointmentCreated {
    pub id: i64,
    #[serde(rename = "consultationCreated")]
    pub consultation_created: bool,
}

#[derive(Serialize)]
pub struct AppointmentUpdated {
    pub message: &'static str,
    #[serde(rename = "consultationCreated")]
    pub consultation_created: bool,
}

/// `GET /rendezvous?statut=&cinPatient=&cinPraticien=&q=&from=&to=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<AppointmentFilter>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(
        ctx.with_conn(move |conn| repo::list_appointments(conn, &filter)).await?,
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Appointment>, ApiError> {
    ctx.with_conn(move |conn| repo::get_appointment(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Appointment"))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<AppointmentInput>,
) -> Result<(StatusCode, Json<AppointmentCreated>), ApiError> {
    let input = input.validated()?;
    let outcome = ctx
        .with_conn(move |conn| lifecycle::create_appointment(conn, &input))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AppointmentCreated {
            id: outcome.appointment.id,
            consultation_created: outcome.consultation_created,
        }),
    ))
}

/// `PUT /rendezvous/:id` with the whole appointment, or with only
/// `{"statut": "..."}`.
pub async fn update(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<AppointmentUpdate>,
) -> Result<Json<AppointmentUpdated>, ApiError> {
    let outcome = match update {
        AppointmentUpdate::Full(input) => {
            let input = input.validated()?;
            ctx.with_conn(move |conn| lifecycle::update_appointment(conn, id, &input))
                .await?
        }
        AppointmentUpdate::Status(change) => {
            ctx.with_conn(move |conn| lifecycle::change_status(conn, id, change.status))
                .await?
        }
    };
    Ok(Json(AppointmentUpdated {
        message: "Rendez-vous mis à jour",
        consultation_created: outcome.consultation_created,
    }))
}

/// `PUT /rendezvous/:id/statut` with `{"statut": "..."}`.
pub async fn change_status(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<AppointmentUpdated>, ApiError> {
    let outcome = ctx
        .with_conn(move |conn| lifecycle::change_status(conn, id, change.status))
        .await?;
    Ok(Json(AppointmentUpdated {
        message: "Rendez-vous mis à jour",
        consultation_created: outcome.consultation_created,
    }))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Deleted>, ApiError> {
    ctx.with_conn(move |conn| repo::delete_appointment(conn, id)).await?;
    Ok(Json(DELETED))
}
