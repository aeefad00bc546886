//! `/reports` endpoints: statistics, billing and document exports.
//!
//! Each request loads a snapshot under the store lock, then aggregates or
//! renders after the lock is released.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiPath, ApiQuery};
use crate::db::DatabaseError;
use crate::models::{
    timefmt, AppointmentFilter, ConsultationFilter, PatientFilter, PrescriptionFilter,
};
use crate::reporting::{
    self, pdf, spreadsheet, BillingReport, ClinicSnapshot, ConsultationStats, DashboardStats,
    Document, PatientStatement, PrescriptionStats,
};

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    #[serde(default, with = "timefmt::option_date")]
    pub date: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

async fn with_snapshot<T, E, F>(ctx: &ApiContext, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    E: Into<ApiError> + From<DatabaseError> + Send + 'static,
    F: FnOnce(&ClinicSnapshot) -> Result<T, E> + Send + 'static,
{
    ctx.blocking(move |store, _| {
        let snapshot = {
            let conn = store.lock().map_err(E::from)?;
            ClinicSnapshot::load(&conn).map_err(E::from)?
        };
        f(&snapshot)
    })
    .await
}

/// Serve a rendered document as a download.
fn download(doc: Document) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", doc.filename);
    (
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.bytes,
    )
        .into_response()
}

// ─── Statistics ───────────────────────────────────────────────────────────────

pub async fn dashboard(State(ctx): State<ApiContext>) -> Result<Json<DashboardStats>, ApiError> {
    let stats = with_snapshot(&ctx, |s| {
        Ok::<_, DatabaseError>(reporting::dashboard(s, today()))
    })
    .await?;
    Ok(Json(stats))
}

pub async fn consultation_stats(
    State(ctx): State<ApiContext>,
) -> Result<Json<ConsultationStats>, ApiError> {
    let stats = with_snapshot(&ctx, |s| {
        Ok::<_, DatabaseError>(reporting::consultation_stats(s, today()))
    })
    .await?;
    Ok(Json(stats))
}

pub async fn prescription_stats(
    State(ctx): State<ApiContext>,
) -> Result<Json<PrescriptionStats>, ApiError> {
    let stats = with_snapshot(&ctx, |s| {
        Ok::<_, DatabaseError>(reporting::prescription_stats(s, today()))
    })
    .await?;
    Ok(Json(stats))
}

// ─── Billing ──────────────────────────────────────────────────────────────────

pub async fn billing(State(ctx): State<ApiContext>) -> Result<Json<BillingReport>, ApiError> {
    let report = with_snapshot(&ctx, |s| Ok::<_, DatabaseError>(reporting::billing_report(s))).await?;
    Ok(Json(report))
}

pub async fn patient_billing(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PatientStatement>, ApiError> {
    let statement = with_snapshot(&ctx, move |s| {
        let patient = s.patient(id).ok_or_else(|| ApiError::not_found("Patient"))?;
        Ok::<_, ApiError>(reporting::patient_statement(s, patient))
    })
    .await?;
    Ok(Json(statement))
}

pub async fn invoice_pdf(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, move |s| {
        let patient = s.patient(id).ok_or_else(|| ApiError::not_found("Patient"))?;
        pdf::invoice_pdf(s, patient, today()).map_err(ApiError::from)
    })
    .await?;
    Ok(download(doc))
}

pub async fn billing_csv(State(ctx): State<ApiContext>) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, spreadsheet::billing_csv).await?;
    Ok(download(doc))
}

// ─── Exports ──────────────────────────────────────────────────────────────────
//
// List exports take the same query as the matching list endpoint.

pub async fn patients_pdf(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<PatientFilter>,
) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, move |s| pdf::patients_pdf(s, &filter, today())).await?;
    Ok(download(doc))
}

pub async fn patients_csv(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<PatientFilter>,
) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, move |s| spreadsheet::patients_csv(s, &filter)).await?;
    Ok(download(doc))
}

pub async fn practitioners_csv(State(ctx): State<ApiContext>) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, spreadsheet::practitioners_csv).await?;
    Ok(download(doc))
}

pub async fn appointments_csv(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<AppointmentFilter>,
) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, move |s| spreadsheet::appointments_csv(s, &filter)).await?;
    Ok(download(doc))
}

pub async fn consultations_csv(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<ConsultationFilter>,
) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, move |s| spreadsheet::consultations_csv(s, &filter)).await?;
    Ok(download(doc))
}

pub async fn prescriptions_csv(
    State(ctx): State<ApiContext>,
    ApiQuery(filter): ApiQuery<PrescriptionFilter>,
) -> Result<Response, ApiError> {
    let doc = with_snapshot(&ctx, move |s| spreadsheet::prescriptions_csv(s, &filter)).await?;
    Ok(download(doc))
}

/// `GET /reports/consultations.pdf?date=YYYY-MM-DD`
pub async fn daily_consultations_pdf(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<DayQuery>,
) -> Result<Response, ApiError> {
    let day = query
        .date
        .ok_or_else(|| ApiError::BadRequest("Paramètre 'date' requis (AAAA-MM-JJ)".into()))?;
    let doc = with_snapshot(&ctx, move |s| pdf::daily_consultations_pdf(s, day)).await?;
    Ok(download(doc))
}
