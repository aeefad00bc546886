//! API router.
//!
//! Paths keep the names the clinic's web client already uses
//! (`/praticiens`, `/rendezvous`, `/examens`). Every request passes the
//! CORS layer and the request logger.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints::{
    accounts, appointments, consultations, exams, health, patients, practitioners, prescriptions,
    reports,
};
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full router over a shared context.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let record_routes: Router<ApiContext> = Router::new()
        .route("/patients", get(patients::list).post(patients::create))
        .route(
            "/patients/:id",
            get(patients::detail).put(patients::update).delete(patients::delete),
        )
        .route("/praticiens", get(practitioners::list).post(practitioners::create))
        .route(
            "/praticiens/:cin",
            get(practitioners::detail)
                .put(practitioners::update)
                .delete(practitioners::delete),
        )
        .route("/rendezvous", get(appointments::list).post(appointments::create))
        .route(
            "/rendezvous/:id",
            get(appointments::detail)
                .put(appointments::update)
                .delete(appointments::delete),
        )
        .route("/rendezvous/:id/statut", put(appointments::change_status))
        .route("/consultations", get(consultations::list).post(consultations::create))
        .route("/consultations/search", get(consultations::search))
        .route(
            "/consultations/:id",
            get(consultations::detail)
                .put(consultations::update)
                .delete(consultations::delete),
        )
        .route("/prescriptions", get(prescriptions::list).post(prescriptions::create))
        .route(
            "/prescriptions/:id",
            get(prescriptions::detail)
                .put(prescriptions::update)
                .delete(prescriptions::delete),
        )
        .route("/examens", get(exams::list).post(exams::create))
        .route(
            "/examens/:id",
            get(exams::detail).put(exams::update).delete(exams::delete),
        );

    let account_routes: Router<ApiContext> = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/users", get(accounts::list_users))
        .route("/users/pending", get(accounts::list_pending))
        .route("/users/:id/approve", put(accounts::approve))
        .route("/users/:id", axum::routing::delete(accounts::delete_user))
        .route("/admins", get(accounts::list_admins).post(accounts::create_admin))
        .route("/admins/login", post(accounts::admin_login))
        .route("/admins/:id", axum::routing::delete(accounts::delete_admin));

    let report_routes: Router<ApiContext> = Router::new()
        .route("/dashboard", get(reports::dashboard))
        .route("/consultations/stats", get(reports::consultation_stats))
        .route("/prescriptions/stats", get(reports::prescription_stats))
        .route("/billing", get(reports::billing))
        .route("/billing.csv", get(reports::billing_csv))
        .route("/billing/:id", get(reports::patient_billing))
        .route("/billing/:id/invoice.pdf", get(reports::invoice_pdf))
        .route("/patients.pdf", get(reports::patients_pdf))
        .route("/patients.csv", get(reports::patients_csv))
        .route("/praticiens.csv", get(reports::practitioners_csv))
        .route("/rendezvous.csv", get(reports::appointments_csv))
        .route("/prescriptions.csv", get(reports::prescriptions_csv))
        .route("/consultations.pdf", get(reports::daily_consultations_pdf))
        .route("/consultations.csv", get(reports::consultations_csv));

    Router::new()
        .route("/health", get(health::check))
        .merge(record_routes)
        .merge(account_routes)
        .nest("/reports", report_routes)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(CorsLayer::permissive())
}
