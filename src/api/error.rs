//! HTTP errors with `{"error": "<message>"}` bodies.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::db::DatabaseError;
use crate::models::ValidationError;
use crate::reporting::ExportError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Nothing to return; answered with an empty 204.
    #[error("No content")]
    NoContent,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, detail),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, detail),
            ApiError::NoContent => return StatusCode::NO_CONTENT.into_response(),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Erreur serveur : {detail}"))
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// French "not found" message for an entity name used by the store.
fn not_found_message(entity_type: &str) -> String {
    match entity_type {
        "Patient" => "Patient non trouvé".into(),
        "Practitioner" => "Praticien non trouvé".into(),
        "Appointment" => "Rendez-vous non trouvé".into(),
        "Consultation" => "Consultation non trouvée".into(),
        "Prescription" => "Prescription non trouvée".into(),
        "Exam" => "Examen non trouvé".into(),
        "User" => "Utilisateur non trouvé".into(),
        "Admin" => "Admin non trouvé".into(),
        other => format!("{other} non trouvé"),
    }
}

impl ApiError {
    pub fn not_found(entity_type: &str) -> Self {
        ApiError::NotFound(not_found_message(entity_type))
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => ApiError::not_found(&entity_type),
            DatabaseError::Conflict(detail) => ApiError::Conflict(detail),
            DatabaseError::UnknownReference(detail) => ApiError::BadRequest(detail),
            DatabaseError::ConstraintViolation(detail) => ApiError::BadRequest(detail),
            err @ DatabaseError::InvalidEnum { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::MissingFields
            | AccountError::AlreadyRegistered
            | AccountError::AdminCapReached(_)
            | AccountError::AdminExists => ApiError::BadRequest(err.to_string()),
            AccountError::UnknownUser | AccountError::UnknownAdmin | AccountError::WrongPassword => {
                ApiError::Unauthorized(err.to_string())
            }
            AccountError::PendingApproval => ApiError::Forbidden(err.to_string()),
            AccountError::Password(e) => ApiError::Internal(e.to_string()),
            AccountError::Database(e) => e.into(),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NothingToExport => ApiError::NoContent,
            ExportError::Render(detail) => ApiError::Internal(detail),
            ExportError::Database(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_found_uses_entity_message() {
        let response = ApiError::from(DatabaseError::not_found("Consultation", 4)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Consultation non trouvée");
    }

    #[tokio::test]
    async fn conflict_returns_409() {
        let response = ApiError::from(DatabaseError::Conflict("dup".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "dup");
    }

    #[tokio::test]
    async fn unknown_reference_is_bad_request() {
        let err = DatabaseError::UnknownReference("no patient with cin Z".into());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn account_errors_map_to_auth_statuses() {
        let cases = [
            (AccountError::PendingApproval, StatusCode::FORBIDDEN),
            (AccountError::WrongPassword, StatusCode::UNAUTHORIZED),
            (AccountError::UnknownUser, StatusCode::UNAUTHORIZED),
            (AccountError::AdminCapReached(3), StatusCode::BAD_REQUEST),
            (AccountError::AlreadyRegistered, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn nothing_to_export_is_empty_204() {
        let response = ApiError::from(ExportError::NothingToExport).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn internal_keeps_store_message() {
        let response = ApiError::Internal("disk I/O error".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Erreur serveur : disk I/O error");
    }
}
