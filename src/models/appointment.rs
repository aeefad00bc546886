use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::timefmt;
use super::{required, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "idRdv")]
    pub id: i64,
    #[serde(rename = "cinPatient")]
    pub patient_cin: String,
    #[serde(rename = "cinPraticien")]
    pub practitioner_cin: String,
    #[serde(rename = "dateHeure", with = "timefmt::datetime")]
    pub scheduled_at: NaiveDateTime,
    #[serde(rename = "statut")]
    pub status: AppointmentStatus,
    /// Rescheduling chain. Stored and returned, never interpreted.
    #[serde(rename = "idRdvParent")]
    pub parent_id: Option<i64>,
}

/// Body of `POST /rendezvous`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentInput {
    #[serde(rename = "cinPatient")]
    pub patient_cin: String,
    #[serde(rename = "cinPraticien")]
    pub practitioner_cin: String,
    #[serde(rename = "dateHeure", with = "timefmt::datetime")]
    pub scheduled_at: NaiveDateTime,
    #[serde(rename = "statut", default)]
    pub status: AppointmentStatus,
    #[serde(rename = "idRdvParent", default)]
    pub parent_id: Option<i64>,
}

impl AppointmentInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            patient_cin: required("cinPatient", self.patient_cin)?,
            practitioner_cin: required("cinPraticien", self.practitioner_cin)?,
            ..self
        })
    }
}

/// Body of `PUT /rendezvous/:id/statut`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    #[serde(rename = "statut")]
    pub status: AppointmentStatus,
}

/// Body of `PUT /rendezvous/:id`: the whole appointment, or only its
/// status as the agenda's confirm and cancel buttons send it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AppointmentUpdate {
    Full(AppointmentInput),
    Status(StatusChange),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_pending() {
        let input: AppointmentInput = serde_json::from_str(
            r#"{"cinPatient":"A1","cinPraticien":"P1","dateHeure":"2025-03-14T09:30"}"#,
        )
        .unwrap();
        assert_eq!(input.status, AppointmentStatus::Pending);
        assert_eq!(input.parent_id, None);
    }

    #[test]
    fn invalid_status_is_rejected() {
        let result: Result<AppointmentInput, _> = serde_json::from_str(
            r#"{"cinPatient":"A1","cinPraticien":"P1","dateHeure":"2025-03-14T09:30","statut":"done"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn update_body_may_carry_only_a_status() {
        let update: AppointmentUpdate = serde_json::from_str(r#"{"statut":"annule"}"#).unwrap();
        assert!(matches!(
            update,
            AppointmentUpdate::Status(StatusChange { status: AppointmentStatus::Cancelled })
        ));

        let update: AppointmentUpdate = serde_json::from_str(
            r#"{"cinPatient":"A1","cinPraticien":"P1","dateHeure":"2025-03-14T09:30","statut":"confirme"}"#,
        )
        .unwrap();
        assert!(matches!(update, AppointmentUpdate::Full(ref input) if input.patient_cin == "A1"));

        assert!(serde_json::from_str::<AppointmentUpdate>(r#"{"statut":"done"}"#).is_err());
    }

    #[test]
    fn blank_patient_reference_fails_validation() {
        let input: AppointmentInput = serde_json::from_str(
            r#"{"cinPatient":" ","cinPraticien":"P1","dateHeure":"2025-03-14T09:30"}"#,
        )
        .unwrap();
        assert_eq!(input.validated().unwrap_err(), ValidationError::Required("cinPatient"));
    }
}
