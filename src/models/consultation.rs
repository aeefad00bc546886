use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timefmt;
use super::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(rename = "idConsult")]
    pub id: i64,
    #[serde(rename = "idRdv")]
    pub appointment_id: i64,
    #[serde(rename = "dateConsult", with = "timefmt::datetime")]
    pub consulted_at: NaiveDateTime,
    #[serde(rename = "compteRendu")]
    pub report: String,
    #[serde(rename = "prix")]
    pub price: Option<f64>,
}

impl Consultation {
    /// Billed amount; an unset price counts as zero.
    pub fn billed(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

/// Body of `POST /consultations` and `PUT /consultations/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsultationInput {
    #[serde(rename = "idRdv")]
    pub appointment_id: i64,
    /// Defaults to "now" when absent.
    #[serde(rename = "dateConsult", default, with = "timefmt::option_datetime")]
    pub consulted_at: Option<NaiveDateTime>,
    #[serde(rename = "compteRendu", default)]
    pub report: Option<String>,
    #[serde(rename = "prix", default)]
    pub price: Option<f64>,
}

impl ConsultationInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ValidationError::Invalid {
                    field: "prix",
                    reason: "must be a non-negative amount".into(),
                });
            }
        }
        Ok(self)
    }
}
