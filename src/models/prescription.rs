use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timefmt;
use super::{required, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(rename = "idPrescrire")]
    pub id: i64,
    #[serde(rename = "idConsult")]
    pub consultation_id: i64,
    #[serde(rename = "typePrescrire")]
    pub treatment: String,
    #[serde(rename = "posologie")]
    pub dosage: String,
    #[serde(rename = "datePrescrire", with = "timefmt::option_date")]
    pub prescribed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionInput {
    #[serde(rename = "idConsult")]
    pub consultation_id: i64,
    #[serde(rename = "typePrescrire")]
    pub treatment: String,
    #[serde(rename = "posologie")]
    pub dosage: String,
    #[serde(rename = "datePrescrire", default, with = "timefmt::option_date")]
    pub prescribed_on: Option<NaiveDate>,
}

impl PrescriptionInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            treatment: required("typePrescrire", self.treatment)?,
            dosage: required("posologie", self.dosage)?,
            ..self
        })
    }
}
