use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timefmt;
use super::{optional, required, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    #[serde(rename = "idExamen")]
    pub id: i64,
    #[serde(rename = "idConsult")]
    pub consultation_id: i64,
    #[serde(rename = "typeExamen")]
    pub exam_type: String,
    #[serde(rename = "dateExamen", with = "timefmt::date")]
    pub exam_date: NaiveDate,
    /// Empty until the result is recorded.
    #[serde(rename = "resultat")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamInput {
    #[serde(rename = "idConsult")]
    pub consultation_id: i64,
    #[serde(rename = "typeExamen")]
    pub exam_type: String,
    #[serde(rename = "dateExamen", with = "timefmt::date")]
    pub exam_date: NaiveDate,
    #[serde(rename = "resultat", default)]
    pub result: Option<String>,
}

impl ExamInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            exam_type: required("typeExamen", self.exam_type)?,
            result: optional(self.result),
            ..self
        })
    }
}
