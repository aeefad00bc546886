use chrono::NaiveDate;
use serde::Deserialize;

use super::enums::{AppointmentStatus, Sex};
use super::{blank_as_none, timefmt};

/// Query of `GET /patients`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PatientFilter {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub cin: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sexe: Option<Sex>,
}

/// Query of `GET /consultations/search`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConsultationFilter {
    /// Patient last or first name.
    pub patient: Option<String>,
    /// Practitioner last or first name.
    pub praticien: Option<String>,
    /// Calendar day of the consultation.
    #[serde(default, with = "timefmt::option_date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "compteRendu")]
    pub compte_rendu: Option<String>,
    /// Price bounds; an unset price counts as zero.
    #[serde(rename = "prixMin", default, deserialize_with = "blank_as_none")]
    pub price_min: Option<f64>,
    #[serde(rename = "prixMax", default, deserialize_with = "blank_as_none")]
    pub price_max: Option<f64>,
}

/// Query of `GET /rendezvous`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AppointmentFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub statut: Option<AppointmentStatus>,
    #[serde(rename = "cinPatient")]
    pub patient_cin: Option<String>,
    #[serde(rename = "cinPraticien")]
    pub practitioner_cin: Option<String>,
    /// Free text over the patient's or the practitioner's full name.
    pub q: Option<String>,
    #[serde(default, with = "timefmt::option_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, with = "timefmt::option_date")]
    pub to: Option<NaiveDate>,
}

/// Query of `GET /prescriptions`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PrescriptionFilter {
    /// Free text over treatment, dosage, patient and practitioner names.
    pub q: Option<String>,
    #[serde(default, with = "timefmt::option_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, with = "timefmt::option_date")]
    pub to: Option<NaiveDate>,
}

/// Inclusive calendar-day range; an open end imposes no bound.
pub fn within_days(day: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        timefmt::parse_date(s).unwrap()
    }

    #[test]
    fn day_range_is_inclusive() {
        assert!(within_days(d("2025-01-10"), Some(d("2025-01-10")), Some(d("2025-01-10"))));
        assert!(!within_days(d("2025-01-11"), None, Some(d("2025-01-10"))));
        assert!(within_days(d("2025-01-11"), None, None));
    }

    #[test]
    fn blank_query_values_are_absent() {
        let filter: AppointmentFilter =
            serde_json::from_str(r#"{"statut":"","from":""}"#).unwrap();
        assert!(filter.statut.is_none());
        assert!(filter.from.is_none());
    }
}
