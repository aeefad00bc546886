use serde::{Deserialize, Serialize};

use super::{optional, required, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practitioner {
    #[serde(rename = "cinPraticien")]
    pub national_id: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "specialite")]
    pub specialty: Option<String>,
}

impl Practitioner {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body of `POST /praticiens`. On `PUT` the key comes from the path and
/// any `cinPraticien` in the body is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PractitionerInput {
    #[serde(rename = "cinPraticien", default)]
    pub national_id: Option<String>,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "telephone", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "specialite", default)]
    pub specialty: Option<String>,
}

impl PractitionerInput {
    /// Validate for creation: the natural key is mandatory.
    pub fn into_new(self) -> Result<Practitioner, ValidationError> {
        let national_id = required("cinPraticien", self.national_id.clone().unwrap_or_default())?;
        self.into_record(national_id)
    }

    /// Validate for update of the practitioner keyed by `national_id`.
    pub fn into_record(self, national_id: String) -> Result<Practitioner, ValidationError> {
        Ok(Practitioner {
            national_id,
            last_name: required("nom", self.last_name)?,
            first_name: required("prenom", self.first_name)?,
            phone: optional(self.phone),
            email: optional(self.email),
            specialty: optional(self.specialty),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_national_id() {
        let input: PractitionerInput =
            serde_json::from_str(r#"{"nom":"Martin","prenom":"Luc"}"#).unwrap();
        assert_eq!(input.into_new().unwrap_err(), ValidationError::Required("cinPraticien"));
    }

    #[test]
    fn blank_contact_fields_become_none() {
        let input: PractitionerInput = serde_json::from_str(
            r#"{"cinPraticien":"P1","nom":"Martin","prenom":"Luc","email":"","telephone":"  "}"#,
        )
        .unwrap();
        let record = input.into_new().unwrap();
        assert_eq!(record.national_id, "P1");
        assert!(record.email.is_none());
        assert!(record.phone.is_none());
    }
}
