use serde::{Deserialize, Serialize};

use super::enums::Sex;
use super::{blank_as_none, optional, required, ValidationError};

pub const MAX_AGE: i64 = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "idPatient")]
    pub id: i64,
    #[serde(rename = "cinPatient")]
    pub national_id: Option<String>,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    pub age: i64,
    #[serde(rename = "adresse")]
    pub address: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "sexe")]
    pub sex: Option<Sex>,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body of `POST /patients` and `PUT /patients/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientInput {
    #[serde(rename = "cinPatient", alias = "cin", default)]
    pub national_id: Option<String>,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    pub age: i64,
    #[serde(rename = "adresse", default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "sexe", default, deserialize_with = "blank_as_none")]
    pub sex: Option<Sex>,
    #[serde(rename = "telephone", default)]
    pub phone: Option<String>,
}

impl PatientInput {
    pub fn validated(self) -> Result<Self, ValidationError> {
        if !(0..=MAX_AGE).contains(&self.age) {
            return Err(ValidationError::Invalid {
                field: "age",
                reason: format!("must be between 0 and {MAX_AGE}"),
            });
        }
        Ok(Self {
            national_id: optional(self.national_id),
            first_name: required("prenom", self.first_name)?,
            last_name: required("nom", self.last_name)?,
            age: self.age,
            address: optional(self.address),
            email: optional(self.email),
            sex: self.sex,
            phone: optional(self.phone),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_cin_alias_and_french_names() {
        let input: PatientInput = serde_json::from_str(
            r#"{"cin":"A1","nom":"Dupont","prenom":"Jean","age":40,"sexe":"Homme"}"#,
        )
        .unwrap();
        assert_eq!(input.national_id.as_deref(), Some("A1"));
        assert_eq!(input.sex, Some(Sex::Male));
        assert!(input.email.is_none());
    }

    #[test]
    fn blank_sex_is_absent() {
        let input: PatientInput =
            serde_json::from_str(r#"{"nom":"D","prenom":"J","age":1,"sexe":""}"#).unwrap();
        assert_eq!(input.sex, None);
    }

    #[test]
    fn unknown_sex_is_rejected() {
        let result: Result<PatientInput, _> =
            serde_json::from_str(r#"{"nom":"D","prenom":"J","age":1,"sexe":"X"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_blank_name_and_bad_age() {
        let base: PatientInput =
            serde_json::from_str(r#"{"nom":" ","prenom":"J","age":1}"#).unwrap();
        assert_eq!(base.validated().unwrap_err(), ValidationError::Required("nom"));

        let old: PatientInput =
            serde_json::from_str(r#"{"nom":"D","prenom":"J","age":200}"#).unwrap();
        assert!(matches!(old.validated(), Err(ValidationError::Invalid { field: "age", .. })));
    }

    #[test]
    fn serializes_with_wire_names() {
        let patient = Patient {
            id: 7,
            national_id: Some("A1".into()),
            first_name: "Jean".into(),
            last_name: "Dupont".into(),
            age: 40,
            address: None,
            email: None,
            sex: Some(Sex::Male),
            phone: None,
        };
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["idPatient"], 7);
        assert_eq!(json["cinPatient"], "A1");
        assert_eq!(json["sexe"], "Homme");
        assert_eq!(patient.full_name(), "Jean Dupont");
    }
}
