pub mod account;
pub mod appointment;
pub mod consultation;
pub mod enums;
pub mod exam;
pub mod filters;
pub mod patient;
pub mod practitioner;
pub mod prescription;
pub mod timefmt;

pub use account::*;
pub use appointment::*;
pub use consultation::*;
pub use exam::*;
pub use filters::*;
pub use patient::*;
pub use practitioner::*;
pub use prescription::*;

use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

/// Rejections raised at the request boundary, before the store is touched.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    Required(&'static str),

    #[error("Field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Trim a required text field; blank is a validation error.
pub(crate) fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank collapses to `None`.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deserialize an optional string enum where `""` means absent,
/// which is what HTML selects send for "no choice".
pub(crate) fn blank_as_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(d)? {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}
