use serde::{Deserialize, Serialize};

/// Staff account. Login is blocked until an admin approves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(rename = "isApproved")]
    pub is_approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub email: String,
}

/// Stored row with the password hash, never serialized.
#[derive(Debug, Clone)]
pub struct Credentials<T> {
    pub account: T,
    pub password_hash: String,
}

/// Body of `/register`, `/login`, `/admins`, `/admins/login`.
/// Fields default to empty so a missing one is a 400, not a parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
