//! Endpoint handlers, one module per resource.
//!
//! Handlers validate bodies at the boundary and hand the store work to
//! the blocking pool through `ApiContext`.

pub mod accounts;
pub mod appointments;
pub mod consultations;
pub mod exams;
pub mod health;
pub mod patients;
pub mod practitioners;
pub mod prescriptions;
pub mod reports;

use serde::Serialize;

/// `{"deleted": 1}`
#[derive(Serialize)]
pub struct Deleted {
    pub deleted: u8,
}

/// `{"modified": 1}`
#[derive(Serialize)]
pub struct Modified {
    pub modified: u8,
}

/// `{"id": n}` for rows keyed by a surrogate id.
#[derive(Serialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub(crate) const DELETED: Deleted = Deleted { deleted: 1 };
pub(crate) const MODIFIED: Modified = Modified { modified: 1 };
