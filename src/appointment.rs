//! Appointment lifecycle.
//!
//! Statuses move freely between `en_attente`, `confirme` and `annule`.
//! Every write that leaves an appointment `confirme` makes sure it has its
//! derived consultation (dated at the appointment time, empty report, no
//! price). The status write and the derivation share one transaction, and
//! the consultation table's unique key on `appointment_id` turns a repeated
//! confirmation into a no-op.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::{self, materialize_consultation};
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::{Appointment, AppointmentInput};

/// Result of a lifecycle write.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleOutcome {
    pub appointment: Appointment,
    /// `true` only when this write created the derived consultation.
    #[serde(rename = "consultationCreated")]
    pub consultation_created: bool,
}

/// Book an appointment. One booked directly as `confirme` gets its
/// consultation immediately.
pub fn create_appointment(
    conn: &Connection,
    input: &AppointmentInput,
) -> Result<LifecycleOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let id = repository::insert_appointment(&tx, input)?;
    let outcome = settle(&tx, id)?;
    tx.commit()?;

    tracing::debug!(appointment_id = id, status = %input.status, "Appointment booked");
    Ok(outcome)
}

/// Overwrite every field of an appointment, status included.
pub fn update_appointment(
    conn: &Connection,
    id: i64,
    input: &AppointmentInput,
) -> Result<LifecycleOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    repository::update_appointment(&tx, id, input)?;
    let outcome = settle(&tx, id)?;
    tx.commit()?;
    Ok(outcome)
}

/// Status-only transition. Any transition is accepted, re-opening included.
pub fn change_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<LifecycleOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    repository::set_appointment_status(&tx, id, status)?;
    let outcome = settle(&tx, id)?;
    tx.commit()?;

    tracing::debug!(appointment_id = id, status = %status, "Appointment status changed");
    Ok(outcome)
}

/// Re-read the written appointment and derive its consultation when confirmed.
fn settle(conn: &Connection, id: i64) -> Result<LifecycleOutcome, DatabaseError> {
    let appointment = repository::get_appointment(conn, id)?
        .ok_or_else(|| DatabaseError::not_found("Appointment", id))?;

    let consultation_created = appointment.status == AppointmentStatus::Confirmed
        && materialize_consultation(conn, &appointment)?;
    if consultation_created {
        tracing::info!(appointment_id = id, "Consultation derived from confirmed appointment");
    }

    Ok(LifecycleOutcome {
        appointment,
        consultation_created,
    })
}
