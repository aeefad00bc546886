use rusqlite::{params, Connection, OptionalExtension, Row};

use super::expect_changed;
use crate::db::DatabaseError;
use crate::models::*;

fn practitioner_from_row(row: &Row<'_>) -> rusqlite::Result<Practitioner> {
    Ok(Practitioner {
        national_id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        specialty: row.get(5)?,
    })
}

/// Returns the natural key the row was stored under.
pub fn insert_practitioner(conn: &Connection, p: &Practitioner) -> Result<String, DatabaseError> {
    conn.execute(
        "INSERT INTO practitioners (cin_practitioner, last_name, first_name, phone, email, specialty)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![p.national_id, p.last_name, p.first_name, p.phone, p.email, p.specialty],
    )?;
    Ok(p.national_id.clone())
}

pub fn get_practitioner(conn: &Connection, cin: &str) -> Result<Option<Practitioner>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT cin_practitioner, last_name, first_name, phone, email, specialty
             FROM practitioners WHERE cin_practitioner = ?1",
            params![cin],
            practitioner_from_row,
        )
        .optional()?)
}

pub fn list_practitioners(conn: &Connection) -> Result<Vec<Practitioner>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT cin_practitioner, last_name, first_name, phone, email, specialty
         FROM practitioners ORDER BY last_name, first_name",
    )?;
    let rows = stmt.query_map([], practitioner_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Overwrites every column except the natural key.
pub fn update_practitioner(conn: &Connection, p: &Practitioner) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE practitioners SET last_name = ?1, first_name = ?2, phone = ?3, email = ?4,
         specialty = ?5
         WHERE cin_practitioner = ?6",
        params![p.last_name, p.first_name, p.phone, p.email, p.specialty, p.national_id],
    )?;
    expect_changed(changed, "Practitioner", &p.national_id)
}

/// Appointments with this practitioner cascade away.
pub fn delete_practitioner(conn: &Connection, cin: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM practitioners WHERE cin_practitioner = ?1",
        params![cin],
    )?;
    expect_changed(changed, "Practitioner", cin)
}
