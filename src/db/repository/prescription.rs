use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{expect_changed, like_pattern};
use crate::db::DatabaseError;
use crate::models::timefmt::{self, format_date};
use crate::models::*;
use crate::text::non_blank;

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    let prescribed_on = match row.get::<_, Option<String>>(4)? {
        Some(raw) => Some(timefmt::date_column(4, raw)?),
        None => None,
    };
    Ok(Prescription {
        id: row.get(0)?,
        consultation_id: row.get(1)?,
        treatment: row.get(2)?,
        dosage: row.get(3)?,
        prescribed_on,
    })
}

pub(crate) fn unknown_consultation(err: DatabaseError, consultation_id: i64) -> DatabaseError {
    match err {
        DatabaseError::UnknownReference(_) => {
            DatabaseError::UnknownReference(format!("no consultation with id {consultation_id}"))
        }
        other => other,
    }
}

pub fn insert_prescription(conn: &Connection, input: &PrescriptionInput) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (consultation_id, treatment, dosage, prescribed_on)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            input.consultation_id,
            input.treatment,
            input.dosage,
            input.prescribed_on.as_ref().map(format_date),
        ],
    )
    .map_err(|e| unknown_consultation(e.into(), input.consultation_id))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_prescription(conn: &Connection, id: i64) -> Result<Option<Prescription>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, consultation_id, treatment, dosage, prescribed_on
             FROM prescriptions WHERE id = ?1",
            params![id],
            prescription_from_row,
        )
        .optional()?)
}

/// Prescriptions narrowed by free text (treatment, dosage, or the full
/// name of the patient or practitioner behind the consultation) and by
/// an inclusive date range. Undated prescriptions fall outside any range.
pub fn list_prescriptions(
    conn: &Connection,
    filter: &PrescriptionFilter,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut sql = String::from(
        "SELECT rx.id, rx.consultation_id, rx.treatment, rx.dosage, rx.prescribed_on
         FROM prescriptions rx
         LEFT JOIN consultations c ON c.id = rx.consultation_id
         LEFT JOIN appointments a ON a.id = c.appointment_id
         WHERE 1=1",
    );
    let mut args: Vec<Value> = Vec::new();

    if let Some(q) = non_blank(&filter.q) {
        sql.push_str(
            " AND (fold(rx.treatment) LIKE ? ESCAPE '\\'
               OR fold(rx.dosage) LIKE ? ESCAPE '\\'
               OR EXISTS (SELECT 1 FROM patients p WHERE p.cin_patient = a.patient_cin
                   AND fold(p.first_name || ' ' || p.last_name) LIKE ? ESCAPE '\\')
               OR EXISTS (SELECT 1 FROM practitioners pr WHERE pr.cin_practitioner = a.practitioner_cin
                   AND fold(pr.first_name || ' ' || pr.last_name) LIKE ? ESCAPE '\\'))",
        );
        let pattern = like_pattern(q);
        args.extend(std::iter::repeat(Value::Text(pattern)).take(4));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND rx.prescribed_on >= ?");
        args.push(Value::Text(format_date(&from)));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND rx.prescribed_on <= ?");
        args.push(Value::Text(format_date(&to)));
    }
    sql.push_str(" ORDER BY rx.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), prescription_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_prescriptions_for_consultation(
    conn: &Connection,
    consultation_id: i64,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, consultation_id, treatment, dosage, prescribed_on
         FROM prescriptions WHERE consultation_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![consultation_id], prescription_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_prescription(
    conn: &Connection,
    id: i64,
    input: &PrescriptionInput,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE prescriptions SET consultation_id = ?1, treatment = ?2, dosage = ?3,
             prescribed_on = ?4
             WHERE id = ?5",
            params![
                input.consultation_id,
                input.treatment,
                input.dosage,
                input.prescribed_on.as_ref().map(format_date),
                id,
            ],
        )
        .map_err(|e| unknown_consultation(e.into(), input.consultation_id))?;
    expect_changed(changed, "Prescription", id)
}

pub fn delete_prescription(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM prescriptions WHERE id = ?1", params![id])?;
    expect_changed(changed, "Prescription", id)
}
