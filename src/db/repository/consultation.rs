use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{expect_changed, like_pattern};
use crate::db::DatabaseError;
use crate::models::timefmt::{self, format_date, format_datetime};
use crate::models::*;
use crate::text::non_blank;

const CONSULTATION_COLUMNS: &str = "c.id, c.appointment_id, c.consulted_at, c.report, c.price";

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        consulted_at: timefmt::datetime_column(2, row.get(2)?)?,
        report: row.get(3)?,
        price: row.get(4)?,
    })
}

fn one_per_appointment(err: DatabaseError, appointment_id: i64) -> DatabaseError {
    match err {
        DatabaseError::Conflict(_) => DatabaseError::Conflict(format!(
            "appointment {appointment_id} already has a consultation"
        )),
        DatabaseError::UnknownReference(_) => {
            DatabaseError::UnknownReference(format!("no appointment with id {appointment_id}"))
        }
        other => other,
    }
}

/// Record a consultation. Date defaults to now and report to empty.
pub fn insert_consultation(conn: &Connection, input: &ConsultationInput) -> Result<i64, DatabaseError> {
    let consulted_at = input
        .consulted_at
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    conn.execute(
        "INSERT INTO consultations (appointment_id, consulted_at, report, price)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            input.appointment_id,
            format_datetime(&consulted_at),
            input.report.as_deref().unwrap_or(""),
            input.price,
        ],
    )
    .map_err(|e| one_per_appointment(e.into(), input.appointment_id))?;
    Ok(conn.last_insert_rowid())
}

/// Derive the consultation of a confirmed appointment: dated at the
/// appointment time, empty report, no price. Returns `false` when the
/// appointment already has one.
pub fn materialize_consultation(conn: &Connection, appointment: &Appointment) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT INTO consultations (appointment_id, consulted_at, report, price)
         VALUES (?1, ?2, '', NULL)
         ON CONFLICT(appointment_id) DO NOTHING",
        params![appointment.id, format_datetime(&appointment.scheduled_at)],
    )?;
    Ok(inserted == 1)
}

pub fn get_consultation(conn: &Connection, id: i64) -> Result<Option<Consultation>, DatabaseError> {
    let sql = format!("SELECT {CONSULTATION_COLUMNS} FROM consultations c WHERE c.id = ?1");
    Ok(conn.query_row(&sql, params![id], consultation_from_row).optional()?)
}

pub fn get_consultation_for_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<Option<Consultation>, DatabaseError> {
    let sql =
        format!("SELECT {CONSULTATION_COLUMNS} FROM consultations c WHERE c.appointment_id = ?1");
    Ok(conn.query_row(&sql, params![appointment_id], consultation_from_row).optional()?)
}

pub fn list_consultations(conn: &Connection) -> Result<Vec<Consultation>, DatabaseError> {
    search_consultations(conn, &ConsultationFilter::default())
}

/// Consultations narrowed by patient name, practitioner name, calendar day,
/// report text and price bounds. People are reached through the
/// appointment's natural ids; a consultation whose appointment points at
/// nobody still appears when no name filter is given.
pub fn search_consultations(
    conn: &Connection,
    filter: &ConsultationFilter,
) -> Result<Vec<Consultation>, DatabaseError> {
    let mut sql = format!(
        "SELECT {CONSULTATION_COLUMNS} FROM consultations c
         LEFT JOIN appointments a ON a.id = c.appointment_id
         WHERE 1=1"
    );
    let mut args: Vec<Value> = Vec::new();

    if let Some(patient) = non_blank(&filter.patient) {
        sql.push_str(
            " AND EXISTS (SELECT 1 FROM patients p WHERE p.cin_patient = a.patient_cin
                AND (fold(p.last_name) LIKE ? ESCAPE '\\' OR fold(p.first_name) LIKE ? ESCAPE '\\'))",
        );
        let pattern = like_pattern(patient);
        args.push(Value::Text(pattern.clone()));
        args.push(Value::Text(pattern));
    }
    if let Some(practitioner) = non_blank(&filter.praticien) {
        sql.push_str(
            " AND EXISTS (SELECT 1 FROM practitioners pr WHERE pr.cin_practitioner = a.practitioner_cin
                AND (fold(pr.last_name) LIKE ? ESCAPE '\\' OR fold(pr.first_name) LIKE ? ESCAPE '\\'))",
        );
        let pattern = like_pattern(practitioner);
        args.push(Value::Text(pattern.clone()));
        args.push(Value::Text(pattern));
    }
    if let Some(day) = filter.date {
        sql.push_str(" AND date(c.consulted_at) = date(?)");
        args.push(Value::Text(format_date(&day)));
    }
    if let Some(report) = non_blank(&filter.compte_rendu) {
        sql.push_str(" AND fold(c.report) LIKE ? ESCAPE '\\'");
        args.push(Value::Text(like_pattern(report)));
    }
    if let Some(min) = filter.price_min {
        sql.push_str(" AND COALESCE(c.price, 0) >= ?");
        args.push(Value::Real(min));
    }
    if let Some(max) = filter.price_max {
        sql.push_str(" AND COALESCE(c.price, 0) <= ?");
        args.push(Value::Real(max));
    }
    sql.push_str(" ORDER BY c.consulted_at, c.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), consultation_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Overwrite a consultation. An absent date keeps the stored one; an
/// absent report clears it.
pub fn update_consultation(
    conn: &Connection,
    id: i64,
    input: &ConsultationInput,
) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE consultations SET appointment_id = ?1,
             consulted_at = COALESCE(?2, consulted_at), report = ?3, price = ?4
             WHERE id = ?5",
            params![
                input.appointment_id,
                input.consulted_at.as_ref().map(format_datetime),
                input.report.as_deref().unwrap_or(""),
                input.price,
                id,
            ],
        )
        .map_err(|e| one_per_appointment(e.into(), input.appointment_id))?;
    expect_changed(changed, "Consultation", id)
}

/// Prescriptions and exams of the consultation cascade.
pub fn delete_consultation(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM consultations WHERE id = ?1", params![id])?;
    expect_changed(changed, "Consultation", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{fixtures, get_appointment, insert_appointment, insert_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::timefmt::parse_date;

    fn seeded() -> (rusqlite::Connection, i64) {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let rdv = insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
            .unwrap();
        (conn, rdv)
    }

    #[test]
    fn insert_defaults_report_to_empty() {
        let (conn, rdv) = seeded();
        let input = ConsultationInput {
            appointment_id: rdv,
            consulted_at: None,
            report: None,
            price: Some(25.0),
        };
        let id = insert_consultation(&conn, &input).unwrap();
        let stored = get_consultation(&conn, id).unwrap().unwrap();
        assert_eq!(stored.report, "");
        assert_eq!(stored.price, Some(25.0));
    }

    #[test]
    fn second_consultation_for_appointment_conflicts() {
        let (conn, rdv) = seeded();
        insert_consultation(&conn, &fixtures::consultation(rdv, "2025-03-14T09:30", None)).unwrap();
        let err = insert_consultation(&conn, &fixtures::consultation(rdv, "2025-03-15T09:30", None))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert_eq!(fixtures::count(&conn, "consultations"), 1);
    }

    #[test]
    fn unknown_appointment_is_rejected() {
        let (conn, _) = seeded();
        let err = insert_consultation(&conn, &fixtures::consultation(999, "2025-03-14T09:30", None))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownReference(_)));
    }

    #[test]
    fn materialize_is_idempotent() {
        let (conn, rdv) = seeded();
        let appointment = get_appointment(&conn, rdv).unwrap().unwrap();
        assert!(materialize_consultation(&conn, &appointment).unwrap());
        assert!(!materialize_consultation(&conn, &appointment).unwrap());

        let derived = get_consultation_for_appointment(&conn, rdv).unwrap().unwrap();
        assert_eq!(derived.consulted_at, appointment.scheduled_at);
        assert_eq!(derived.report, "");
        assert_eq!(derived.price, None);
    }

    #[test]
    fn search_by_names_day_report_and_price() {
        let (conn, rdv) = seeded();
        insert_patient(&conn, &fixtures::patient("B2", "Lefèvre", "Hélène", None)).unwrap();
        let other = insert_appointment(&conn, &fixtures::appointment("B2", "P1", "2025-03-20T10:00"))
            .unwrap();
        let mut first = fixtures::consultation(rdv, "2025-03-14T09:45", Some(30.0));
        first.report = Some("Angine, repos".into());
        insert_consultation(&conn, &first).unwrap();
        insert_consultation(&conn, &fixtures::consultation(other, "2025-03-20T10:05", None)).unwrap();

        let by_patient = ConsultationFilter { patient: Some("dupont".into()), ..Default::default() };
        assert_eq!(search_consultations(&conn, &by_patient).unwrap().len(), 1);

        let by_first_name = ConsultationFilter { patient: Some("HELENE".into()), ..Default::default() };
        assert_eq!(search_consultations(&conn, &by_first_name).unwrap()[0].appointment_id, other);

        let by_practitioner =
            ConsultationFilter { praticien: Some("mart".into()), ..Default::default() };
        assert_eq!(search_consultations(&conn, &by_practitioner).unwrap().len(), 2);

        let by_day = ConsultationFilter { date: parse_date("2025-03-20"), ..Default::default() };
        assert_eq!(search_consultations(&conn, &by_day).unwrap()[0].appointment_id, other);

        let by_report = ConsultationFilter { compte_rendu: Some("angine".into()), ..Default::default() };
        assert_eq!(search_consultations(&conn, &by_report).unwrap()[0].appointment_id, rdv);

        let free = ConsultationFilter { price_max: Some(0.0), ..Default::default() };
        assert_eq!(search_consultations(&conn, &free).unwrap()[0].appointment_id, other);

        let combined = ConsultationFilter {
            patient: Some("dupont".into()),
            praticien: Some("martin".into()),
            date: parse_date("2025-03-20"),
            ..Default::default()
        };
        assert!(search_consultations(&conn, &combined).unwrap().is_empty());
    }

    #[test]
    fn shared_national_id_does_not_duplicate_rows() {
        let (conn, rdv) = seeded();
        insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Marie", None)).unwrap();
        insert_consultation(&conn, &fixtures::consultation(rdv, "2025-03-14T09:45", None)).unwrap();
        let filter = ConsultationFilter { patient: Some("dupont".into()), ..Default::default() };
        assert_eq!(search_consultations(&conn, &filter).unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_date_when_absent() {
        let (conn, rdv) = seeded();
        let id = insert_consultation(&conn, &fixtures::consultation(rdv, "2025-03-14T09:45", None))
            .unwrap();
        let change = ConsultationInput {
            appointment_id: rdv,
            consulted_at: None,
            report: Some("RAS".into()),
            price: Some(40.0),
        };
        update_consultation(&conn, id, &change).unwrap();
        let stored = get_consultation(&conn, id).unwrap().unwrap();
        assert_eq!(format_datetime(&stored.consulted_at), "2025-03-14T09:45:00");
        assert_eq!(stored.report, "RAS");
        assert_eq!(stored.price, Some(40.0));

        assert!(matches!(
            update_consultation(&conn, id + 1, &change),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn deleting_appointment_cascades_to_consultation_children() {
        let (conn, rdv) = seeded();
        let id = insert_consultation(&conn, &fixtures::consultation(rdv, "2025-03-14T09:45", None))
            .unwrap();
        conn.execute(
            "INSERT INTO prescriptions (consultation_id, treatment, dosage) VALUES (?1, 'A', 'B')",
            params![id],
        )
        .unwrap();
        crate::db::repository::delete_appointment(&conn, rdv).unwrap();
        assert_eq!(fixtures::count(&conn, "consultations"), 0);
        assert_eq!(fixtures::count(&conn, "prescriptions"), 0);
    }
}
