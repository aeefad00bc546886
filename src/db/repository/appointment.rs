use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{enum_column, expect_changed, like_pattern, patient_cin_exists};
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::timefmt::{self, format_date, format_datetime};
use crate::models::*;
use crate::text::non_blank;

const APPOINTMENT_COLUMNS: &str =
    "a.id, a.patient_cin, a.practitioner_cin, a.scheduled_at, a.status, a.parent_id";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_cin: row.get(1)?,
        practitioner_cin: row.get(2)?,
        scheduled_at: timefmt::datetime_column(3, row.get(3)?)?,
        status: enum_column(4, &row.get::<_, String>(4)?)?,
        parent_id: row.get(5)?,
    })
}

/// The patient side is matched by natural id, which the schema cannot
/// enforce, so it is checked here. The practitioner side is a foreign key.
fn check_patient_reference(conn: &Connection, cin: &str) -> Result<(), DatabaseError> {
    if !patient_cin_exists(conn, cin)? {
        return Err(DatabaseError::UnknownReference(format!("no patient with cin {cin}")));
    }
    Ok(())
}

pub fn insert_appointment(conn: &Connection, input: &AppointmentInput) -> Result<i64, DatabaseError> {
    check_patient_reference(conn, &input.patient_cin)?;
    conn.execute(
        "INSERT INTO appointments (patient_cin, practitioner_cin, scheduled_at, status, parent_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            input.patient_cin,
            input.practitioner_cin,
            format_datetime(&input.scheduled_at),
            input.status.as_str(),
            input.parent_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    Ok(conn.query_row(&sql, params![id], appointment_from_row).optional()?)
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();

    if let Some(status) = filter.statut {
        sql.push_str(" AND a.status = ?");
        args.push(Value::Text(status.as_str().into()));
    }
    if let Some(cin) = non_blank(&filter.patient_cin) {
        sql.push_str(" AND a.patient_cin = ?");
        args.push(Value::Text(cin.into()));
    }
    if let Some(cin) = non_blank(&filter.practitioner_cin) {
        sql.push_str(" AND a.practitioner_cin = ?");
        args.push(Value::Text(cin.into()));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND date(a.scheduled_at) >= ?");
        args.push(Value::Text(format_date(&from)));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND date(a.scheduled_at) <= ?");
        args.push(Value::Text(format_date(&to)));
    }
    if let Some(q) = non_blank(&filter.q) {
        sql.push_str(
            " AND (EXISTS (SELECT 1 FROM patients p WHERE p.cin_patient = a.patient_cin
                   AND fold(p.first_name || ' ' || p.last_name) LIKE ? ESCAPE '\\')
               OR EXISTS (SELECT 1 FROM practitioners pr WHERE pr.cin_practitioner = a.practitioner_cin
                   AND fold(pr.first_name || ' ' || pr.last_name) LIKE ? ESCAPE '\\'))",
        );
        let pattern = like_pattern(q);
        args.push(Value::Text(pattern.clone()));
        args.push(Value::Text(pattern));
    }
    sql.push_str(" ORDER BY a.scheduled_at, a.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), appointment_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_appointment(
    conn: &Connection,
    id: i64,
    input: &AppointmentInput,
) -> Result<(), DatabaseError> {
    if get_appointment(conn, id)?.is_none() {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    check_patient_reference(conn, &input.patient_cin)?;
    let changed = conn.execute(
        "UPDATE appointments SET patient_cin = ?1, practitioner_cin = ?2, scheduled_at = ?3,
         status = ?4, parent_id = ?5
         WHERE id = ?6",
        params![
            input.patient_cin,
            input.practitioner_cin,
            format_datetime(&input.scheduled_at),
            input.status.as_str(),
            input.parent_id,
            id,
        ],
    )?;
    expect_changed(changed, "Appointment", id)
}

pub fn set_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    expect_changed(changed, "Appointment", id)
}

/// Its consultation, and that consultation's prescriptions and exams, cascade.
pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    expect_changed(changed, "Appointment", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{fixtures, insert_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::timefmt::parse_date;

    #[test]
    fn insert_rejects_unknown_patient() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let err = insert_appointment(&conn, &fixtures::appointment("ZZ", "P1", "2025-03-14T09:30"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownReference(_)));
    }

    #[test]
    fn insert_rejects_unknown_practitioner() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let err = insert_appointment(&conn, &fixtures::appointment("A1", "P9", "2025-03-14T09:30"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownReference(_)), "got {err:?}");
    }

    #[test]
    fn round_trips_through_the_store() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let id = insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
            .unwrap();
        let stored = get_appointment(&conn, id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Pending);
        assert_eq!(format_datetime(&stored.scheduled_at), "2025-03-14T09:30:00");
    }

    #[test]
    fn list_filters_by_status_range_and_name() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        insert_patient(&conn, &fixtures::patient("B2", "Lefèvre", "Hélène", None)).unwrap();
        let first = insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
            .unwrap();
        insert_appointment(&conn, &fixtures::appointment("B2", "P1", "2025-03-20T10:00")).unwrap();
        set_appointment_status(&conn, first, AppointmentStatus::Cancelled).unwrap();

        let cancelled = AppointmentFilter {
            statut: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        assert_eq!(list_appointments(&conn, &cancelled).unwrap().len(), 1);

        let range = AppointmentFilter {
            from: parse_date("2025-03-15"),
            to: parse_date("2025-03-20"),
            ..Default::default()
        };
        let in_range = list_appointments(&conn, &range).unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].patient_cin, "B2");

        let by_name = AppointmentFilter { q: Some("helene".into()), ..Default::default() };
        assert_eq!(list_appointments(&conn, &by_name).unwrap()[0].patient_cin, "B2");

        let by_practitioner = AppointmentFilter { q: Some("luc mar".into()), ..Default::default() };
        assert_eq!(list_appointments(&conn, &by_practitioner).unwrap().len(), 2);
    }

    #[test]
    fn missing_appointment_is_not_found() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let input = fixtures::appointment("A1", "P1", "2025-03-14T09:30");
        assert!(matches!(update_appointment(&conn, 5, &input), Err(DatabaseError::NotFound { .. })));
        assert!(matches!(
            set_appointment_status(&conn, 5, AppointmentStatus::Confirmed),
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(delete_appointment(&conn, 5), Err(DatabaseError::NotFound { .. })));
        assert_eq!(fixtures::count(&conn, "appointments"), 0);
    }

    #[test]
    fn patient_delete_removes_only_matching_appointments() {
        let conn = open_memory_database().unwrap();
        let (patient_id, _) = fixtures::seed_pair(&conn);
        insert_patient(&conn, &fixtures::patient("B2", "Lefèvre", "Hélène", None)).unwrap();
        insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30")).unwrap();
        insert_appointment(&conn, &fixtures::appointment("B2", "P1", "2025-03-14T10:30")).unwrap();

        crate::db::repository::delete_patient(&conn, patient_id).unwrap();
        let left = list_appointments(&conn, &AppointmentFilter::default()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].patient_cin, "B2");
    }
}
