use rusqlite::{params, Connection, OptionalExtension, Row};

use super::expect_changed;
use super::prescription::unknown_consultation;
use crate::db::DatabaseError;
use crate::models::timefmt::{self, format_date};
use crate::models::*;

fn exam_from_row(row: &Row<'_>) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: row.get(0)?,
        consultation_id: row.get(1)?,
        exam_type: row.get(2)?,
        exam_date: timefmt::date_column(3, row.get(3)?)?,
        result: row.get(4)?,
    })
}

pub fn insert_exam(conn: &Connection, input: &ExamInput) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO exams (consultation_id, exam_type, exam_date, result)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            input.consultation_id,
            input.exam_type,
            format_date(&input.exam_date),
            input.result,
        ],
    )
    .map_err(|e| unknown_consultation(e.into(), input.consultation_id))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_exam(conn: &Connection, id: i64) -> Result<Option<Exam>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, consultation_id, exam_type, exam_date, result FROM exams WHERE id = ?1",
            params![id],
            exam_from_row,
        )
        .optional()?)
}

pub fn list_exams(conn: &Connection) -> Result<Vec<Exam>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, consultation_id, exam_type, exam_date, result FROM exams
         ORDER BY exam_date, id",
    )?;
    let rows = stmt.query_map([], exam_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_exams_for_consultation(
    conn: &Connection,
    consultation_id: i64,
) -> Result<Vec<Exam>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, consultation_id, exam_type, exam_date, result FROM exams
         WHERE consultation_id = ?1 ORDER BY exam_date, id",
    )?;
    let rows = stmt.query_map(params![consultation_id], exam_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_exam(conn: &Connection, id: i64, input: &ExamInput) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE exams SET consultation_id = ?1, exam_type = ?2, exam_date = ?3, result = ?4
             WHERE id = ?5",
            params![
                input.consultation_id,
                input.exam_type,
                format_date(&input.exam_date),
                input.result,
                id,
            ],
        )
        .map_err(|e| unknown_consultation(e.into(), input.consultation_id))?;
    expect_changed(changed, "Exam", id)
}

pub fn delete_exam(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM exams WHERE id = ?1", params![id])?;
    expect_changed(changed, "Exam", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{fixtures, insert_appointment, insert_consultation};
    use crate::db::sqlite::open_memory_database;
    use crate::models::timefmt::parse_date;

    fn exam(consultation_id: i64, kind: &str, on: &str) -> ExamInput {
        ExamInput {
            consultation_id,
            exam_type: kind.into(),
            exam_date: parse_date(on).unwrap(),
            result: None,
        }
    }

    #[test]
    fn crud_cycle() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let rdv = insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
            .unwrap();
        let consult =
            insert_consultation(&conn, &fixtures::consultation(rdv, "2025-03-14T09:45", None))
                .unwrap();

        let id = insert_exam(&conn, &exam(consult, "NFS", "2025-03-16")).unwrap();
        insert_exam(&conn, &exam(consult, "Radio thorax", "2025-03-15")).unwrap();
        assert_eq!(list_exams(&conn).unwrap()[0].exam_type, "Radio thorax");

        let mut with_result = exam(consult, "NFS", "2025-03-16");
        with_result.result = Some("Normal".into());
        update_exam(&conn, id, &with_result).unwrap();
        assert_eq!(get_exam(&conn, id).unwrap().unwrap().result.as_deref(), Some("Normal"));
        assert_eq!(list_exams_for_consultation(&conn, consult).unwrap().len(), 2);

        delete_exam(&conn, id).unwrap();
        assert!(get_exam(&conn, id).unwrap().is_none());
        assert!(matches!(update_exam(&conn, id, &with_result), Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn unknown_consultation_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = insert_exam(&conn, &exam(7, "NFS", "2025-03-16")).unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownReference(_)));
    }
}
