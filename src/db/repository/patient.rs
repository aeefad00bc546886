use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{enum_column, expect_changed, like_pattern};
use crate::db::DatabaseError;
use crate::models::*;
use crate::text::non_blank;

const PATIENT_COLUMNS: &str =
    "id, cin_patient, first_name, last_name, age, address, email, sex, phone";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let sex = match row.get::<_, Option<String>>(7)? {
        Some(raw) => Some(enum_column(7, &raw)?),
        None => None,
    };
    Ok(Patient {
        id: row.get(0)?,
        national_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        age: row.get(4)?,
        address: row.get(5)?,
        email: row.get(6)?,
        sex,
        phone: row.get(8)?,
    })
}

pub fn insert_patient(conn: &Connection, input: &PatientInput) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (cin_patient, first_name, last_name, age, address, email, sex, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            input.national_id,
            input.first_name,
            input.last_name,
            input.age,
            input.address,
            input.email,
            input.sex.map(|s| s.as_str()),
            input.phone,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], patient_from_row).optional()?)
}

/// First patient carrying this national id. Ids are not unique; the
/// lowest surrogate id wins, matching how the joined reports resolve it.
pub fn find_patient_by_cin(conn: &Connection, cin: &str) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE cin_patient = ?1 ORDER BY id LIMIT 1"
    );
    Ok(conn.query_row(&sql, params![cin], patient_from_row).optional()?)
}

pub fn patient_cin_exists(conn: &Connection, cin: &str) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM patients WHERE cin_patient = ?1 LIMIT 1",
            params![cin],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// List patients, narrowing by every non-blank filter field.
pub fn list_patients(conn: &Connection, filter: &PatientFilter) -> Result<Vec<Patient>, DatabaseError> {
    let mut sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(nom) = non_blank(&filter.nom) {
        sql.push_str(" AND fold(last_name) LIKE ? ESCAPE '\\'");
        args.push(like_pattern(nom));
    }
    if let Some(prenom) = non_blank(&filter.prenom) {
        sql.push_str(" AND fold(first_name) LIKE ? ESCAPE '\\'");
        args.push(like_pattern(prenom));
    }
    if let Some(cin) = non_blank(&filter.cin) {
        sql.push_str(" AND fold(cin_patient) LIKE ? ESCAPE '\\'");
        args.push(like_pattern(cin));
    }
    if let Some(sex) = filter.sexe {
        sql.push_str(" AND sex = ?");
        args.push(sex.as_str().to_string());
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Appointments follow a changed national id once no other patient holds
/// the old one. Clearing an id that still has appointments is refused.
pub fn update_patient(conn: &Connection, id: i64, input: &PatientInput) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET cin_patient = ?1, first_name = ?2, last_name = ?3, age = ?4,
         address = ?5, email = ?6, sex = ?7, phone = ?8
         WHERE id = ?9",
        params![
            input.national_id,
            input.first_name,
            input.last_name,
            input.age,
            input.address,
            input.email,
            input.sex.map(|s| s.as_str()),
            input.phone,
            id,
        ],
    )?;
    expect_changed(changed, "Patient", id)
}

/// Appointments carrying the patient's national id go with it (store trigger).
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    expect_changed(changed, "Patient", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{fixtures, get_appointment, insert_appointment, insert_practitioner};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Sex;

    #[test]
    fn insert_then_get() {
        let conn = open_memory_database().unwrap();
        let id = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", Some(Sex::Male)))
            .unwrap();
        let patient = get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.last_name, "Dupont");
        assert_eq!(patient.sex, Some(Sex::Male));
        assert!(get_patient(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn search_is_case_and_accent_insensitive() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", Some(Sex::Male))).unwrap();
        insert_patient(&conn, &fixtures::patient("B2", "Lefèvre", "Hélène", Some(Sex::Female)))
            .unwrap();

        let by_name = PatientFilter { nom: Some("dup".into()), ..Default::default() };
        let found = list_patients(&conn, &by_name).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].national_id.as_deref(), Some("A1"));

        let accented = PatientFilter { prenom: Some("helene".into()), ..Default::default() };
        assert_eq!(list_patients(&conn, &accented).unwrap().len(), 1);

        let by_sex = PatientFilter { sexe: Some(Sex::Female), ..Default::default() };
        assert_eq!(list_patients(&conn, &by_sex).unwrap()[0].last_name, "Lefèvre");
    }

    #[test]
    fn blank_filters_are_ignored() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        let filter = PatientFilter {
            nom: Some("  ".into()),
            cin: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(list_patients(&conn, &filter).unwrap().len(), 1);
    }

    #[test]
    fn wildcard_characters_match_literally() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        let filter = PatientFilter { nom: Some("%".into()), ..Default::default() };
        assert!(list_patients(&conn, &filter).unwrap().is_empty());
    }

    #[test]
    fn update_missing_patient_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = update_patient(&conn, 99, &fixtures::patient("A1", "D", "J", None)).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert_eq!(fixtures::count(&conn, "patients"), 0);
    }

    #[test]
    fn update_overwrites_every_column() {
        let conn = open_memory_database().unwrap();
        let id = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", Some(Sex::Male)))
            .unwrap();
        let mut changed = fixtures::patient("A9", "Durand", "Paul", None);
        changed.age = 12;
        update_patient(&conn, id, &changed).unwrap();

        let patient = get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.national_id.as_deref(), Some("A9"));
        assert_eq!(patient.age, 12);
        assert_eq!(patient.sex, None);
    }

    #[test]
    fn delete_twice_is_not_found() {
        let conn = open_memory_database().unwrap();
        let id = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        delete_patient(&conn, id).unwrap();
        assert!(matches!(delete_patient(&conn, id), Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn cin_lookup_prefers_lowest_id() {
        let conn = open_memory_database().unwrap();
        let first = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        insert_patient(&conn, &fixtures::patient("A1", "Autre", "Jean", None)).unwrap();
        assert_eq!(find_patient_by_cin(&conn, "A1").unwrap().unwrap().id, first);
        assert!(patient_cin_exists(&conn, "A1").unwrap());
        assert!(!patient_cin_exists(&conn, "Z9").unwrap());
    }

    fn book(conn: &Connection, cin: &str) -> i64 {
        insert_practitioner(conn, &fixtures::practitioner("P1", "Martin", "Luc")).unwrap();
        insert_appointment(conn, &fixtures::appointment(cin, "P1", "2025-03-14T09:30")).unwrap()
    }

    #[test]
    fn renamed_cin_carries_appointments() {
        let conn = open_memory_database().unwrap();
        let id = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        let rdv = book(&conn, "A1");

        update_patient(&conn, id, &fixtures::patient("A9", "Dupont", "Jean", None)).unwrap();
        assert_eq!(get_appointment(&conn, rdv).unwrap().unwrap().patient_cin, "A9");

        delete_patient(&conn, id).unwrap();
        assert!(get_appointment(&conn, rdv).unwrap().is_none());
    }

    #[test]
    fn shared_cin_stays_with_remaining_holder() {
        let conn = open_memory_database().unwrap();
        let first = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        insert_patient(&conn, &fixtures::patient("A1", "Dupond", "Hélène", None)).unwrap();
        let rdv = book(&conn, "A1");

        update_patient(&conn, first, &fixtures::patient("A9", "Dupont", "Jean", None)).unwrap();
        assert_eq!(get_appointment(&conn, rdv).unwrap().unwrap().patient_cin, "A1");
    }

    #[test]
    fn clearing_cin_with_appointments_is_refused() {
        let conn = open_memory_database().unwrap();
        let id = insert_patient(&conn, &fixtures::patient("A1", "Dupont", "Jean", None)).unwrap();
        let rdv = book(&conn, "A1");

        let mut cleared = fixtures::patient("A1", "Dupont", "Jean", None);
        cleared.national_id = None;
        let err = update_patient(&conn, id, &cleared).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)), "got {err:?}");
        assert_eq!(get_patient(&conn, id).unwrap().unwrap().national_id.as_deref(), Some("A1"));
        assert_eq!(get_appointment(&conn, rdv).unwrap().unwrap().patient_cin, "A1");

        let other = insert_patient(&conn, &fixtures::patient("B2", "Lefèvre", "Hélène", None)).unwrap();
        let mut no_id = fixtures::patient("B2", "Lefèvre", "Hélène", None);
        no_id.national_id = None;
        update_patient(&conn, other, &no_id).unwrap();
    }
}
