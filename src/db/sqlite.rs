use std::path::Path;
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension};

use super::DatabaseError;
use crate::text::fold_text;

/// Ordered schema scripts. Each one records its own version row.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../resources/migrations/001_initial.sql")),
    (2, include_str!("../../resources/migrations/002_patient_cin_updates.sql")),
];

/// Writers queue behind the store mutex; this only covers outside tools
/// holding the file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the clinic database file and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    prepare(Connection::open(path)?)
}

/// Fresh in-memory database with the full schema.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, DatabaseError> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // Cascades and reference checks depend on this; SQLite ships with it off.
    conn.pragma_update(None, "foreign_keys", true)?;
    register_fold(&conn)?;
    migrate(&conn)?;
    Ok(conn)
}

/// `fold(text)` lowercases and strips diacritics, so SQL search matches
/// exactly what the in-memory filters match.
fn register_fold(conn: &Connection) -> Result<(), DatabaseError> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|s| fold_text(&s)))
        },
    )?;
    Ok(())
}

/// Apply every script newer than the recorded version.
pub fn migrate(conn: &Connection) -> Result<(), DatabaseError> {
    let applied = schema_version(conn)?;
    for &(version, script) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
        tracing::info!(version, "Applying schema migration");
        conn.execute_batch(script)
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
    }
    Ok(())
}

/// Highest applied migration, 0 for an empty database.
pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(0);
    }
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn schema_has_clinic_tables() {
        let conn = open_memory_database().unwrap();
        assert_eq!(
            table_names(&conn),
            [
                "admins",
                "appointments",
                "consultations",
                "exams",
                "patients",
                "practitioners",
                "prescriptions",
                "schema_version",
                "users",
            ]
        );
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn empty_database_is_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn migrating_twice_is_harmless() {
        let conn = open_memory_database().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn version_one_database_is_upgraded() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0].1).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        let triggers: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'trigger' AND name LIKE 'patients_cin_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(triggers, 2);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = open_memory_database().unwrap();
        let on: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(on);
    }

    #[test]
    fn fold_strips_case_and_accents() {
        let conn = open_memory_database().unwrap();
        let folded: String = conn
            .query_row("SELECT fold('Élodie MÜLLER')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "elodie muller");
        let null: Option<String> = conn
            .query_row("SELECT fold(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }

    #[test]
    fn file_database_creates_parent_dirs_and_reopens() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("clinic.db");
        {
            let conn = open_database(&path).unwrap();
            conn.execute(
                "INSERT INTO practitioners (cin_practitioner, last_name, first_name) VALUES ('P1', 'M', 'L')",
                [],
            )
            .unwrap();
        }
        assert!(path.exists());
        let conn = open_database(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM practitioners", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
