pub mod sqlite;
pub mod repository;
pub mod store;

pub use sqlite::*;
pub use repository::*;
pub use store::Store;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store is still shared and cannot be closed")]
    StillShared,

    #[error("Database file error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatabaseError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        DatabaseError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

/// Classify SQLite constraint failures so callers can tell a duplicate
/// from a dangling reference from a plain store error.
impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| err.to_string());
                return match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => DatabaseError::Conflict(detail),
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        DatabaseError::UnknownReference(detail)
                    }
                    _ => DatabaseError::ConstraintViolation(detail),
                };
            }
        }
        DatabaseError::Sqlite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO admins (email, password_hash) VALUES ('a@x.io', 'h')",
            [],
        )
        .unwrap();
        let err: DatabaseError = conn
            .execute(
                "INSERT INTO admins (email, password_hash) VALUES ('a@x.io', 'h')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn foreign_key_violation_maps_to_unknown_reference() {
        let conn = open_memory_database().unwrap();
        let err: DatabaseError = conn
            .execute(
                "INSERT INTO prescriptions (consultation_id, treatment, dosage) VALUES (?1, 'x', 'y')",
                params![999],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::UnknownReference(_)), "got {err:?}");
    }

    #[test]
    fn not_null_violation_maps_to_constraint() {
        let conn = open_memory_database().unwrap();
        let err: DatabaseError = conn
            .execute(
                "INSERT INTO patients (first_name, last_name, age) VALUES (NULL, 'x', 1)",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)), "got {err:?}");
    }
}
