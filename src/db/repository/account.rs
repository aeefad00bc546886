use rusqlite::{params, Connection, OptionalExtension, Row};

use super::expect_changed;
use crate::db::DatabaseError;
use crate::models::*;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        is_approved: row.get(2)?,
    })
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        email: row.get(1)?,
    })
}

// --- users ---

/// New users start unapproved.
pub fn insert_user(conn: &Connection, email: &str, password_hash: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (email, password_hash, is_approved) VALUES (?1, ?2, 0)",
        params![email, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Credentials<User>>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, email, is_approved, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(Credentials {
                    account: user_from_row(row)?,
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()?)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, email, is_approved FROM users ORDER BY id")?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_pending_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, email, is_approved FROM users WHERE is_approved = 0 ORDER BY id")?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn approve_user(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("UPDATE users SET is_approved = 1 WHERE id = ?1", params![id])?;
    expect_changed(changed, "User", id)
}

pub fn delete_user(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    expect_changed(changed, "User", id)
}

// --- admins ---

pub fn insert_admin(conn: &Connection, email: &str, password_hash: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO admins (email, password_hash) VALUES (?1, ?2)",
        params![email, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_admins(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?)
}

pub fn find_admin_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Credentials<Admin>>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, email, password_hash FROM admins WHERE email = ?1",
            params![email],
            |row| {
                Ok(Credentials {
                    account: admin_from_row(row)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?)
}

pub fn list_admins(conn: &Connection) -> Result<Vec<Admin>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, email FROM admins ORDER BY id")?;
    let rows = stmt.query_map([], admin_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_admin(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM admins WHERE id = ?1", params![id])?;
    expect_changed(changed, "Admin", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn users_start_pending_until_approved() {
        let conn = open_memory_database().unwrap();
        let id = insert_user(&conn, "a@clinic.test", "hash").unwrap();
        assert_eq!(list_pending_users(&conn).unwrap().len(), 1);

        approve_user(&conn, id).unwrap();
        assert!(list_pending_users(&conn).unwrap().is_empty());
        let stored = find_user_by_email(&conn, "a@clinic.test").unwrap().unwrap();
        assert!(stored.account.is_approved);
        assert_eq!(stored.password_hash, "hash");
    }

    #[test]
    fn duplicate_email_conflicts() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, "a@clinic.test", "h").unwrap();
        assert!(matches!(insert_user(&conn, "a@clinic.test", "h"), Err(DatabaseError::Conflict(_))));
    }

    #[test]
    fn missing_accounts_are_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(approve_user(&conn, 3), Err(DatabaseError::NotFound { .. })));
        assert!(matches!(delete_user(&conn, 3), Err(DatabaseError::NotFound { .. })));
        assert!(matches!(delete_admin(&conn, 3), Err(DatabaseError::NotFound { .. })));
        assert!(find_admin_by_email(&conn, "x@clinic.test").unwrap().is_none());
    }

    #[test]
    fn admins_are_counted() {
        let conn = open_memory_database().unwrap();
        insert_admin(&conn, "root@clinic.test", "h").unwrap();
        insert_admin(&conn, "ops@clinic.test", "h").unwrap();
        assert_eq!(count_admins(&conn).unwrap(), 2);
        assert_eq!(list_admins(&conn).unwrap()[1].email, "ops@clinic.test");
    }
}
