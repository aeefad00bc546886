//! Staff and admin accounts.
//!
//! Staff register themselves and stay pending until an admin approves
//! them. Admins are created directly, up to a configured cap. Password
//! hashing never runs while the store lock is held.

use thiserror::Error;

use crate::config::AppConfig;
use crate::crypto::{hash_password, verify_password, PasswordError};
use crate::db::repository as repo;
use crate::db::{DatabaseError, Store};
use crate::models::{Admin, CredentialsInput, User};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Email et mot de passe requis")]
    MissingFields,

    #[error("Utilisateur déjà existant")]
    AlreadyRegistered,

    #[error("Utilisateur non trouvé")]
    UnknownUser,

    #[error("Compte en attente de validation")]
    PendingApproval,

    #[error("Mot de passe incorrect")]
    WrongPassword,

    #[error("Admin non trouvé")]
    UnknownAdmin,

    #[error("Nombre maximum d'administrateurs atteint ({0})")]
    AdminCapReached(i64),

    #[error("Cet email existe déjà.")]
    AdminExists,

    #[error("Password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Trimmed email and raw password; both must be present.
fn credentials(input: &CredentialsInput) -> Result<(String, &str), AccountError> {
    let email = input.email.trim();
    if email.is_empty() || input.password.is_empty() {
        return Err(AccountError::MissingFields);
    }
    Ok((email.to_string(), input.password.as_str()))
}

// ─── Staff users ──────────────────────────────────────────────────────────────

/// Create a pending staff account.
pub fn register(
    store: &Store,
    config: &AppConfig,
    input: &CredentialsInput,
) -> Result<User, AccountError> {
    let (email, password) = credentials(input)?;
    let hash = hash_password(password, config.password_iterations)?;

    let conn = store.lock()?;
    let id = repo::insert_user(&conn, &email, &hash).map_err(|e| match e {
        DatabaseError::Conflict(_) => AccountError::AlreadyRegistered,
        other => other.into(),
    })?;

    tracing::info!(user_id = id, "Staff account registered, awaiting approval");
    Ok(User {
        id,
        email,
        is_approved: false,
    })
}

/// Log a staff user in. Unknown email and wrong password are both
/// rejected; a known but unapproved account is reported as pending.
pub fn login(store: &Store, input: &CredentialsInput) -> Result<User, AccountError> {
    let email = input.email.trim();
    let found = {
        let conn = store.lock()?;
        repo::find_user_by_email(&conn, email)?
    };
    let creds = found.ok_or(AccountError::UnknownUser)?;
    if !creds.account.is_approved {
        return Err(AccountError::PendingApproval);
    }
    if !verify_password(&input.password, &creds.password_hash)? {
        tracing::warn!(user_id = creds.account.id, "Staff login with wrong password");
        return Err(AccountError::WrongPassword);
    }
    Ok(creds.account)
}

pub fn approve(store: &Store, id: i64) -> Result<(), AccountError> {
    let conn = store.lock()?;
    repo::approve_user(&conn, id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => AccountError::UnknownUser,
        other => other.into(),
    })?;
    tracing::info!(user_id = id, "Staff account approved");
    Ok(())
}

pub fn remove_user(store: &Store, id: i64) -> Result<(), AccountError> {
    let conn = store.lock()?;
    repo::delete_user(&conn, id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => AccountError::UnknownUser,
        other => other.into(),
    })
}

// ─── Admins ───────────────────────────────────────────────────────────────────

fn check_admin_slot(conn: &rusqlite::Connection, email: &str, cap: i64) -> Result<(), AccountError> {
    if repo::count_admins(conn)? >= cap {
        return Err(AccountError::AdminCapReached(cap));
    }
    if repo::find_admin_by_email(conn, email)?.is_some() {
        return Err(AccountError::AdminExists);
    }
    Ok(())
}

/// Create an admin while fewer than `max_admins` exist.
pub fn create_admin(
    store: &Store,
    config: &AppConfig,
    input: &CredentialsInput,
) -> Result<Admin, AccountError> {
    let (email, password) = credentials(input)?;

    // Checked again under the lock that covers the insert.
    check_admin_slot(&*store.lock()?, &email, config.max_admins)?;
    let hash = hash_password(password, config.password_iterations)?;

    let conn = store.lock()?;
    check_admin_slot(&conn, &email, config.max_admins)?;
    let id = repo::insert_admin(&conn, &email, &hash).map_err(|e| match e {
        DatabaseError::Conflict(_) => AccountError::AdminExists,
        other => other.into(),
    })?;

    tracing::info!(admin_id = id, "Admin account created");
    Ok(Admin { id, email })
}

pub fn admin_login(store: &Store, input: &CredentialsInput) -> Result<Admin, AccountError> {
    let email = input.email.trim();
    let found = {
        let conn = store.lock()?;
        repo::find_admin_by_email(&conn, email)?
    };
    let creds = found.ok_or(AccountError::UnknownAdmin)?;
    if !verify_password(&input.password, &creds.password_hash)? {
        tracing::warn!(admin_id = creds.account.id, "Admin login with wrong password");
        return Err(AccountError::WrongPassword);
    }
    Ok(creds.account)
}

pub fn remove_admin(store: &Store, id: i64) -> Result<(), AccountError> {
    let conn = store.lock()?;
    repo::delete_admin(&conn, id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => AccountError::UnknownAdmin,
        other => other.into(),
    })
}
