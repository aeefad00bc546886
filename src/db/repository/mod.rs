//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table. Every function takes a borrowed
//! `Connection`, so callers decide whether it runs inside a transaction.

mod account;
mod appointment;
mod consultation;
mod exam;
mod patient;
mod practitioner;
mod prescription;

use std::str::FromStr;

use super::DatabaseError;
use crate::text::fold_text;

pub use account::*;
pub use appointment::*;
pub use consultation::*;
pub use exam::*;
pub use patient::*;
pub use practitioner::*;
pub use prescription::*;

/// `LIKE` pattern for an accent-insensitive substring search.
/// Pair with `fold(column) LIKE ? ESCAPE '\'`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let folded = fold_text(needle.trim());
    let mut escaped = String::with_capacity(folded.len() + 2);
    escaped.push('%');
    for ch in folded.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Zero affected rows means the target id does not exist.
pub(crate) fn expect_changed(
    changed: usize,
    entity_type: &str,
    id: impl ToString,
) -> Result<(), DatabaseError> {
    if changed == 0 {
        return Err(DatabaseError::not_found(entity_type, id));
    }
    Ok(())
}

/// Parse a stored enum string inside a row mapper.
pub(crate) fn enum_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    T::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
