//! Aggregation and exports over a loaded snapshot of the clinic.

pub mod pdf;
pub mod read_model;
pub mod search;
pub mod spreadsheet;
pub mod stats;

pub use read_model::{ClinicSnapshot, VisitView, UNKNOWN_PERSON};
pub use stats::*;

use thiserror::Error;

use crate::db::DatabaseError;

/// Currency shown next to amounts in documents.
pub const CURRENCY: &str = "Ar";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Aucune donnée à exporter")]
    NothingToExport,

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// A rendered export, ready to be served as a download.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf",
            bytes,
        }
    }

    pub fn csv(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "text/csv; charset=utf-8",
            bytes,
        }
    }
}
