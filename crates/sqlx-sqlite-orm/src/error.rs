//! Error types for sqlx-sqlite-orm

use thiserror::Error;

/// Errors raised while defining mappings or running entity operations
#[derive(Error, Debug)]
pub enum Error {
   /// Error from the execution context or the driver underneath it
   #[error(transparent)]
   Database(#[from] sqlx_sqlite_dbctx::Error),

   /// The entity type declares no primary field
   #[error("primary key not found for {0}")]
   MissingPrimaryKey(String),

   /// The entity type declares more than one primary field
   #[error("duplicate primary key for {0}")]
   DuplicatePrimaryKey(String),

   /// Two attributes of one entity type share a name or a column
   #[error("duplicate field '{field}' in {model}")]
   DuplicateField { model: String, field: String },
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Database(e) => e.error_code(),
         Error::MissingPrimaryKey(_) => "MISSING_PRIMARY_KEY".to_string(),
         Error::DuplicatePrimaryKey(_) => "DUPLICATE_PRIMARY_KEY".to_string(),
         Error::DuplicateField { .. } => "DUPLICATE_FIELD".to_string(),
      }
   }
}
