//! Error types for sqlx-sqlite-dbctx

use thiserror::Error;

/// Errors that may occur when working with execution contexts and the query helpers
#[derive(Error, Debug)]
pub enum Error {
   /// Error from the sqlx library. Driver failures are propagated verbatim through this variant
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// `create_engine` was called after the process-wide engine was already installed
   #[error("engine is already initialized")]
   EngineAlreadyInitialized,

   /// The process-wide engine was requested before `create_engine` was called
   #[error("engine is not initialized")]
   EngineNotInitialized,

   /// A scalar query returned a row that does not have exactly one column
   #[error("scalar query returned {0} columns, expected exactly 1")]
   MultipleColumns(usize),

   /// A scalar value could not be read as an integer
   #[error("scalar value is not an integer: {0}")]
   NotAnInteger(serde_json::Value),

   /// Named access to an attribute that the record does not hold
   #[error("record has no attribute '{0}'")]
   AttributeNotFound(String),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// A statement was issued on a context that has no connection handle
   #[error("no connection context is active")]
   ContextNotInitialized,
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::EngineAlreadyInitialized => "ENGINE_ALREADY_INITIALIZED".to_string(),
         Error::EngineNotInitialized => "ENGINE_NOT_INITIALIZED".to_string(),
         Error::MultipleColumns(_) => "MULTIPLE_COLUMNS".to_string(),
         Error::NotAnInteger(_) => "NOT_AN_INTEGER".to_string(),
         Error::AttributeNotFound(_) => "ATTRIBUTE_NOT_FOUND".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::ContextNotInitialized => "CONTEXT_NOT_INITIALIZED".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_multiple_columns() {
      let err = Error::MultipleColumns(3);
      assert_eq!(err.error_code(), "MULTIPLE_COLUMNS");
      assert!(err.to_string().contains("3 columns"));
   }

   #[test]
   fn test_error_code_attribute_not_found() {
      let err = Error::AttributeNotFound("email".into());
      assert_eq!(err.error_code(), "ATTRIBUTE_NOT_FOUND");
      assert_eq!(err.to_string(), "record has no attribute 'email'");
   }

   #[test]
   fn test_error_code_engine_state() {
      assert_eq!(
         Error::EngineAlreadyInitialized.error_code(),
         "ENGINE_ALREADY_INITIALIZED"
      );
      assert_eq!(
         Error::EngineNotInitialized.error_code(),
         "ENGINE_NOT_INITIALIZED"
      );
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no SQLite code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }
}
