/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the blog application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from an execution context or the driver.
   #[error(transparent)]
   Database(#[from] sqlx_sqlite_dbctx::Error),

   /// Error from a model definition or entity operation.
   #[error(transparent)]
   Orm(#[from] sqlx_sqlite_orm::Error),

   /// A route path could not be compiled into a matcher.
   #[error("invalid route {path}: {reason}")]
   InvalidRoute { path: String, reason: String },

   /// Configuration overrides could not be applied.
   #[error("invalid configuration: {0}")]
   Config(#[from] serde_json::Error),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for client error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Database(e) => e.error_code(),
         Error::Orm(e) => e.error_code(),
         Error::InvalidRoute { .. } => "INVALID_ROUTE".to_string(),
         Error::Config(_) => "INVALID_CONFIG".to_string(),
      }
   }
}
