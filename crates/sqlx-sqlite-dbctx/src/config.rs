//! Configuration for the SQLite connection factory

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration consumed once to build an [`Engine`](crate::Engine)
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_dbctx::EngineConfig;
///
/// // Point at a database file, keep everything else default
/// let config = EngineConfig::new("awesome.db");
///
/// // Override single fields
/// let config = EngineConfig {
///    busy_timeout_secs: 10,
///    ..EngineConfig::new("awesome.db")
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
   /// Path to the database file, or `:memory:`
   ///
   /// Default: `awesome.db`
   pub database: PathBuf,

   /// Create the database file on first connect if it does not exist
   ///
   /// Default: true
   pub create_if_missing: bool,

   /// How long a statement waits on a locked database before failing (in seconds)
   ///
   /// Default: 5
   pub busy_timeout_secs: u64,

   /// Open connections in WAL journal mode with `synchronous = NORMAL`
   ///
   /// WAL lets readers in one context proceed while another context holds an
   /// open write transaction.
   ///
   /// Default: true
   pub journal_mode_wal: bool,

   /// Driver-specific overrides applied as `PRAGMA key = value` on every new connection
   pub pragmas: IndexMap<String, String>,

   /// Accepted for compatibility with server-style configuration; unused by SQLite
   pub user: Option<String>,

   /// Accepted for compatibility with server-style configuration; unused by SQLite
   pub password: Option<String>,

   /// Accepted for compatibility with server-style configuration; unused by SQLite
   pub host: Option<String>,

   /// Accepted for compatibility with server-style configuration; unused by SQLite
   pub port: Option<u16>,
}

impl EngineConfig {
   /// Default configuration for the database at `database`
   pub fn new(database: impl Into<PathBuf>) -> Self {
      Self {
         database: database.into(),
         ..Default::default()
      }
   }

   pub(crate) fn connect_options(&self) -> SqliteConnectOptions {
      let mut options = SqliteConnectOptions::new()
         .filename(&self.database)
         .create_if_missing(self.create_if_missing)
         .busy_timeout(Duration::from_secs(self.busy_timeout_secs));

      if self.journal_mode_wal {
         // https://www.sqlite.org/wal.html#performance_considerations
         options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
      }

      options
   }
}

impl Default for EngineConfig {
   fn default() -> Self {
      Self {
         database: PathBuf::from("awesome.db"),
         create_if_missing: true,
         busy_timeout_secs: 5,
         journal_mode_wal: true,
         pragmas: IndexMap::new(),
         user: None,
         password: None,
         host: None,
         port: None,
      }
   }
}
