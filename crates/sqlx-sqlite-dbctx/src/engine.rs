//! Connection factory and the process-wide engine slot

use crate::Result;
use crate::config::EngineConfig;
use crate::error::Error;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::info;

static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

/// Connection factory for SQLite databases.
///
/// An engine never holds connections itself. Every call to [`Engine::connect`]
/// opens a new, independent connection which the caller owns; execution contexts
/// use this to give each logical thread its own connection.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_dbctx::{Engine, EngineConfig};
///
/// # async fn example() -> Result<(), sqlx_sqlite_dbctx::Error> {
/// let engine = Engine::new(EngineConfig::new("blog.db"));
/// let (id, conn) = engine.connect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Engine {
   config: EngineConfig,

   /// Options derived from `config` once, cloned for every new connection
   options: SqliteConnectOptions,

   /// Number of connections opened so far, also used as connection ids in logs
   opened: AtomicU64,
}

impl Engine {
   /// Build a connection factory from `config`
   ///
   /// No connection is opened here; failures surface on the first `connect`.
   pub fn new(config: EngineConfig) -> Self {
      let options = config.connect_options();
      Self {
         config,
         options,
         opened: AtomicU64::new(0),
      }
   }

   /// The configuration this engine was built from
   pub fn config(&self) -> &EngineConfig {
      &self.config
   }

   /// Number of connections this engine has opened
   pub fn connections_opened(&self) -> u64 {
      self.opened.load(Ordering::SeqCst)
   }

   /// Open a new connection, returning it together with its log id
   pub async fn connect(&self) -> Result<(u64, SqliteConnection)> {
      let mut conn = self.options.connect().await?;

      for (key, value) in &self.config.pragmas {
         sqlx::query(&format!("PRAGMA {} = {}", key, value))
            .execute(&mut conn)
            .await?;
      }

      let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
      info!("open connection <{}>...", id);
      Ok((id, conn))
   }
}

/// Install the process-wide engine.
///
/// Must be called exactly once, before any context is created with
/// [`DbContext::global`](crate::DbContext::global). A second call fails with
/// [`Error::EngineAlreadyInitialized`] and leaves the installed engine untouched.
pub fn create_engine(config: EngineConfig) -> Result<Arc<Engine>> {
   let engine = Arc::new(Engine::new(config));
   ENGINE
      .set(Arc::clone(&engine))
      .map_err(|_| Error::EngineAlreadyInitialized)?;

   info!(
      "init sqlite engine for {} ok.",
      engine.config().database.display()
   );
   Ok(engine)
}

/// The process-wide engine installed by [`create_engine`]
pub fn engine() -> Result<Arc<Engine>> {
   ENGINE.get().cloned().ok_or(Error::EngineNotInitialized)
}
