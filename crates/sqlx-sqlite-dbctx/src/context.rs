//! Execution contexts: one lazily-opened connection plus transaction depth per logical thread

use std::sync::Arc;
use std::time::Instant;

use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;
use tracing::{error, info, warn};

use crate::engine::{Engine, engine};
use crate::error::Error;
use crate::execute::profile;
use crate::Result;

/// Connection handle that opens on the first cursor request.
///
/// States: unopened (`conn` is `None`), open, and closed once [`cleanup`](Self::cleanup)
/// has consumed it. A failed connect leaves it unopened so the next request retries.
struct LazyConnection {
   conn: Option<(u64, SqliteConnection)>,

   /// `BEGIN` has been issued and neither `COMMIT` nor `ROLLBACK` has succeeded yet
   in_transaction: bool,
}

impl LazyConnection {
   fn new() -> Self {
      Self {
         conn: None,
         in_transaction: false,
      }
   }

   fn is_open(&self) -> bool {
      self.conn.is_some()
   }

   /// Return the connection, opening it first if needed.
   ///
   /// When `transactional` is set and no transaction is open yet, `BEGIN IMMEDIATE`
   /// is issued before the connection is handed out.
   async fn cursor(&mut self, engine: &Engine, transactional: bool) -> Result<&mut SqliteConnection> {
      if self.conn.is_none() {
         self.conn = Some(engine.connect().await?);
      }

      let Some((_, conn)) = self.conn.as_mut() else {
         return Err(Error::ContextNotInitialized);
      };

      if transactional && !self.in_transaction {
         sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
         self.in_transaction = true;
      }

      Ok(conn)
   }

   async fn commit(&mut self) -> Result<()> {
      if let Some((_, conn)) = self.conn.as_mut()
         && self.in_transaction
      {
         sqlx::query("COMMIT").execute(&mut *conn).await?;
         self.in_transaction = false;
      }
      Ok(())
   }

   async fn rollback(&mut self) -> Result<()> {
      if let Some((_, conn)) = self.conn.as_mut()
         && self.in_transaction
      {
         // SQLite may already have rolled back on its own after some errors;
         // either way the transaction is gone once this returns.
         self.in_transaction = false;
         sqlx::query("ROLLBACK").execute(&mut *conn).await?;
      }
      Ok(())
   }

   async fn cleanup(self) {
      if let Some((id, conn)) = self.conn {
         info!("close connection <{}>...", id);
         if let Err(e) = conn.close().await {
            warn!("failed to close connection <{}>: {}", id, e);
         }
      }
   }
}

/// Token for an entered connection scope; hand it back to [`DbContext::release`]
#[must_use = "a connection scope must be released with DbContext::release"]
#[derive(Debug)]
pub struct ConnectionScope {
   should_cleanup: bool,
}

/// Token for an entered transaction scope; hand it back to [`DbContext::finish`]
#[must_use = "a transaction scope must be finished with DbContext::finish"]
#[derive(Debug)]
pub struct TransactionScope {
   should_close_conn: bool,
}

/// Per-logical-thread execution context.
///
/// A context owns at most one connection and counts how deeply transaction
/// scopes are nested. Give every task (or thread) its own context; contexts are
/// never shared, so no locking happens between them.
///
/// Scopes come in two flavours, both re-entrant:
///
/// - **Connection scopes** ([`connection`](Self::connection) /
///   [`with_connection`](Self::with_connection)) keep one connection alive across
///   several statements. Only the outermost scope closes it.
/// - **Transaction scopes** ([`begin`](Self::begin) /
///   [`transaction`](Self::transaction)) group statements atomically. Inner scopes
///   join the outer transaction; only the outermost one commits or rolls back.
///
/// Every query helper enters a connection scope on its own when called outside
/// of one, so a bare `ctx.update(...)` opens, uses and closes a connection.
///
/// A scope that is abandoned (for instance a cancelled future) is never exited;
/// the context keeps its connection until it is dropped.
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use sqlx_sqlite_dbctx::{DbContext, Engine, EngineConfig, Error};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Error> {
/// let mut ctx = DbContext::new(Arc::new(Engine::new(EngineConfig::new("blog.db"))));
///
/// ctx.transaction(async |ctx| {
///    ctx.update("UPDATE blogs SET name = ? WHERE id = ?", vec![json!("new"), json!("1")])
///       .await?;
///
///    // Joins the outer transaction; commits nothing on its own
///    ctx.transaction(async |ctx| {
///       ctx.update("DELETE FROM comments WHERE blog_id = ?", vec![json!("1")]).await
///    })
///    .await?;
///
///    Ok::<_, Error>(())
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub struct DbContext {
   engine: Arc<Engine>,
   connection: Option<LazyConnection>,
   transactions: usize,
}

impl DbContext {
   /// Create an empty context on `engine`
   pub fn new(engine: Arc<Engine>) -> Self {
      Self {
         engine,
         connection: None,
         transactions: 0,
      }
   }

   /// Create an empty context on the process-wide engine
   pub fn global() -> Result<Self> {
      Ok(Self::new(engine()?))
   }

   pub fn engine(&self) -> &Arc<Engine> {
      &self.engine
   }

   /// A connection handle exists (a scope is active)
   pub fn is_init(&self) -> bool {
      self.connection.is_some()
   }

   /// A physical connection is currently open
   pub fn is_connected(&self) -> bool {
      self.connection.as_ref().is_some_and(LazyConnection::is_open)
   }

   /// Number of transaction scopes currently entered
   pub fn transaction_depth(&self) -> usize {
      self.transactions
   }

   fn init(&mut self) {
      self.connection = Some(LazyConnection::new());
      self.transactions = 0;
   }

   async fn cleanup(&mut self) {
      if let Some(connection) = self.connection.take() {
         connection.cleanup().await;
      }
      self.transactions = 0;
   }

   /// Hand out the connection for a statement, opening it (and the pending
   /// transaction) on first use.
   pub(crate) async fn cursor(&mut self) -> Result<&mut SqliteConnection> {
      let transactional = self.transactions > 0;
      let engine = &self.engine;
      let connection = self
         .connection
         .as_mut()
         .ok_or(Error::ContextNotInitialized)?;
      connection.cursor(engine, transactional).await
   }

   /// Enter a connection scope.
   ///
   /// Nothing is opened yet; the connection is created by the first statement.
   pub fn connection(&mut self) -> ConnectionScope {
      let should_cleanup = !self.is_init();
      if should_cleanup {
         self.init();
      }
      ConnectionScope { should_cleanup }
   }

   /// Leave a connection scope, closing the connection if the scope opened the context
   pub async fn release(&mut self, scope: ConnectionScope) {
      if scope.should_cleanup {
         self.cleanup().await;
      }
   }

   /// Run `f` inside a connection scope
   pub async fn with_connection<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
   where
      F: AsyncFnOnce(&mut DbContext) -> std::result::Result<T, E>,
   {
      let scope = self.connection();
      let result = f(&mut *self).await;
      self.release(scope).await;
      result
   }

   /// Enter a transaction scope.
   ///
   /// The outermost scope logs `begin transaction`; nested ones join it.
   pub fn begin(&mut self) -> TransactionScope {
      let should_close_conn = !self.is_init();
      if should_close_conn {
         self.init();
      }

      self.transactions += 1;
      if self.transactions == 1 {
         info!("begin transaction...");
      } else {
         info!("join current transaction...");
      }

      TransactionScope { should_close_conn }
   }

   /// Leave a transaction scope with the outcome of its body.
   ///
   /// When this is the outermost scope, an `Ok` outcome is committed and an `Err`
   /// outcome is rolled back and returned unchanged. A failed commit is rolled back
   /// and the commit error is returned. Inner scopes return `outcome` as is.
   pub async fn finish<T, E>(
      &mut self,
      scope: TransactionScope,
      outcome: std::result::Result<T, E>,
   ) -> std::result::Result<T, E>
   where
      E: From<Error>,
   {
      self.transactions = self.transactions.saturating_sub(1);

      let result = if self.transactions == 0 {
         match outcome {
            Ok(value) => self.commit().await.map(|()| value).map_err(E::from),
            Err(e) => {
               if let Err(rollback_err) = self.rollback().await {
                  error!("rollback failed: {}", rollback_err);
               }
               Err(e)
            }
         }
      } else {
         outcome
      };

      if scope.should_close_conn {
         self.cleanup().await;
      }

      result
   }

   /// Run `f` inside a transaction scope
   pub async fn transaction<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
   where
      E: From<Error>,
      F: AsyncFnOnce(&mut DbContext) -> std::result::Result<T, E>,
   {
      let start = Instant::now();
      let scope = self.begin();
      let outcome = f(&mut *self).await;
      let result = self.finish(scope, outcome).await;
      profile(start, "<transaction>");
      result
   }

   async fn commit(&mut self) -> Result<()> {
      let Some(connection) = self.connection.as_mut() else {
         return Ok(());
      };

      info!("commit transaction...");
      match connection.commit().await {
         Ok(()) => {
            info!("commit ok.");
            Ok(())
         }
         Err(e) => {
            warn!("commit failed: {}. try rollback...", e);
            match connection.rollback().await {
               Ok(()) => warn!("rollback ok."),
               Err(rollback_err) => error!("rollback after failed commit failed: {}", rollback_err),
            }
            Err(e)
         }
      }
   }

   async fn rollback(&mut self) -> Result<()> {
      let Some(connection) = self.connection.as_mut() else {
         return Ok(());
      };

      warn!("rollback transaction...");
      connection.rollback().await?;
      warn!("rollback ok.");
      Ok(())
   }
}

impl std::fmt::Debug for DbContext {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("DbContext")
         .field("initialized", &self.is_init())
         .field("connected", &self.is_connected())
         .field("transactions", &self.transactions)
         .finish()
   }
}
