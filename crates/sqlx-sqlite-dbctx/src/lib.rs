//! # sqlx-sqlite-dbctx
//!
//! Per-task execution contexts for SQLite on top of SQLx.
//!
//! ## Core Types
//!
//! - **[`Engine`]**: Connection factory built from an [`EngineConfig`]; one process-wide
//!   instance can be installed with [`create_engine`]
//! - **[`DbContext`]**: Owns one lazily-opened connection and the transaction depth for a
//!   single logical thread of execution
//! - **[`ConnectionScope`]** / **[`TransactionScope`]**: Tokens returned when entering a scope
//! - **[`Record`]**: Ordered column/attribute map returned by the select helpers
//! - **[`Error`]**: Error type for context and query operations
//!
//! ## Scopes
//!
//! - **Connection scopes** nest; only the outermost one closes the connection
//! - **Transaction scopes** nest; only the outermost one commits or rolls back
//! - **Lazy connections**: nothing touches the database until the first statement runs
//!
//! ## Usage
//!
//! ```no_run
//! use serde_json::json;
//! use sqlx_sqlite_dbctx::{DbContext, Engine, EngineConfig, Error};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Error> {
//! let engine = Arc::new(Engine::new(EngineConfig::new("blog.db")));
//! let mut ctx = DbContext::new(engine);
//!
//! ctx.update("CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY, name TEXT)", vec![])
//!    .await?;
//!
//! ctx.transaction(async |ctx| {
//!    ctx.update("INSERT INTO t (name) VALUES (?)", vec![json!("Alice")]).await?;
//!    ctx.update("INSERT INTO t (name) VALUES (?)", vec![json!("Bob")]).await?;
//!    Ok::<_, Error>(())
//! })
//! .await?;
//!
//! let total = ctx.select_int("SELECT COUNT(*) FROM t", vec![]).await?;
//! assert_eq!(total, Some(2));
//! # Ok(())
//! # }
//! ```
mod config;
mod context;
mod decode;
mod engine;
mod error;
mod execute;
mod id;
mod record;

pub use config::EngineConfig;
pub use context::{ConnectionScope, DbContext, TransactionScope};
pub use decode::{bind_value, to_json};
pub use engine::{Engine, create_engine, engine};
pub use error::Error;
pub use execute::rewrite_placeholders;
pub use id::{next_id, next_id_at};
pub use record::Record;

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
