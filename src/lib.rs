//! # quillpress
//!
//! A minimal blog stack on SQLite.
//!
//! - [`sqlx_sqlite_dbctx`]: per-task execution contexts with nestable connection and
//!   transaction scopes, plus the select/update/insert helpers
//! - [`sqlx_sqlite_orm`]: declarative table mappings and active-record entities
//! - this crate: application configuration, the blog [`Models`] and the path [`Router`]
//!
//! ## Usage
//!
//! ```no_run
//! use quillpress::{AppConfig, Dispatch, Method, Router};
//! use sqlx_sqlite_dbctx::DbContext;
//! use serde_json::json;
//!
//! # async fn example() -> quillpress::Result<()> {
//! let config = AppConfig::with_overrides(json!({ "db": { "database": "blog.db" } }))?;
//! let models = quillpress::init(&config)?;
//!
//! let mut ctx = DbContext::global()?;
//! models.create_schema(&mut ctx).await?;
//!
//! let mut router = Router::new();
//! router
//!    .get("/", |_| "index".to_string())?
//!    .get("/blog/:id", |args| format!("blog {}", args[0]))?
//!    .serve_static("/static/", "www/static");
//!
//! match router.dispatch(Method::Get, "/static/css/site.css") {
//!    Dispatch::StaticFile(path) => println!("serve {}", path.display()),
//!    Dispatch::Handled(body) => println!("{}", body),
//!    Dispatch::NotFound => println!("404"),
//! }
//! # Ok(())
//! # }
//! ```
use tracing::info;

mod config;
mod error;
mod models;
mod router;

pub use config::{AppConfig, SessionConfig};
pub use error::{Error, Result};
pub use models::{Models, unix_time};
pub use router::{Dispatch, Handler, Method, Route, Router};

/// Install the process-wide engine from `config` and define the blog models.
///
/// Fails with [`sqlx_sqlite_dbctx::Error::EngineAlreadyInitialized`] when called twice.
pub fn init(config: &AppConfig) -> Result<Models> {
   info!("Init database engine: {}", config.db.database.display());
   sqlx_sqlite_dbctx::create_engine(config.db.clone())?;
   Models::define()
}
