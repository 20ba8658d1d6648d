//! # sqlx-sqlite-orm
//!
//! Declarative table mappings and active-record style entities, executed
//! through a [`DbContext`](sqlx_sqlite_dbctx::DbContext).
//!
//! ## Core Types
//!
//! - **[`Field`]**: Storage type, column DDL, default and constraints of one attribute
//! - **[`Mapping`]**: Table name, ordered fields, primary key and lifecycle hooks of an
//!   entity type, built once with [`Mapping::builder`] and registered by type name
//! - **[`Entity`]**: A [`Record`](sqlx_sqlite_dbctx::Record) paired with its mapping, with
//!   `insert`, `update` and `delete`
//!
//! Finders (`get`, `find_first`, `find_by`, `find_all`, `count_all`, `count_by`) live on
//! `Arc<Mapping>`.
//!
//! ## Usage
//!
//! ```no_run
//! use serde_json::json;
//! use sqlx_sqlite_dbctx::{DbContext, Engine, EngineConfig};
//! use sqlx_sqlite_orm::{Entity, Field, Mapping};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), sqlx_sqlite_orm::Error> {
//! let user = Mapping::builder("User")
//!    .field("id", Field::integer().primary_key())
//!    .field("name", Field::string())
//!    .field("email", Field::string().updatable(false))
//!    .field("passwd", Field::string().default("******"))
//!    .build()?;
//!
//! let mut ctx = DbContext::new(Arc::new(Engine::new(EngineConfig::new("orm.db"))));
//! ctx.update(user.create_table_sql(), vec![]).await?;
//!
//! let mut u = Entity::new(&user);
//! u.set("id", 10190).set("name", "Michael").set("email", "orm@db.org");
//! u.insert(&mut ctx).await?;
//! assert_eq!(u["passwd"], json!("******"));
//!
//! let loaded = user.get(&mut ctx, 10190).await?.expect("inserted above");
//! assert_eq!(loaded["name"], json!("Michael"));
//! # Ok(())
//! # }
//! ```
mod entity;
mod error;
mod field;
mod mapping;
mod registry;

pub use entity::Entity;
pub use error::Error;
pub use field::{Field, FieldDefault, FieldType};
pub use mapping::{Hook, Mapping, MappingBuilder};
pub use registry::{lookup, registered};

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
