//! Blog entity types: users, blogs and comments

use std::sync::Arc;

use serde_json::json;
use sqlx_sqlite_dbctx::{DbContext, next_id};
use sqlx_sqlite_orm::{Field, Mapping};
use time::OffsetDateTime;
use tracing::info;

use crate::{Error, Result};

/// Current time as fractional seconds since the unix epoch.
///
/// Timestamps are stored as `real` so they sort and compare without any
/// timezone handling.
pub fn unix_time() -> f64 {
   OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9
}

fn id_field() -> Field {
   Field::string()
      .primary_key()
      .ddl("varchar(50)")
      .default_with(|| json!(next_id()))
}

fn created_at_field() -> Field {
   Field::float()
      .updatable(false)
      .default_with(|| json!(unix_time()))
}

/// Mappings of the blog's entity types
#[derive(Debug, Clone)]
pub struct Models {
   pub user: Arc<Mapping>,
   pub blog: Arc<Mapping>,
   pub comment: Arc<Mapping>,
}

impl Models {
   /// Build and register the `User`, `Blog` and `Comment` mappings
   pub fn define() -> Result<Self> {
      let user = Mapping::builder("User")
         .table("users")
         .field("id", id_field())
         .field("email", Field::string().ddl("varchar(50)").updatable(false))
         .field("password", Field::string().ddl("varchar(50)"))
         .field("admin", Field::boolean())
         .field("name", Field::string().ddl("varchar(50)"))
         .field("image", Field::string().ddl("varchar(500)"))
         .field("created_at", created_at_field())
         .build()?;

      let blog = Mapping::builder("Blog")
         .table("blogs")
         .field("id", id_field())
         .field("user_id", Field::string().ddl("varchar(50)").updatable(false))
         .field("user_name", Field::string().ddl("varchar(50)"))
         .field("user_image", Field::string().ddl("varchar(500)"))
         .field("name", Field::string().ddl("varchar(50)"))
         .field("summary", Field::string().ddl("varchar(200)"))
         .field("content", Field::text())
         .field("created_at", created_at_field())
         .build()?;

      let comment = Mapping::builder("Comment")
         .table("comments")
         .field("id", id_field())
         .field("blog_id", Field::string().ddl("varchar(50)").updatable(false))
         .field("user_id", Field::string().ddl("varchar(50)").updatable(false))
         .field("user_name", Field::string().ddl("varchar(50)"))
         .field("user_image", Field::string().ddl("varchar(500)"))
         .field("content", Field::text())
         .field("created_at", created_at_field())
         .build()?;

      Ok(Self {
         user,
         blog,
         comment,
      })
   }

   /// All mappings, in dependency order
   pub fn all(&self) -> [&Arc<Mapping>; 3] {
      [&self.user, &self.blog, &self.comment]
   }

   /// Create every table in one transaction
   pub async fn create_schema(&self, ctx: &mut DbContext) -> Result<()> {
      ctx.transaction(async |ctx| {
         for mapping in self.all() {
            info!("create table {}", mapping.table());
            ctx.update(mapping.create_table_sql(), vec![]).await?;
         }
         Ok::<_, Error>(())
      })
      .await
   }
}
