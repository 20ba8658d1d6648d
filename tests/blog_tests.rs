use quillpress::{AppConfig, Error, Models};
use serde_json::json;
use sqlx_sqlite_dbctx::{DbContext, Engine, EngineConfig};
use sqlx_sqlite_orm::Entity;
use std::sync::Arc;
use tempfile::TempDir;

async fn create_blog_db() -> (DbContext, Models, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let engine = Engine::new(EngineConfig::new(temp_dir.path().join("blog.db")));
   let mut ctx = DbContext::new(Arc::new(engine));

   let models = Models::define().expect("Failed to define models");
   models
      .create_schema(&mut ctx)
      .await
      .expect("Failed to create schema");

   (ctx, models, temp_dir)
}

#[tokio::test]
async fn test_schema_creates_all_tables() {
   let (mut ctx, _models, _temp) = create_blog_db().await;

   let tables = ctx
      .select(
         "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
         vec![],
      )
      .await
      .unwrap();
   let names: Vec<_> = tables.iter().map(|t| t["name"].clone()).collect();
   assert_eq!(names, vec![json!("blogs"), json!("comments"), json!("users")]);
}

#[tokio::test]
async fn test_user_gets_generated_id_and_timestamp() {
   let (mut ctx, models, _temp) = create_blog_db().await;

   let mut user = Entity::new(&models.user);
   user.set("email", "admin@example.com")
      .set("password", "5f4dcc3b")
      .set("name", "Admin")
      .set("admin", true);
   user.insert(&mut ctx).await.unwrap();

   let id = user["id"].as_str().unwrap().to_string();
   assert_eq!(id.len(), 50);
   assert!(user["created_at"].as_f64().unwrap() > 0.0);
   assert_eq!(user["image"], json!(""));

   let found = models
      .user
      .find_first(&mut ctx, "where `email`=?", vec![json!("admin@example.com")])
      .await
      .unwrap()
      .unwrap();
   assert_eq!(found["id"], json!(id));
   assert_eq!(found["name"], json!("Admin"));
}

#[tokio::test]
async fn test_blog_with_comments() {
   let (mut ctx, models, _temp) = create_blog_db().await;

   let mut blog = Entity::new(&models.blog);
   blog.set("user_id", "u1")
      .set("user_name", "Admin")
      .set("name", "Hello")
      .set("summary", "First post")
      .set("content", "Lorem ipsum");
   blog.insert(&mut ctx).await.unwrap();
   let blog_id = blog["id"].clone();

   ctx.transaction(async |ctx| {
      for text in ["nice", "thanks"] {
         let mut comment = Entity::new(&models.comment);
         comment
            .set("blog_id", blog_id.clone())
            .set("user_id", "u2")
            .set("content", text);
         comment.insert(ctx).await?;
      }
      Ok::<_, Error>(())
   })
   .await
   .unwrap();

   assert_eq!(
      models
         .comment
         .count_by(&mut ctx, "where `blog_id`=?", vec![blog_id.clone()])
         .await
         .unwrap(),
      2
   );

   // created_at and user_id are not updatable
   let created_at = blog["created_at"].clone();
   blog.set("name", "Hello again")
      .set("user_id", "someone-else")
      .set("created_at", 0.0);
   blog.update(&mut ctx).await.unwrap();

   let loaded = models.blog.get(&mut ctx, blog_id).await.unwrap().unwrap();
   assert_eq!(loaded["name"], json!("Hello again"));
   assert_eq!(loaded["user_id"], json!("u1"));
   assert_eq!(loaded["created_at"], created_at);
}

#[tokio::test]
async fn test_schema_creation_is_atomic() {
   let temp_dir = TempDir::new().unwrap();
   let engine = Arc::new(Engine::new(EngineConfig::new(temp_dir.path().join("blog.db"))));
   let mut ctx = DbContext::new(Arc::clone(&engine));

   // A pre-existing comments table makes the last statement fail
   ctx.update("CREATE TABLE comments (id TEXT)", vec![])
      .await
      .unwrap();

   let models = Models::define().unwrap();
   let err = models.create_schema(&mut ctx).await.unwrap_err();
   assert!(err.error_code().starts_with("SQLITE_"));

   let users = ctx
      .select_int(
         "SELECT COUNT(*) FROM sqlite_master WHERE name IN ('users', 'blogs')",
         vec![],
      )
      .await
      .unwrap();
   assert_eq!(users, Some(0));
}

#[tokio::test]
async fn test_init_installs_global_engine_once() {
   let temp_dir = TempDir::new().unwrap();
   let config = AppConfig::with_overrides(json!({
      "db": { "database": temp_dir.path().join("global.db") }
   }))
   .unwrap();

   let models = quillpress::init(&config).unwrap();
   let mut ctx = DbContext::global().unwrap();
   models.create_schema(&mut ctx).await.unwrap();
   assert_eq!(models.user.count_all(&mut ctx).await.unwrap(), 0);

   let err = quillpress::init(&config).unwrap_err();
   assert_eq!(err.error_code(), "ENGINE_ALREADY_INITIALIZED");
}
