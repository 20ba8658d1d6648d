use serde_json::json;
use sqlx_sqlite_dbctx::{DbContext, Engine, EngineConfig, Record};
use sqlx_sqlite_orm::{Entity, Error, Field, Mapping};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn user_mapping(type_name: &str) -> Arc<Mapping> {
   Mapping::builder(type_name)
      .table("user")
      .field("id", Field::integer().primary_key())
      .field("name", Field::string())
      .field("email", Field::string().updatable(false))
      .field("passwd", Field::string().default("******"))
      .field("last_modified", Field::float().default_with(|| json!(1_700_000_000.5)))
      .build()
      .expect("Failed to build mapping")
}

async fn create_test_db(mapping: &Arc<Mapping>) -> (DbContext, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let engine = Engine::new(EngineConfig::new(temp_dir.path().join("test.db")));
   let mut ctx = DbContext::new(Arc::new(engine));

   ctx.update(mapping.create_table_sql(), vec![])
      .await
      .expect("Failed to create table");

   (ctx, temp_dir)
}

fn new_user(mapping: &Arc<Mapping>, id: i64, name: &str, email: &str) -> Entity {
   let mut user = Entity::new(mapping);
   user.set("id", id).set("name", name).set("email", email);
   user
}

#[tokio::test]
async fn test_insert_get_round_trip() {
   let users = user_mapping("RoundTripUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   let mut u = new_user(&users, 10190, "Michael", "orm@db.org");
   u.insert(&mut ctx).await.unwrap();

   // Defaults were filled in on the instance
   assert_eq!(u["passwd"], json!("******"));
   assert_eq!(u["last_modified"], json!(1_700_000_000.5));

   let loaded = users.get(&mut ctx, 10190).await.unwrap().expect("row exists");
   assert_eq!(loaded.record(), u.record());
   assert_eq!(loaded.mapping().type_name(), "RoundTripUser");
}

#[tokio::test]
async fn test_get_missing_returns_none() {
   let users = user_mapping("MissingUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   assert!(users.get(&mut ctx, 1).await.unwrap().is_none());
   assert!(
      users
         .find_first(&mut ctx, "where `name`=?", vec![json!("nobody")])
         .await
         .unwrap()
         .is_none()
   );
}

#[tokio::test]
async fn test_update_skips_non_updatable_fields() {
   let users = user_mapping("UpdateUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   let mut u = new_user(&users, 1, "Michael", "orm@db.org");
   u.insert(&mut ctx).await.unwrap();

   u.set("name", "Bob").set("email", "changed@db.org");
   u.update(&mut ctx).await.unwrap();

   let loaded = users.get(&mut ctx, 1).await.unwrap().unwrap();
   assert_eq!(loaded["name"], json!("Bob"));
   assert_eq!(loaded["email"], json!("orm@db.org"));
}

#[tokio::test]
async fn test_update_requires_primary_key() {
   let users = user_mapping("NoKeyUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   let mut u = Entity::new(&users);
   u.set("name", "anonymous");
   let err = u.update(&mut ctx).await.unwrap_err();

   assert!(matches!(
      err,
      Error::Database(sqlx_sqlite_dbctx::Error::AttributeNotFound(ref name)) if name == "id"
   ));
   assert_eq!(err.error_code(), "ATTRIBUTE_NOT_FOUND");
}

#[tokio::test]
async fn test_delete() {
   let users = user_mapping("DeleteUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   let mut u = new_user(&users, 1, "Michael", "orm@db.org");
   u.insert(&mut ctx).await.unwrap().delete(&mut ctx).await.unwrap();

   assert!(users.get(&mut ctx, 1).await.unwrap().is_none());
   assert_eq!(users.count_all(&mut ctx).await.unwrap(), 0);
}

#[tokio::test]
async fn test_finders_and_counts() {
   let users = user_mapping("FinderUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   for (id, name) in [(1, "a"), (2, "b"), (3, "b")] {
      new_user(&users, id, name, "x@db.org")
         .insert(&mut ctx)
         .await
         .unwrap();
   }

   assert_eq!(users.count_all(&mut ctx).await.unwrap(), 3);
   assert_eq!(
      users
         .count_by(&mut ctx, "where `name`=?", vec![json!("b")])
         .await
         .unwrap(),
      2
   );

   let found = users
      .find_by(&mut ctx, "where `name`=? order by `id` desc", vec![json!("b")])
      .await
      .unwrap();
   let ids: Vec<_> = found.iter().map(|u| u["id"].clone()).collect();
   assert_eq!(ids, vec![json!(3), json!(2)]);

   let first = users
      .find_first(&mut ctx, "where `id`>? order by `id`", vec![json!(1)])
      .await
      .unwrap()
      .unwrap();
   assert_eq!(first["id"], json!(2));

   assert_eq!(users.find_all(&mut ctx).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_finders_accept_clause_without_where() {
   let users = user_mapping("OrderOnlyUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
      new_user(&users, id, name, "x@db.org")
         .insert(&mut ctx)
         .await
         .unwrap();
   }

   let latest = users
      .find_by(&mut ctx, "order by `id` desc limit ?", vec![json!(2)])
      .await
      .unwrap();
   let ids: Vec<_> = latest.iter().map(|u| u["id"].clone()).collect();
   assert_eq!(ids, vec![json!(3), json!(2)]);

   let first = users
      .find_first(&mut ctx, "order by `name` desc", vec![])
      .await
      .unwrap()
      .unwrap();
   assert_eq!(first["name"], json!("c"));

   // An empty clause selects every row
   assert_eq!(users.count_by(&mut ctx, "", vec![]).await.unwrap(), 3);
}

#[tokio::test]
async fn test_columns_load_into_attribute_names() {
   let people = Mapping::builder("RenamedPerson")
      .table("people")
      .field("id", Field::integer().primary_key())
      .field("display_name", Field::string().column("name"))
      .build()
      .unwrap();
   let (mut ctx, _temp) = create_test_db(&people).await;

   let mut p = Entity::new(&people);
   p.set("id", 7).set("display_name", "Ada");
   p.insert(&mut ctx).await.unwrap();

   let raw = ctx
      .select_one("SELECT * FROM people", vec![])
      .await
      .unwrap()
      .unwrap();
   assert_eq!(raw["name"], json!("Ada"));

   let loaded = people.get(&mut ctx, 7).await.unwrap().unwrap();
   assert_eq!(loaded["display_name"], json!("Ada"));
   assert!(loaded.get("name").is_none());
}

#[tokio::test]
async fn test_lifecycle_hooks_run_before_writes() {
   let deleted = Arc::new(AtomicUsize::new(0));
   let counter = Arc::clone(&deleted);

   let posts = Mapping::builder("HookedPost")
      .table("posts")
      .field("id", Field::integer().primary_key())
      .field("title", Field::string())
      .field("revision", Field::version())
      .pre_insert(|r: &mut Record| {
         r.set("title", "draft");
      })
      .pre_update(|r: &mut Record| {
         let next = r.get("revision").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
         r.set("revision", next);
      })
      .pre_delete(move |_: &mut Record| {
         counter.fetch_add(1, Ordering::SeqCst);
      })
      .build()
      .unwrap();
   let (mut ctx, _temp) = create_test_db(&posts).await;

   let mut post = Entity::new(&posts);
   post.set("id", 1);
   post.insert(&mut ctx).await.unwrap();
   assert_eq!(post["title"], json!("draft"));
   assert_eq!(post["revision"], json!(0));

   post.update(&mut ctx).await.unwrap();
   let loaded = posts.get(&mut ctx, 1).await.unwrap().unwrap();
   assert_eq!(loaded["revision"], json!(1));

   post.delete(&mut ctx).await.unwrap();
   assert_eq!(deleted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_insertable_field_uses_column_default() {
   let stamped = Mapping::builder("StampedRow")
      .table("stamped")
      .field("id", Field::integer().primary_key())
      .field("created", Field::text().insertable(false).updatable(false).nullable())
      .build()
      .unwrap();
   let (mut ctx, _temp) = create_test_db(&stamped).await;

   let mut row = Entity::new(&stamped);
   row.set("id", 1).set("created", "ignored");
   row.insert(&mut ctx).await.unwrap();

   let loaded = stamped.get(&mut ctx, 1).await.unwrap().unwrap();
   assert_eq!(loaded["created"], json!(null));
}

#[tokio::test]
async fn test_update_without_updatable_fields_issues_nothing() {
   let tags = Mapping::builder("KeyOnlyTag")
      .table("tags_never_created")
      .field("id", Field::string().primary_key())
      .build()
      .unwrap();

   let temp_dir = TempDir::new().unwrap();
   let mut ctx = DbContext::new(Arc::new(Engine::new(EngineConfig::new(
      temp_dir.path().join("test.db"),
   ))));

   // The table does not exist, so any statement would fail
   let mut tag = Entity::new(&tags);
   tag.set("id", "rust");
   tag.update(&mut ctx).await.unwrap();
}

#[tokio::test]
async fn test_inserts_inside_failed_transaction_are_rolled_back() {
   let users = user_mapping("TransactionUser");
   let (mut ctx, _temp) = create_test_db(&users).await;

   let result = ctx
      .transaction(async |ctx| {
         new_user(&users, 1, "a", "a@db.org").insert(ctx).await?;
         new_user(&users, 1, "dup", "dup@db.org").insert(ctx).await?;
         Ok::<_, Error>(())
      })
      .await;

   assert!(matches!(result, Err(Error::Database(_))));
   assert_eq!(users.count_all(&mut ctx).await.unwrap(), 0);
}
