//! Application configuration: defaults plus JSON overrides

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_dbctx::EngineConfig;
use tracing::debug;

use crate::Result;

/// Session cookie settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
   /// Key used to sign session cookies
   ///
   /// Default: `AwEsOmE`
   pub secret: String,
}

impl Default for SessionConfig {
   fn default() -> Self {
      Self {
         secret: "AwEsOmE".to_string(),
      }
   }
}

/// Top-level configuration of the blog application
///
/// # Examples
///
/// ```
/// use quillpress::AppConfig;
/// use serde_json::json;
///
/// let config = AppConfig::with_overrides(json!({
///    "db": { "database": "/var/lib/blog/blog.db" },
///    "session": { "secret": "s3cr3t" }
/// }))
/// .unwrap();
///
/// assert_eq!(config.session.secret, "s3cr3t");
/// // Keys the overrides leave out keep their defaults
/// assert_eq!(config.db.busy_timeout_secs, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
   pub db: EngineConfig,
   pub session: SessionConfig,
}

impl Default for AppConfig {
   fn default() -> Self {
      Self {
         db: EngineConfig {
            user: Some("www-data".to_string()),
            password: Some("www-data".to_string()),
            host: Some("127.0.0.1".to_string()),
            port: Some(3306),
            ..EngineConfig::new("awesome.db")
         },
         session: SessionConfig::default(),
      }
   }
}

impl AppConfig {
   /// Defaults with `overrides` merged over them.
   ///
   /// Objects merge key by key at every depth; any other override value
   /// replaces the default outright.
   pub fn with_overrides(overrides: JsonValue) -> Result<Self> {
      let mut merged = serde_json::to_value(Self::default())?;
      merge(&mut merged, overrides);
      debug!("merged configuration: {}", merged);
      Ok(serde_json::from_value(merged)?)
   }
}

fn merge(base: &mut JsonValue, overrides: JsonValue) {
   match (base, overrides) {
      (JsonValue::Object(base), JsonValue::Object(overrides)) => {
         for (key, value) in overrides {
            merge(base.entry(key).or_insert(JsonValue::Null), value);
         }
      }
      (base, value) => *base = value,
   }
}
