//! Ordered attribute map used for query rows and entity instances

use std::ops::Index;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// An ordered mapping from attribute (or column) name to value.
///
/// Indexing and [`Record::attr`] are two spellings of the same named access:
/// both fail for a missing attribute, the former by panicking and the latter
/// with [`Error::AttributeNotFound`]. [`Record::get`] is the plain map lookup
/// and reports absence as `None`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use sqlx_sqlite_dbctx::Record;
///
/// let mut user = Record::from_pairs(["id", "name"], [json!(1), json!("Michael")]);
/// user.set("email", "orm@db.org");
///
/// assert_eq!(user["name"], json!("Michael"));
/// assert_eq!(user.attr("email").unwrap(), &json!("orm@db.org"));
/// assert!(user.attr("passwd").is_err());
/// assert!(user.get("passwd").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, JsonValue>);

impl Record {
   pub fn new() -> Self {
      Self::default()
   }

   /// Zip names with values; extra names or values are ignored
   pub fn from_pairs<K, V>(
      names: impl IntoIterator<Item = K>,
      values: impl IntoIterator<Item = V>,
   ) -> Self
   where
      K: Into<String>,
      V: Into<JsonValue>,
   {
      Self(
         names
            .into_iter()
            .zip(values)
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
      )
   }

   /// Named access to an attribute
   pub fn attr(&self, name: &str) -> Result<&JsonValue, Error> {
      self
         .0
         .get(name)
         .ok_or_else(|| Error::AttributeNotFound(name.to_string()))
   }

   /// Plain lookup in the backing map
   pub fn get(&self, name: &str) -> Option<&JsonValue> {
      self.0.get(name)
   }

   pub fn get_mut(&mut self, name: &str) -> Option<&mut JsonValue> {
      self.0.get_mut(name)
   }

   /// Set an attribute, keeping its position if it already exists
   pub fn set(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> &mut Self {
      self.0.insert(name.into(), value.into());
      self
   }

   /// Remove an attribute, preserving the order of the remaining ones
   pub fn remove(&mut self, name: &str) -> Option<JsonValue> {
      self.0.shift_remove(name)
   }

   pub fn contains(&self, name: &str) -> bool {
      self.0.contains_key(name)
   }

   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   pub fn keys(&self) -> impl Iterator<Item = &str> {
      self.0.keys().map(String::as_str)
   }

   pub fn values(&self) -> impl Iterator<Item = &JsonValue> {
      self.0.values()
   }

   pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
      self.0.iter().map(|(k, v)| (k.as_str(), v))
   }

   pub fn into_inner(self) -> IndexMap<String, JsonValue> {
      self.0
   }
}

impl Index<&str> for Record {
   type Output = JsonValue;

   fn index(&self, name: &str) -> &Self::Output {
      match self.attr(name) {
         Ok(value) => value,
         Err(e) => panic!("{}", e),
      }
   }
}

impl From<IndexMap<String, JsonValue>> for Record {
   fn from(map: IndexMap<String, JsonValue>) -> Self {
      Self(map)
   }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for Record {
   fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
      Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
   }
}

impl IntoIterator for Record {
   type Item = (String, JsonValue);
   type IntoIter = indexmap::map::IntoIter<String, JsonValue>;

   fn into_iter(self) -> Self::IntoIter {
      self.0.into_iter()
   }
}
