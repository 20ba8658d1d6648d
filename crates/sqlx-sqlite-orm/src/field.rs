//! Field descriptors: storage type, DDL, default and constraints of one persisted attribute

use std::fmt;
use std::sync::Arc;

use serde_json::{Value as JsonValue, json};

/// Storage type tag of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
   String,
   Integer,
   Float,
   Boolean,
   Text,
   Blob,
   /// Integer column holding a row version counter
   Version,
}

impl FieldType {
   /// Column type used in `create table` when the field does not override it
   pub fn default_ddl(self) -> &'static str {
      match self {
         FieldType::String => "varchar(255)",
         FieldType::Integer | FieldType::Version => "bigint",
         FieldType::Float => "real",
         FieldType::Boolean => "bool",
         FieldType::Text => "text",
         FieldType::Blob => "blob",
      }
   }

   /// Value a field of this type takes when none was declared
   pub fn default_value(self) -> JsonValue {
      match self {
         FieldType::String | FieldType::Text | FieldType::Blob => json!(""),
         FieldType::Integer | FieldType::Version => json!(0),
         FieldType::Float => json!(0.0),
         FieldType::Boolean => json!(false),
      }
   }
}

/// Default applied when an attribute is missing at insert or update time
#[derive(Clone)]
pub enum FieldDefault {
   /// A literal value, cloned on each use
   Value(JsonValue),
   /// A generator called once per use
   Generator(Arc<dyn Fn() -> JsonValue + Send + Sync>),
}

impl FieldDefault {
   pub fn resolve(&self) -> JsonValue {
      match self {
         FieldDefault::Value(value) => value.clone(),
         FieldDefault::Generator(generate) => generate(),
      }
   }
}

impl fmt::Debug for FieldDefault {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
         FieldDefault::Generator(_) => f.write_str("Generator(..)"),
      }
   }
}

/// Metadata for one persisted attribute.
///
/// Built with a per-type constructor and refined with chained setters:
///
/// ```
/// use serde_json::json;
/// use sqlx_sqlite_orm::{Field, FieldType};
///
/// let email = Field::string().ddl("varchar(50)").updatable(false);
/// assert_eq!(email.field_type(), FieldType::String);
/// assert_eq!(email.ddl_type(), "varchar(50)");
/// assert_eq!(email.default_value().resolve(), json!(""));
/// assert!(!email.is_updatable());
/// ```
#[derive(Debug, Clone)]
pub struct Field {
   name: String,
   field_type: FieldType,
   ddl: String,
   default: FieldDefault,
   primary_key: bool,
   nullable: bool,
   updatable: bool,
   insertable: bool,
}

impl Field {
   pub fn new(field_type: FieldType) -> Self {
      Self {
         name: String::new(),
         field_type,
         ddl: field_type.default_ddl().to_string(),
         default: FieldDefault::Value(field_type.default_value()),
         primary_key: false,
         nullable: false,
         updatable: true,
         insertable: true,
      }
   }

   pub fn string() -> Self {
      Self::new(FieldType::String)
   }

   pub fn integer() -> Self {
      Self::new(FieldType::Integer)
   }

   pub fn float() -> Self {
      Self::new(FieldType::Float)
   }

   pub fn boolean() -> Self {
      Self::new(FieldType::Boolean)
   }

   pub fn text() -> Self {
      Self::new(FieldType::Text)
   }

   pub fn blob() -> Self {
      Self::new(FieldType::Blob)
   }

   pub fn version() -> Self {
      Self::new(FieldType::Version)
   }

   /// Column name; defaults to the attribute name when the field is mapped
   pub fn column(mut self, name: impl Into<String>) -> Self {
      self.name = name.into();
      self
   }

   pub fn ddl(mut self, ddl: impl Into<String>) -> Self {
      self.ddl = ddl.into();
      self
   }

   pub fn default(mut self, value: impl Into<JsonValue>) -> Self {
      self.default = FieldDefault::Value(value.into());
      self
   }

   /// Generate the default on each use, e.g. a fresh id or the current time
   pub fn default_with<F>(mut self, generate: F) -> Self
   where
      F: Fn() -> JsonValue + Send + Sync + 'static,
   {
      self.default = FieldDefault::Generator(Arc::new(generate));
      self
   }

   pub fn primary_key(mut self) -> Self {
      self.primary_key = true;
      self
   }

   pub fn nullable(mut self) -> Self {
      self.nullable = true;
      self
   }

   pub fn updatable(mut self, updatable: bool) -> Self {
      self.updatable = updatable;
      self
   }

   pub fn insertable(mut self, insertable: bool) -> Self {
      self.insertable = insertable;
      self
   }

   /// Column name. Empty until the field is mapped, unless set with [`Field::column`]
   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn field_type(&self) -> FieldType {
      self.field_type
   }

   pub fn ddl_type(&self) -> &str {
      &self.ddl
   }

   pub fn default_value(&self) -> &FieldDefault {
      &self.default
   }

   pub fn is_primary_key(&self) -> bool {
      self.primary_key
   }

   pub fn is_nullable(&self) -> bool {
      self.nullable
   }

   pub fn is_updatable(&self) -> bool {
      self.updatable
   }

   pub fn is_insertable(&self) -> bool {
      self.insertable
   }

   pub(crate) fn set_name(&mut self, name: &str) {
      self.name = name.to_string();
   }

   pub(crate) fn set_updatable(&mut self, updatable: bool) {
      self.updatable = updatable;
   }

   pub(crate) fn set_nullable(&mut self, nullable: bool) {
      self.nullable = nullable;
   }
}

impl fmt::Display for Field {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "<{:?}:{},{}:{:?}>", self.field_type, self.name, self.ddl, self.default)
   }
}
