//! Mapping descriptors: compiled table, column and primary key metadata of an entity type

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use sqlx_sqlite_dbctx::Record;
use tracing::{debug, info, warn};

use crate::field::Field;
use crate::{Error, Result, registry};

/// Lifecycle callback run on an entity's record before a write
pub type Hook = Arc<dyn Fn(&mut Record) + Send + Sync>;

fn noop_hook() -> Hook {
   Arc::new(|_: &mut Record| {})
}

/// Compiled metadata of one entity type.
///
/// Built once per type with [`Mapping::builder`] and shared as `Arc<Mapping>`
/// by the registry and every [`Entity`](crate::Entity) of the type.
pub struct Mapping {
   type_name: String,
   table: String,
   fields: IndexMap<String, Field>,
   primary_key: (String, Field),
   attributes_by_column: HashMap<String, String>,
   pub(crate) pre_insert: Hook,
   pub(crate) pre_update: Hook,
   pub(crate) pre_delete: Hook,
   create_table: OnceLock<String>,
}

impl Mapping {
   pub fn builder(type_name: impl Into<String>) -> MappingBuilder {
      MappingBuilder {
         type_name: type_name.into(),
         table: None,
         fields: Vec::new(),
         pre_insert: None,
         pre_update: None,
         pre_delete: None,
      }
   }

   pub fn type_name(&self) -> &str {
      &self.type_name
   }

   pub fn table(&self) -> &str {
      &self.table
   }

   /// Attribute name to field, in declaration order
   pub fn fields(&self) -> &IndexMap<String, Field> {
      &self.fields
   }

   pub fn field(&self, attribute: &str) -> Option<&Field> {
      self.fields.get(attribute)
   }

   /// Attribute name and field of the primary key
   pub fn primary_key(&self) -> (&str, &Field) {
      (&self.primary_key.0, &self.primary_key.1)
   }

   /// Attribute a column loads into, if the column is mapped
   pub fn attribute_for_column(&self, column: &str) -> Option<&str> {
      self.attributes_by_column.get(column).map(String::as_str)
   }

   /// `create table` statement for this mapping, generated on first use
   pub fn create_table_sql(&self) -> &str {
      self.create_table.get_or_init(|| {
         let (_, pk) = self.primary_key();
         let mut sql = vec![
            format!("-- generating SQL for {}:", self.table),
            format!("create table `{}` (", self.table),
         ];
         for field in self.fields.values() {
            let null = if field.is_nullable() { "" } else { " not null" };
            sql.push(format!("  `{}` {}{},", field.name(), field.ddl_type(), null));
         }
         sql.push(format!("  primary key(`{}`)", pk.name()));
         sql.push(");".to_string());
         sql.join("\n")
      })
   }
}

impl fmt::Debug for Mapping {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Mapping")
         .field("type_name", &self.type_name)
         .field("table", &self.table)
         .field("fields", &self.fields)
         .field("primary_key", &self.primary_key.0)
         .finish_non_exhaustive()
   }
}

/// Builder for [`Mapping`]
///
/// # Example
///
/// ```
/// use sqlx_sqlite_orm::{Field, Mapping};
///
/// let user = Mapping::builder("User")
///    .table("users")
///    .field("id", Field::integer().primary_key())
///    .field("name", Field::string())
///    .build()
///    .unwrap();
///
/// assert_eq!(user.table(), "users");
/// assert_eq!(user.primary_key().0, "id");
/// ```
pub struct MappingBuilder {
   type_name: String,
   table: Option<String>,
   fields: Vec<(String, Field)>,
   pre_insert: Option<Hook>,
   pre_update: Option<Hook>,
   pre_delete: Option<Hook>,
}

impl MappingBuilder {
   /// Table name; defaults to the lower-cased type name
   pub fn table(mut self, table: impl Into<String>) -> Self {
      self.table = Some(table.into());
      self
   }

   pub fn field(mut self, attribute: impl Into<String>, field: Field) -> Self {
      self.fields.push((attribute.into(), field));
      self
   }

   pub fn pre_insert<F>(mut self, hook: F) -> Self
   where
      F: Fn(&mut Record) + Send + Sync + 'static,
   {
      self.pre_insert = Some(Arc::new(hook));
      self
   }

   pub fn pre_update<F>(mut self, hook: F) -> Self
   where
      F: Fn(&mut Record) + Send + Sync + 'static,
   {
      self.pre_update = Some(Arc::new(hook));
      self
   }

   pub fn pre_delete<F>(mut self, hook: F) -> Self
   where
      F: Fn(&mut Record) + Send + Sync + 'static,
   {
      self.pre_delete = Some(Arc::new(hook));
      self
   }

   /// Compile the mapping and register it under its type name.
   ///
   /// Fails when there is not exactly one primary field or when an attribute or
   /// column name is declared twice.
   pub fn build(self) -> Result<Arc<Mapping>> {
      info!("Scan ORMMapping {}...", self.type_name);

      let mut fields = IndexMap::with_capacity(self.fields.len());
      let mut attributes_by_column = HashMap::with_capacity(self.fields.len());
      let mut primary_key = None;

      for (attribute, mut field) in self.fields {
         if field.name().is_empty() {
            field.set_name(&attribute);
         }
         debug!("Found mapping: {} => {}", attribute, field);

         if field.is_primary_key() {
            if primary_key.is_some() {
               return Err(Error::DuplicatePrimaryKey(self.type_name));
            }
            if field.is_updatable() {
               warn!("NOTE: change primary key to non-updatable.");
               field.set_updatable(false);
            }
            if field.is_nullable() {
               warn!("NOTE: change primary key to non-nullable.");
               field.set_nullable(false);
            }
            primary_key = Some((attribute.clone(), field.clone()));
         }

         if fields.contains_key(&attribute) {
            return Err(Error::DuplicateField {
               model: self.type_name,
               field: attribute,
            });
         }
         if attributes_by_column.contains_key(field.name()) {
            return Err(Error::DuplicateField {
               model: self.type_name,
               field: field.name().to_string(),
            });
         }

         attributes_by_column.insert(field.name().to_string(), attribute.clone());
         fields.insert(attribute, field);
      }

      let Some(primary_key) = primary_key else {
         return Err(Error::MissingPrimaryKey(self.type_name));
      };

      let table = self
         .table
         .unwrap_or_else(|| self.type_name.to_lowercase());

      let mapping = Arc::new(Mapping {
         type_name: self.type_name,
         table,
         fields,
         primary_key,
         attributes_by_column,
         pre_insert: self.pre_insert.unwrap_or_else(noop_hook),
         pre_update: self.pre_update.unwrap_or_else(noop_hook),
         pre_delete: self.pre_delete.unwrap_or_else(noop_hook),
         create_table: OnceLock::new(),
      });

      registry::register(&mapping);
      Ok(mapping)
   }
}
