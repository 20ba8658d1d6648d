//! Active-record operations: entity instances and per-type finders

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use sqlx_sqlite_dbctx::{DbContext, Record};
use tracing::debug;

use crate::Result;
use crate::field::Field;
use crate::mapping::Mapping;

/// A record of one entity type, paired with its mapping.
///
/// Dereferences to [`Record`], so attributes are read and written the same
/// way as on plain query rows.
#[derive(Clone)]
pub struct Entity {
   mapping: Arc<Mapping>,
   record: Record,
}

impl Entity {
   /// An empty instance; missing attributes are filled from defaults on write
   pub fn new(mapping: &Arc<Mapping>) -> Self {
      Self::with_record(mapping, Record::new())
   }

   pub fn with_record(mapping: &Arc<Mapping>, record: Record) -> Self {
      Self {
         mapping: Arc::clone(mapping),
         record,
      }
   }

   pub fn mapping(&self) -> &Arc<Mapping> {
      &self.mapping
   }

   pub fn record(&self) -> &Record {
      &self.record
   }

   pub fn into_record(self) -> Record {
      self.record
   }

   /// Insert this instance as a new row.
   ///
   /// Runs the `pre_insert` hook, then fills every missing insertable attribute
   /// with its field default. The filled values stay on the instance.
   pub async fn insert(&mut self, ctx: &mut DbContext) -> Result<&mut Self> {
      let mapping = Arc::clone(&self.mapping);
      (mapping.pre_insert)(&mut self.record);

      let mut values = Vec::with_capacity(mapping.fields().len());
      for (attribute, field) in mapping.fields() {
         if !field.is_insertable() {
            continue;
         }
         values.push((field.name(), self.value_or_default(attribute, field)));
      }

      ctx.insert(mapping.table(), values).await?;
      Ok(self)
   }

   /// Write every updatable attribute back to the row with this primary key.
   ///
   /// Non-updatable fields are never written, whatever the instance holds. When
   /// the mapping has no updatable fields no statement is issued.
   pub async fn update(&mut self, ctx: &mut DbContext) -> Result<&mut Self> {
      let mapping = Arc::clone(&self.mapping);
      (mapping.pre_update)(&mut self.record);

      let mut assignments = Vec::new();
      let mut args = Vec::new();
      for (attribute, field) in mapping.fields() {
         if !field.is_updatable() {
            continue;
         }
         assignments.push(format!("`{}`=?", field.name()));
         args.push(self.value_or_default(attribute, field));
      }

      let (pk_attribute, pk) = mapping.primary_key();
      args.push(self.record.attr(pk_attribute)?.clone());

      if assignments.is_empty() {
         debug!("{} has no updatable fields", mapping.type_name());
         return Ok(self);
      }

      let sql = format!(
         "update `{}` set {} where `{}`=?",
         mapping.table(),
         assignments.join(","),
         pk.name()
      );
      ctx.update(&sql, args).await?;
      Ok(self)
   }

   /// Delete the row with this instance's primary key
   pub async fn delete(&mut self, ctx: &mut DbContext) -> Result<&mut Self> {
      let mapping = Arc::clone(&self.mapping);
      (mapping.pre_delete)(&mut self.record);

      let (pk_attribute, pk) = mapping.primary_key();
      let args = vec![self.record.attr(pk_attribute)?.clone()];
      let sql = format!("delete from `{}` where `{}`=?", mapping.table(), pk.name());
      ctx.update(&sql, args).await?;
      Ok(self)
   }

   fn value_or_default(&mut self, attribute: &str, field: &Field) -> JsonValue {
      if let Some(value) = self.record.get(attribute) {
         return value.clone();
      }
      let value = field.default_value().resolve();
      debug!("using default value for {}: {}", attribute, value);
      self.record.set(attribute, value.clone());
      value
   }
}

impl Deref for Entity {
   type Target = Record;

   fn deref(&self) -> &Record {
      &self.record
   }
}

impl DerefMut for Entity {
   fn deref_mut(&mut self) -> &mut Record {
      &mut self.record
   }
}

impl fmt::Debug for Entity {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple(self.mapping.type_name())
         .field(&self.record)
         .finish()
   }
}

impl Mapping {
   /// Load the instance with primary key `pk`, or `None` when there is no such row
   pub async fn get(
      self: &Arc<Self>,
      ctx: &mut DbContext,
      pk: impl Into<JsonValue>,
   ) -> Result<Option<Entity>> {
      let (_, field) = self.primary_key();
      let sql = format!("select * from `{}` where `{}`=?", self.table(), field.name());
      let row = ctx.select_one(&sql, vec![pk.into()]).await?;
      Ok(row.map(|row| self.load(row)))
   }

   /// First row of `select * from <table> <clause>`.
   ///
   /// `clause` is appended as given, so it carries its own `where`, `order by`
   /// or `limit` keywords.
   pub async fn find_first(
      self: &Arc<Self>,
      ctx: &mut DbContext,
      clause: &str,
      args: Vec<JsonValue>,
   ) -> Result<Option<Entity>> {
      let sql = format!("select * from `{}` {}", self.table(), clause);
      let row = ctx.select_one(&sql, args).await?;
      Ok(row.map(|row| self.load(row)))
   }

   /// All rows of `select * from <table> <clause>`
   pub async fn find_by(
      self: &Arc<Self>,
      ctx: &mut DbContext,
      clause: &str,
      args: Vec<JsonValue>,
   ) -> Result<Vec<Entity>> {
      let sql = format!("select * from `{}` {}", self.table(), clause);
      let rows = ctx.select(&sql, args).await?;
      Ok(rows.into_iter().map(|row| self.load(row)).collect())
   }

   pub async fn find_all(self: &Arc<Self>, ctx: &mut DbContext) -> Result<Vec<Entity>> {
      let sql = format!("select * from `{}`", self.table());
      let rows = ctx.select(&sql, vec![]).await?;
      Ok(rows.into_iter().map(|row| self.load(row)).collect())
   }

   pub async fn count_all(&self, ctx: &mut DbContext) -> Result<i64> {
      let (_, field) = self.primary_key();
      let sql = format!("select count(`{}`) from `{}`", field.name(), self.table());
      Ok(ctx.select_int(&sql, vec![]).await?.unwrap_or(0))
   }

   pub async fn count_by(
      &self,
      ctx: &mut DbContext,
      clause: &str,
      args: Vec<JsonValue>,
   ) -> Result<i64> {
      let (_, field) = self.primary_key();
      let sql = format!(
         "select count(`{}`) from `{}` {}",
         field.name(),
         self.table(),
         clause
      );
      Ok(ctx.select_int(&sql, args).await?.unwrap_or(0))
   }

   /// Rename row columns to attribute names; unmapped columns keep their name
   fn load(self: &Arc<Self>, row: Record) -> Entity {
      let record = row
         .into_iter()
         .map(|(column, value)| match self.attribute_for_column(&column) {
            Some(attribute) => (attribute.to_string(), value),
            None => (column, value),
         })
         .collect();
      Entity::with_record(self, record)
   }
}
