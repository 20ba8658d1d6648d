//! SQL execution helpers on top of an execution context

use std::borrow::Cow;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Executor, Sqlite, Statement};
use tracing::{debug, info, warn};

use crate::context::DbContext;
use crate::decode::{bind_value, decode_row};
use crate::{Error, Record, Result};

/// Statements slower than this are logged as warnings
const SLOW_STATEMENT: Duration = Duration::from_millis(100);

pub(crate) fn profile(start: Instant, sql: &str) {
   let elapsed = start.elapsed();
   if elapsed > SLOW_STATEMENT {
      warn!("[PROFILING] [DB] {:?}: {}", elapsed, sql);
   } else {
      info!("[PROFILING] [DB] {:?}: {}", elapsed, sql);
   }
}

/// Rewrite bare `?` markers to SQLite's numbered form `?N`.
///
/// Numbering follows SQLite's own rule: a bare `?` takes the number after the
/// largest one assigned so far, so explicit `?N` markers keep their meaning.
/// Markers inside string literals, quoted identifiers and comments are left alone.
///
/// ```
/// use sqlx_sqlite_dbctx::rewrite_placeholders;
///
/// assert_eq!(
///    rewrite_placeholders("select * from user where id=? and name='?'"),
///    "select * from user where id=?1 and name='?'"
/// );
/// ```
pub fn rewrite_placeholders(sql: &str) -> Cow<'_, str> {
   if !sql.contains('?') {
      return Cow::Borrowed(sql);
   }

   let mut out = String::with_capacity(sql.len() + 8);
   let mut largest = 0usize;
   let mut chars = sql.chars().peekable();

   while let Some(c) = chars.next() {
      match c {
         '\'' | '"' | '`' | '[' => {
            let close = if c == '[' { ']' } else { c };
            out.push(c);
            // A doubled quote closes and immediately reopens, which copies through unchanged
            for q in chars.by_ref() {
               out.push(q);
               if q == close {
                  break;
               }
            }
         }
         '-' if chars.peek() == Some(&'-') => {
            out.push(c);
            for q in chars.by_ref() {
               out.push(q);
               if q == '\n' {
                  break;
               }
            }
         }
         '/' if chars.peek() == Some(&'*') => {
            out.push(c);
            let mut prev = '\0';
            for q in chars.by_ref() {
               out.push(q);
               if prev == '*' && q == '/' {
                  break;
               }
               // The opening '*' must not pair with a following '/'
               prev = if prev == '\0' { ' ' } else { q };
            }
         }
         '?' => {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
               if !d.is_ascii_digit() {
                  break;
               }
               digits.push(d);
               chars.next();
            }

            out.push('?');
            if digits.is_empty() {
               // Out-of-range numbers are left for SQLite to reject
               largest = largest.saturating_add(1);
               out.push_str(&largest.to_string());
            } else {
               largest = largest.max(digits.parse().unwrap_or(0));
               out.push_str(&digits);
            }
         }
         _ => out.push(c),
      }
   }

   Cow::Owned(out)
}

fn build_query(sql: &str, args: Vec<JsonValue>) -> Query<'_, Sqlite, SqliteArguments<'_>> {
   let mut q = sqlx::query(sql);
   for value in args {
      q = bind_value(q, value);
   }
   q
}

impl DbContext {
   /// Fetch the first row of `sql`, or `None` when there are no rows.
   ///
   /// Rows past the first are ignored.
   pub async fn select_one(&mut self, sql: &str, args: Vec<JsonValue>) -> Result<Option<Record>> {
      Ok(self.fetch(sql, args, true).await?.into_iter().next())
   }

   /// Fetch all rows of `sql`, in the order the database returns them
   pub async fn select(&mut self, sql: &str, args: Vec<JsonValue>) -> Result<Vec<Record>> {
      self.fetch(sql, args, false).await
   }

   /// Fetch the single column of the first row of `sql`.
   ///
   /// Returns `None` when there are no rows. A statement that does not yield
   /// exactly one column fails with [`Error::MultipleColumns`], whether or not
   /// it returns rows.
   pub async fn select_scalar(
      &mut self,
      sql: &str,
      args: Vec<JsonValue>,
   ) -> Result<Option<JsonValue>> {
      let scope = self.connection();
      let result = self.fetch_scalar(sql, args).await;
      self.release(scope).await;

      Ok(result?.and_then(|record| record.into_iter().next().map(|(_, value)| value)))
   }

   /// [`select_scalar`](Self::select_scalar) read as an integer; SQL `NULL` reads as `None`
   pub async fn select_int(&mut self, sql: &str, args: Vec<JsonValue>) -> Result<Option<i64>> {
      match self.select_scalar(sql, args).await? {
         None | Some(JsonValue::Null) => Ok(None),
         Some(value) => value.as_i64().map(Some).ok_or(Error::NotAnInteger(value)),
      }
   }

   /// Execute an UPDATE, DELETE or DDL statement and return the affected row count.
   ///
   /// Outside a transaction the statement runs in SQLite's autocommit mode and is
   /// committed as soon as it completes. Inside one it joins the open transaction
   /// and is committed by the outermost transaction scope.
   pub async fn update(&mut self, sql: &str, args: Vec<JsonValue>) -> Result<u64> {
      let scope = self.connection();
      let result = self.execute_update(sql, args).await;
      self.release(scope).await;
      result
   }

   /// Insert one row into `table` from column/value pairs, in the order given
   pub async fn insert<K, V>(
      &mut self,
      table: &str,
      values: impl IntoIterator<Item = (K, V)>,
   ) -> Result<u64>
   where
      K: AsRef<str>,
      V: Into<JsonValue>,
   {
      let (columns, args): (Vec<String>, Vec<JsonValue>) = values
         .into_iter()
         .map(|(column, value)| (format!("`{}`", column.as_ref()), value.into()))
         .unzip();

      let sql = if columns.is_empty() {
         format!("insert into `{}` default values", table)
      } else {
         format!(
            "insert into `{}` ({}) values ({})",
            table,
            columns.join(","),
            vec!["?"; columns.len()].join(",")
         )
      };

      self.update(&sql, args).await
   }

   async fn fetch(&mut self, sql: &str, args: Vec<JsonValue>, first: bool) -> Result<Vec<Record>> {
      let scope = self.connection();
      let result = self.fetch_rows(sql, args, first).await;
      self.release(scope).await;
      result
   }

   async fn fetch_rows(
      &mut self,
      sql: &str,
      args: Vec<JsonValue>,
      first: bool,
   ) -> Result<Vec<Record>> {
      let start = Instant::now();
      let sql = rewrite_placeholders(sql);
      debug!("SQL: {}, ARGS: {:?}", sql, args);

      let conn = self.cursor().await?;
      let query = build_query(&sql, args);
      let outcome = if first {
         query
            .fetch_optional(&mut *conn)
            .await
            .map(|row| row.into_iter().collect::<Vec<_>>())
      } else {
         query.fetch_all(&mut *conn).await
      };
      profile(start, &sql);

      outcome?.iter().map(decode_row).collect()
   }

   async fn fetch_scalar(&mut self, sql: &str, args: Vec<JsonValue>) -> Result<Option<Record>> {
      let start = Instant::now();
      let sql = rewrite_placeholders(sql);
      debug!("SQL: {}, ARGS: {:?}", sql, args);

      let conn = self.cursor().await?;
      let columns = (&mut *conn).prepare(&sql).await?.columns().len();
      if columns != 1 {
         profile(start, &sql);
         return Err(Error::MultipleColumns(columns));
      }

      let outcome = build_query(&sql, args).fetch_optional(&mut *conn).await;
      profile(start, &sql);

      outcome?.as_ref().map(decode_row).transpose()
   }

   async fn execute_update(&mut self, sql: &str, args: Vec<JsonValue>) -> Result<u64> {
      let start = Instant::now();
      let sql = rewrite_placeholders(sql);
      debug!("SQL: {}, ARGS: {:?}", sql, args);

      let conn = self.cursor().await?;
      let outcome = build_query(&sql, args).execute(&mut *conn).await;
      profile(start, &sql);

      let rows_affected = outcome?.rows_affected();
      if self.transaction_depth() == 0 {
         debug!("auto commit");
      }
      Ok(rows_affected)
   }
}
