/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Query executor
//!
//! Runs a catalogue query against the pool for its target database. A
//! checkout lives exactly as long as one execution; release happens on
//! every exit path because the scoped connection returns on drop.

use crate::manager::{pg_reason, ConnectionManager};
use crate::rows::row_to_record;
use crate::sql::rewrite_placeholders;
use chrono::NaiveDateTime;
use qgate_catalog::{QuerySpec, QueryType};
use qgate_core::{GatewayError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tracing::debug;

static SQL_NULL: Option<String> = None;

/// A typed bind value produced by the parameter binder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
  Text(String),
  Int(i32),
  Long(i64),
  Decimal(Decimal),
  Bool(bool),
  Timestamp(NaiveDateTime),
  Null,
}

impl BindValue {
  /// Borrow as a wire-encodable parameter.
  pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
    match self {
      BindValue::Text(v) => v,
      BindValue::Int(v) => v,
      BindValue::Long(v) => v,
      BindValue::Decimal(v) => v,
      BindValue::Bool(v) => v,
      BindValue::Timestamp(v) => v,
      BindValue::Null => &SQL_NULL,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      BindValue::Text(_) => "STRING",
      BindValue::Int(_) => "INTEGER",
      BindValue::Long(_) => "LONG",
      BindValue::Decimal(_) => "DECIMAL",
      BindValue::Bool(_) => "BOOLEAN",
      BindValue::Timestamp(_) => "TIMESTAMP",
      BindValue::Null => "NULL",
    }
  }
}

/// One ordered `column -> value` record.
pub type Record = Map<String, Value>;

pub struct QueryExecutor {
  manager: Arc<ConnectionManager>,
}

impl QueryExecutor {
  pub fn new(manager: Arc<ConnectionManager>) -> Self {
    Self { manager }
  }

  pub fn manager(&self) -> &Arc<ConnectionManager> {
    &self.manager
  }

  /// Execute a catalogue query with positional binds and materialise the
  /// result set. UPDATE-type queries yield a single `rows_affected` record.
  pub async fn execute(&self, query: &QuerySpec, binds: &[BindValue]) -> Result<Vec<Record>> {
    let (sql, expected) = rewrite_placeholders(&query.sql);
    if expected != binds.len() {
      return Err(GatewayError::Internal(format!(
        "query '{}' expects {} bind values, got {}",
        query.name,
        expected,
        binds.len()
      )));
    }

    let conn = self.manager.acquire(&query.database_name).await?;
    let params: Vec<&(dyn ToSql + Sync)> = binds.iter().map(BindValue::as_sql).collect();
    debug!(query = %query.name, binds = binds.len(), "executing");

    let work = async {
      match query.query_type {
        QueryType::Select => {
          let rows = conn.query(&sql, &params).await.map_err(|e| {
            GatewayError::Internal(format!("query '{}' failed: {}", query.name, pg_reason(&e)))
          })?;
          rows.iter().map(row_to_record).collect::<Result<Vec<Record>>>()
        }
        QueryType::Update => {
          let affected = conn.execute(&sql, &params).await.map_err(|e| {
            GatewayError::Internal(format!("query '{}' failed: {}", query.name, pg_reason(&e)))
          })?;
          let mut record = Record::new();
          record.insert("rows_affected".to_string(), Value::Number(Number::from(affected)));
          Ok(vec![record])
        }
      }
    };

    tokio::time::timeout(Duration::from_secs(query.timeout_seconds), work).await.map_err(|_| {
      GatewayError::Internal(format!(
        "query '{}' timed out after {}s",
        query.name, query.timeout_seconds
      ))
    })?
  }

  /// Run a count query and read the first column of the first row as a
  /// non-negative integer.
  pub async fn execute_count(&self, query: &QuerySpec, binds: &[BindValue]) -> Result<i64> {
    let rows = self.execute(query, binds).await?;
    let first = rows
      .first()
      .and_then(|record| record.values().next())
      .ok_or_else(|| GatewayError::Internal(format!("bad count query '{}'", query.name)))?;

    let total = match first {
      Value::Number(n) => n.as_i64(),
      Value::String(s) => s.parse::<Decimal>().ok().and_then(|d| d.to_i64()),
      _ => None,
    }
    .ok_or_else(|| GatewayError::Internal(format!("bad count query '{}'", query.name)))?;

    if total < 0 {
      return Err(GatewayError::Internal(format!("bad count query '{}'", query.name)));
    }
    Ok(total)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bind_value_type_names() {
    assert_eq!(BindValue::Text("x".to_string()).type_name(), "STRING");
    assert_eq!(BindValue::Int(1).type_name(), "INTEGER");
    assert_eq!(BindValue::Long(1).type_name(), "LONG");
    assert_eq!(BindValue::Bool(true).type_name(), "BOOLEAN");
    assert_eq!(BindValue::Null.type_name(), "NULL");
  }

  #[tokio::test]
  async fn test_execute_arity_mismatch_is_internal_error() {
    let executor = QueryExecutor::new(Arc::new(ConnectionManager::empty()));
    let query = QuerySpec {
      name: "two_params".to_string(),
      description: String::new(),
      database_name: "main".to_string(),
      sql: "SELECT * FROM t WHERE a = ? AND b = ?".to_string(),
      parameters: vec![],
      query_type: QueryType::Select,
      timeout_seconds: 5,
    };
    let err = executor.execute(&query, &[BindValue::Int(1)]).await.unwrap_err();
    match err {
      GatewayError::Internal(msg) => {
        assert!(msg.contains("expects 2 bind values"));
      }
      other => panic!("expected Internal, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_execute_unknown_database() {
    let executor = QueryExecutor::new(Arc::new(ConnectionManager::empty()));
    let query = QuerySpec {
      name: "nodb".to_string(),
      description: String::new(),
      database_name: "missing".to_string(),
      sql: "SELECT 1".to_string(),
      parameters: vec![],
      query_type: QueryType::Select,
      timeout_seconds: 5,
    };
    let err = executor.execute(&query, &[]).await.unwrap_err();
    assert!(matches!(err, GatewayError::DatabaseUnknown(_)));
  }
}
