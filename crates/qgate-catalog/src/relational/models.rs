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

//! Row models for the relational catalogue tables
//!
//! Durable endpoint attributes deliberately exclude pagination, parameter
//! lists and count-query references; an endpoint reloaded from this store
//! comes back with pagination disabled.

use super::schema::{config_databases, config_endpoints, config_queries};
use crate::spec::{DatabaseSpec, EndpointSpec, PoolSpec, QueryParamSpec, QuerySpec};
use crate::store::{StoreError, StoreResult};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Identifiable, Debug, Clone)]
#[diesel(table_name = config_databases)]
pub struct DatabaseRow {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub url: String,
  pub username: Option<String>,
  pub password: Option<String>,
  pub driver_id: String,
  pub maximum_pool_size: i32,
  pub minimum_idle: i32,
  pub connection_timeout_ms: i64,
  pub idle_timeout_ms: i64,
  pub max_lifetime_ms: i64,
  pub leak_detection_threshold_ms: i64,
  pub connection_test_query: String,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = config_databases)]
pub struct NewDatabaseRow {
  pub name: String,
  pub description: Option<String>,
  pub url: String,
  pub username: Option<String>,
  pub password: Option<String>,
  pub driver_id: String,
  pub maximum_pool_size: i32,
  pub minimum_idle: i32,
  pub connection_timeout_ms: i64,
  pub idle_timeout_ms: i64,
  pub max_lifetime_ms: i64,
  pub leak_detection_threshold_ms: i64,
  pub connection_test_query: String,
}

impl From<DatabaseRow> for DatabaseSpec {
  fn from(row: DatabaseRow) -> Self {
    DatabaseSpec {
      name: row.name,
      description: row.description.unwrap_or_default(),
      url: row.url,
      username: row.username.unwrap_or_default(),
      password: row.password.unwrap_or_default(),
      driver_id: row.driver_id,
      pool: PoolSpec {
        maximum_pool_size: row.maximum_pool_size.max(0) as u32,
        minimum_idle: row.minimum_idle.max(0) as u32,
        connection_timeout_ms: row.connection_timeout_ms.max(0) as u64,
        idle_timeout_ms: row.idle_timeout_ms.max(0) as u64,
        max_lifetime_ms: row.max_lifetime_ms.max(0) as u64,
        leak_detection_threshold_ms: row.leak_detection_threshold_ms.max(0) as u64,
        connection_test_query: row.connection_test_query,
      },
    }
  }
}

impl From<&DatabaseSpec> for NewDatabaseRow {
  fn from(spec: &DatabaseSpec) -> Self {
    NewDatabaseRow {
      name: spec.name.clone(),
      description: none_if_empty(&spec.description),
      url: spec.url.clone(),
      username: none_if_empty(&spec.username),
      password: none_if_empty(&spec.password),
      driver_id: spec.driver_id.clone(),
      maximum_pool_size: spec.pool.maximum_pool_size as i32,
      minimum_idle: spec.pool.minimum_idle as i32,
      connection_timeout_ms: spec.pool.connection_timeout_ms as i64,
      idle_timeout_ms: spec.pool.idle_timeout_ms as i64,
      max_lifetime_ms: spec.pool.max_lifetime_ms as i64,
      leak_detection_threshold_ms: spec.pool.leak_detection_threshold_ms as i64,
      connection_test_query: spec.pool.connection_test_query.clone(),
    }
  }
}

#[derive(Queryable, Identifiable, Debug, Clone)]
#[diesel(table_name = config_queries)]
pub struct QueryRow {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub database_name: String,
  pub sql: String,
  pub parameters: String,
  pub query_type: String,
  pub timeout_seconds: i64,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = config_queries)]
pub struct NewQueryRow {
  pub name: String,
  pub description: Option<String>,
  pub database_name: String,
  pub sql: String,
  pub parameters: String,
  pub query_type: String,
  pub timeout_seconds: i64,
}

impl QueryRow {
  pub fn into_spec(self) -> StoreResult<QuerySpec> {
    let parameters: Vec<QueryParamSpec> = serde_json::from_str(&self.parameters)?;
    let query_type = self
      .query_type
      .parse()
      .map_err(|e: String| StoreError::Invalid(format!("query '{}': {}", self.name, e)))?;
    let mut spec = QuerySpec {
      name: self.name,
      description: self.description.unwrap_or_default(),
      database_name: self.database_name,
      sql: self.sql,
      parameters,
      query_type,
      timeout_seconds: self.timeout_seconds.max(0) as u64,
    };
    spec.normalize();
    Ok(spec)
  }
}

impl TryFrom<&QuerySpec> for NewQueryRow {
  type Error = StoreError;

  fn try_from(spec: &QuerySpec) -> StoreResult<Self> {
    Ok(NewQueryRow {
      name: spec.name.clone(),
      description: none_if_empty(&spec.description),
      database_name: spec.database_name.clone(),
      sql: spec.sql.clone(),
      parameters: serde_json::to_string(&spec.parameters)?,
      query_type: spec.query_type.to_string(),
      timeout_seconds: spec.timeout_seconds as i64,
    })
  }
}

#[derive(Queryable, Identifiable, Debug, Clone)]
#[diesel(table_name = config_endpoints)]
pub struct EndpointRow {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub path: String,
  pub method: String,
  pub query_name: String,
  pub response_format: Option<String>,
  pub cache_enabled: Option<bool>,
  pub cache_ttl_seconds: Option<i64>,
  pub rate_limit_enabled: Option<bool>,
  pub rate_limit_requests: Option<i64>,
  pub rate_limit_window_seconds: Option<i64>,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = config_endpoints)]
pub struct NewEndpointRow {
  pub name: String,
  pub description: Option<String>,
  pub path: String,
  pub method: String,
  pub query_name: String,
  pub response_format: Option<String>,
  pub cache_enabled: Option<bool>,
  pub cache_ttl_seconds: Option<i64>,
  pub rate_limit_enabled: Option<bool>,
  pub rate_limit_requests: Option<i64>,
  pub rate_limit_window_seconds: Option<i64>,
}

impl From<EndpointRow> for EndpointSpec {
  fn from(row: EndpointRow) -> Self {
    let mut spec = EndpointSpec {
      name: row.name,
      path: row.path,
      method: row.method,
      query_name: row.query_name,
      description: row.description.unwrap_or_default(),
      count_query_name: None,
      pagination: None,
      response_format: row.response_format,
      cache_enabled: row.cache_enabled,
      cache_ttl_seconds: row.cache_ttl_seconds,
      rate_limit_enabled: row.rate_limit_enabled,
      rate_limit_requests: row.rate_limit_requests,
      rate_limit_window_seconds: row.rate_limit_window_seconds,
    };
    spec.normalize();
    spec
  }
}

impl From<&EndpointSpec> for NewEndpointRow {
  fn from(spec: &EndpointSpec) -> Self {
    NewEndpointRow {
      name: spec.name.clone(),
      description: none_if_empty(&spec.description),
      path: spec.path.clone(),
      method: spec.method.clone(),
      query_name: spec.query_name.clone(),
      response_format: spec.response_format.clone(),
      cache_enabled: spec.cache_enabled,
      cache_ttl_seconds: spec.cache_ttl_seconds,
      rate_limit_enabled: spec.rate_limit_enabled,
      rate_limit_requests: spec.rate_limit_requests,
      rate_limit_window_seconds: spec.rate_limit_window_seconds,
    }
  }
}

fn none_if_empty(s: &str) -> Option<String> {
  if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::spec::{ParamType, QueryType};

  #[test]
  fn test_query_row_round_trip() {
    let spec = QuerySpec {
      name: "by_symbol".to_string(),
      description: "trades for one symbol".to_string(),
      database_name: "analytics".to_string(),
      sql: "SELECT * FROM stock_trades WHERE symbol = ?".to_string(),
      parameters: vec![QueryParamSpec {
        name: "symbol".to_string(),
        param_type: ParamType::String,
        required: true,
        position: 1,
      }],
      query_type: QueryType::Select,
      timeout_seconds: 30,
    };

    let new_row = NewQueryRow::try_from(&spec).unwrap();
    let row = QueryRow {
      id: 1,
      name: new_row.name,
      description: new_row.description,
      database_name: new_row.database_name,
      sql: new_row.sql,
      parameters: new_row.parameters,
      query_type: new_row.query_type,
      timeout_seconds: new_row.timeout_seconds,
      created_at: chrono::Utc::now().naive_utc(),
      updated_at: chrono::Utc::now().naive_utc(),
    };
    assert_eq!(row.into_spec().unwrap(), spec);
  }

  #[test]
  fn test_endpoint_row_drops_pagination() {
    let spec = EndpointSpec {
      name: "trades".to_string(),
      path: "/api/generic/stock-trades".to_string(),
      method: "GET".to_string(),
      query_name: "all".to_string(),
      description: String::new(),
      count_query_name: Some("count".to_string()),
      pagination: Some(crate::spec::PaginationSpec {
        enabled: true,
        default_size: 20,
        max_size: 100,
      }),
      response_format: Some("json".to_string()),
      cache_enabled: Some(false),
      cache_ttl_seconds: None,
      rate_limit_enabled: None,
      rate_limit_requests: None,
      rate_limit_window_seconds: None,
    };

    let new_row = NewEndpointRow::from(&spec);
    let row = EndpointRow {
      id: 1,
      name: new_row.name,
      description: new_row.description,
      path: new_row.path,
      method: new_row.method,
      query_name: new_row.query_name,
      response_format: new_row.response_format,
      cache_enabled: new_row.cache_enabled,
      cache_ttl_seconds: new_row.cache_ttl_seconds,
      rate_limit_enabled: new_row.rate_limit_enabled,
      rate_limit_requests: new_row.rate_limit_requests,
      rate_limit_window_seconds: new_row.rate_limit_window_seconds,
      created_at: chrono::Utc::now().naive_utc(),
      updated_at: chrono::Utc::now().naive_utc(),
    };
    let reloaded = EndpointSpec::from(row);
    assert!(reloaded.pagination.is_none());
    assert!(reloaded.count_query_name.is_none());
    assert_eq!(reloaded.response_format.as_deref(), Some("json"));
  }

  #[test]
  fn test_query_row_rejects_bad_type() {
    let row = QueryRow {
      id: 1,
      name: "bad".to_string(),
      description: None,
      database_name: "analytics".to_string(),
      sql: "SELECT 1".to_string(),
      parameters: "[]".to_string(),
      query_type: "MERGE".to_string(),
      timeout_seconds: 30,
      created_at: chrono::Utc::now().naive_utc(),
      updated_at: chrono::Utc::now().naive_utc(),
    };
    assert!(matches!(row.into_spec(), Err(StoreError::Invalid(_))));
  }
}
