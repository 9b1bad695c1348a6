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

//! Catalogue entity types
//!
//! The three catalogues (databases, queries, endpoints) parameterise the
//! whole gateway. These structs are the wire shape for both the YAML
//! documents and the admin JSON surface, so field names follow the
//! camelCase catalogue convention.

use qgate_core::PAGINATION_SIZE_CEILING;
use serde::{Deserialize, Serialize};

/// Pool sizing and timeout settings for one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
  #[serde(default = "default_maximum_pool_size")]
  pub maximum_pool_size: u32,

  #[serde(default = "default_minimum_idle")]
  pub minimum_idle: u32,

  #[serde(default = "default_connection_timeout_ms")]
  pub connection_timeout_ms: u64,

  #[serde(default = "default_idle_timeout_ms")]
  pub idle_timeout_ms: u64,

  #[serde(default = "default_max_lifetime_ms")]
  pub max_lifetime_ms: u64,

  #[serde(default = "default_leak_detection_threshold_ms")]
  pub leak_detection_threshold_ms: u64,

  #[serde(default = "default_connection_test_query")]
  pub connection_test_query: String,
}

fn default_maximum_pool_size() -> u32 {
  10
}
fn default_minimum_idle() -> u32 {
  2
}
fn default_connection_timeout_ms() -> u64 {
  30_000
}
fn default_idle_timeout_ms() -> u64 {
  600_000
}
fn default_max_lifetime_ms() -> u64 {
  1_800_000
}
fn default_leak_detection_threshold_ms() -> u64 {
  60_000
}
fn default_connection_test_query() -> String {
  "SELECT 1".to_string()
}

impl Default for PoolSpec {
  fn default() -> Self {
    Self {
      maximum_pool_size: default_maximum_pool_size(),
      minimum_idle: default_minimum_idle(),
      connection_timeout_ms: default_connection_timeout_ms(),
      idle_timeout_ms: default_idle_timeout_ms(),
      max_lifetime_ms: default_max_lifetime_ms(),
      leak_detection_threshold_ms: default_leak_detection_threshold_ms(),
      connection_test_query: default_connection_test_query(),
    }
  }
}

impl PoolSpec {
  pub fn validate(&self) -> Result<(), String> {
    if self.maximum_pool_size < self.minimum_idle {
      return Err(format!(
        "maximumPoolSize ({}) must be >= minimumIdle ({})",
        self.maximum_pool_size, self.minimum_idle
      ));
    }
    if self.maximum_pool_size == 0 {
      return Err("maximumPoolSize must be > 0".to_string());
    }
    if self.connection_timeout_ms == 0 || self.idle_timeout_ms == 0 || self.max_lifetime_ms == 0 {
      return Err("pool timeouts must be strictly positive".to_string());
    }
    if self.connection_test_query.trim().is_empty() {
      return Err("connectionTestQuery must not be empty".to_string());
    }
    Ok(())
  }
}

/// One named pooled data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
  pub name: String,

  #[serde(default)]
  pub description: String,

  pub url: String,

  #[serde(default)]
  pub username: String,

  #[serde(default)]
  pub password: String,

  /// Opaque token identifying the driver; must resolve at pool build.
  pub driver_id: String,

  #[serde(default)]
  pub pool: PoolSpec,
}

impl DatabaseSpec {
  pub fn validate(&self) -> Result<(), String> {
    validate_catalog_name(&self.name, "database name")?;
    if self.url.trim().is_empty() {
      return Err(format!("database '{}': url must not be empty", self.name));
    }
    if self.driver_id.trim().is_empty() {
      return Err(format!("database '{}': driverId must not be empty", self.name));
    }
    self.pool.validate().map_err(|e| format!("database '{}': {}", self.name, e))
  }
}

/// SQL bind types supported by the parameter binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
  String,
  Integer,
  Long,
  Decimal,
  Boolean,
  Timestamp,
}

impl std::fmt::Display for ParamType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ParamType::String => write!(f, "STRING"),
      ParamType::Integer => write!(f, "INTEGER"),
      ParamType::Long => write!(f, "LONG"),
      ParamType::Decimal => write!(f, "DECIMAL"),
      ParamType::Boolean => write!(f, "BOOLEAN"),
      ParamType::Timestamp => write!(f, "TIMESTAMP"),
    }
  }
}

/// One positional bind parameter of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParamSpec {
  pub name: String,

  #[serde(rename = "type")]
  pub param_type: ParamType,

  #[serde(default = "default_required")]
  pub required: bool,

  /// 1-based bind position, dense from 1. Zero means "assign from
  /// declaration order" and is normalised on load.
  #[serde(default)]
  pub position: usize,
}

fn default_required() -> bool {
  true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
  #[default]
  Select,
  Update,
}

impl std::fmt::Display for QueryType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      QueryType::Select => write!(f, "SELECT"),
      QueryType::Update => write!(f, "UPDATE"),
    }
  }
}

impl std::str::FromStr for QueryType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "SELECT" => Ok(QueryType::Select),
      "UPDATE" => Ok(QueryType::Update),
      other => Err(format!("unknown query type: {}", other)),
    }
  }
}

/// A named parameterised SQL statement bound to one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
  pub name: String,

  #[serde(default)]
  pub description: String,

  pub database_name: String,

  /// Parameterised via positional `?` placeholders.
  pub sql: String,

  #[serde(default)]
  pub parameters: Vec<QueryParamSpec>,

  #[serde(default)]
  pub query_type: QueryType,

  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
  30
}

impl QuerySpec {
  /// Assign declaration-order positions to parameters that did not carry
  /// an explicit one.
  pub fn normalize(&mut self) {
    for (i, p) in self.parameters.iter_mut().enumerate() {
      if p.position == 0 {
        p.position = i + 1;
      }
    }
  }

  pub fn validate(&self) -> Result<(), String> {
    validate_catalog_name(&self.name, "query name")?;
    if self.database_name.trim().is_empty() {
      return Err(format!("query '{}': databaseName must not be empty", self.name));
    }
    if self.sql.trim().is_empty() {
      return Err(format!("query '{}': sql must not be empty", self.name));
    }
    if self.timeout_seconds == 0 {
      return Err(format!("query '{}': timeoutSeconds must be > 0", self.name));
    }
    for (i, p) in self.parameters.iter().enumerate() {
      if p.name.trim().is_empty() {
        return Err(format!("query '{}': parameter {} has no name", self.name, i + 1));
      }
      if p.position != i + 1 {
        return Err(format!(
          "query '{}': parameter '{}' has position {}, expected {}",
          self.name,
          p.name,
          p.position,
          i + 1
        ));
      }
    }
    Ok(())
  }
}

/// Pagination settings for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSpec {
  #[serde(default)]
  pub enabled: bool,

  #[serde(default = "default_page_size")]
  pub default_size: u32,

  #[serde(default = "default_max_size")]
  pub max_size: u32,
}

fn default_page_size() -> u32 {
  20
}
fn default_max_size() -> u32 {
  100
}

impl Default for PaginationSpec {
  fn default() -> Self {
    Self { enabled: false, default_size: default_page_size(), max_size: default_max_size() }
  }
}

impl PaginationSpec {
  pub fn validate(&self) -> Result<(), String> {
    if !self.enabled {
      return Ok(());
    }
    if self.default_size == 0 {
      return Err("pagination.defaultSize must be > 0".to_string());
    }
    if self.default_size > self.max_size {
      return Err(format!(
        "pagination.defaultSize ({}) must be <= maxSize ({})",
        self.default_size, self.max_size
      ));
    }
    if self.max_size > PAGINATION_SIZE_CEILING {
      return Err(format!("pagination.maxSize must be <= {}", PAGINATION_SIZE_CEILING));
    }
    Ok(())
  }
}

const KNOWN_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// One declared REST route over a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
  pub name: String,

  /// Path template with `{segment}` placeholders.
  pub path: String,

  #[serde(default = "default_method")]
  pub method: String,

  pub query_name: String,

  #[serde(default)]
  pub description: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub count_query_name: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pagination: Option<PaginationSpec>,

  // Stored verbatim and exposed, never honoured by the dispatch engine.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response_format: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cache_enabled: Option<bool>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cache_ttl_seconds: Option<i64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rate_limit_enabled: Option<bool>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rate_limit_requests: Option<i64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rate_limit_window_seconds: Option<i64>,
}

fn default_method() -> String {
  "GET".to_string()
}

impl EndpointSpec {
  /// Uppercase the method so `(method, path)` comparisons are canonical.
  pub fn normalize(&mut self) {
    self.method = self.method.to_uppercase();
  }

  pub fn validate(&self) -> Result<(), String> {
    validate_catalog_name(&self.name, "endpoint name")?;
    if !self.path.starts_with('/') {
      return Err(format!("endpoint '{}': path must start with '/'", self.name));
    }
    if !KNOWN_METHODS.contains(&self.method.to_uppercase().as_str()) {
      return Err(format!("endpoint '{}': unknown method '{}'", self.name, self.method));
    }
    if self.query_name.trim().is_empty() {
      return Err(format!("endpoint '{}': queryName must not be empty", self.name));
    }
    if let Some(p) = &self.pagination {
      p.validate().map_err(|e| format!("endpoint '{}': {}", self.name, e))?;
    }
    Ok(())
  }

  /// Whether pagination is switched on for this endpoint.
  pub fn paginated(&self) -> bool {
    self.pagination.as_ref().map(|p| p.enabled).unwrap_or(false)
  }

  /// Aggregation key used by the metrics collector: `"METHOD /path/{template}"`.
  pub fn aggregate_key(&self) -> String {
    format!("{} {}", self.method, self.path)
  }
}

/// Names must be non-empty ASCII identifiers (letters, digits, `_`, `-`;
/// leading letter or underscore).
pub fn validate_catalog_name(name: &str, what: &str) -> Result<(), String> {
  if name.is_empty() {
    return Err(format!("{} must not be empty", what));
  }
  let first = name.chars().next().unwrap();
  if !first.is_ascii_alphabetic() && first != '_' {
    return Err(format!("{} '{}' must start with a letter or underscore", what, name));
  }
  for c in name.chars() {
    if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
      return Err(format!("{} '{}' contains invalid character '{}'", what, name, c));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_database() -> DatabaseSpec {
    DatabaseSpec {
      name: "analytics".to_string(),
      description: "primary analytics source".to_string(),
      url: "postgres://localhost/analytics".to_string(),
      username: "qgate".to_string(),
      password: "secret".to_string(),
      driver_id: "postgres".to_string(),
      pool: PoolSpec::default(),
    }
  }

  #[test]
  fn test_pool_spec_defaults() {
    let pool = PoolSpec::default();
    assert_eq!(pool.maximum_pool_size, 10);
    assert_eq!(pool.minimum_idle, 2);
    assert_eq!(pool.connection_timeout_ms, 30_000);
    assert_eq!(pool.idle_timeout_ms, 600_000);
    assert_eq!(pool.max_lifetime_ms, 1_800_000);
    assert_eq!(pool.leak_detection_threshold_ms, 60_000);
    assert_eq!(pool.connection_test_query, "SELECT 1");
    assert!(pool.validate().is_ok());
  }

  #[test]
  fn test_pool_spec_rejects_inverted_sizes() {
    let pool = PoolSpec { maximum_pool_size: 1, minimum_idle: 5, ..PoolSpec::default() };
    assert!(pool.validate().is_err());
  }

  #[test]
  fn test_pool_spec_rejects_zero_timeout() {
    let pool = PoolSpec { connection_timeout_ms: 0, ..PoolSpec::default() };
    assert!(pool.validate().is_err());
  }

  #[test]
  fn test_database_spec_validates() {
    assert!(sample_database().validate().is_ok());

    let mut bad = sample_database();
    bad.url = "".to_string();
    assert!(bad.validate().is_err());

    let mut bad = sample_database();
    bad.driver_id = " ".to_string();
    assert!(bad.validate().is_err());
  }

  #[test]
  fn test_param_type_display() {
    assert_eq!(ParamType::String.to_string(), "STRING");
    assert_eq!(ParamType::Integer.to_string(), "INTEGER");
    assert_eq!(ParamType::Long.to_string(), "LONG");
    assert_eq!(ParamType::Decimal.to_string(), "DECIMAL");
    assert_eq!(ParamType::Boolean.to_string(), "BOOLEAN");
    assert_eq!(ParamType::Timestamp.to_string(), "TIMESTAMP");
  }

  #[test]
  fn test_param_type_yaml_round_trip() {
    let yaml = "type: TIMESTAMP\nname: from\n";
    let param: QueryParamSpec = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(param.param_type, ParamType::Timestamp);
    assert!(param.required);
    assert_eq!(param.position, 0);
  }

  #[test]
  fn test_query_normalize_assigns_dense_positions() {
    let mut query = QuerySpec {
      name: "by_symbol".to_string(),
      description: String::new(),
      database_name: "analytics".to_string(),
      sql: "SELECT * FROM stock_trades WHERE symbol = ?".to_string(),
      parameters: vec![QueryParamSpec {
        name: "symbol".to_string(),
        param_type: ParamType::String,
        required: true,
        position: 0,
      }],
      query_type: QueryType::Select,
      timeout_seconds: 30,
    };
    query.normalize();
    assert_eq!(query.parameters[0].position, 1);
    assert!(query.validate().is_ok());
  }

  #[test]
  fn test_query_validate_rejects_sparse_positions() {
    let query = QuerySpec {
      name: "bad".to_string(),
      description: String::new(),
      database_name: "analytics".to_string(),
      sql: "SELECT 1".to_string(),
      parameters: vec![QueryParamSpec {
        name: "a".to_string(),
        param_type: ParamType::Integer,
        required: true,
        position: 3,
      }],
      query_type: QueryType::Select,
      timeout_seconds: 30,
    };
    assert!(query.validate().is_err());
  }

  #[test]
  fn test_query_type_parse() {
    assert_eq!("select".parse::<QueryType>().unwrap(), QueryType::Select);
    assert_eq!("UPDATE".parse::<QueryType>().unwrap(), QueryType::Update);
    assert!("MERGE".parse::<QueryType>().is_err());
  }

  #[test]
  fn test_pagination_bounds() {
    let p = PaginationSpec { enabled: true, default_size: 20, max_size: 100 };
    assert!(p.validate().is_ok());

    let p = PaginationSpec { enabled: true, default_size: 0, max_size: 100 };
    assert!(p.validate().is_err());

    let p = PaginationSpec { enabled: true, default_size: 200, max_size: 100 };
    assert!(p.validate().is_err());

    let p = PaginationSpec { enabled: true, default_size: 20, max_size: 20_000 };
    assert!(p.validate().is_err());

    // disabled pagination is never checked
    let p = PaginationSpec { enabled: false, default_size: 0, max_size: 0 };
    assert!(p.validate().is_ok());
  }

  #[test]
  fn test_endpoint_normalize_and_key() {
    let mut e = EndpointSpec {
      name: "trades-by-symbol".to_string(),
      path: "/api/generic/stock-trades/symbol/{symbol}".to_string(),
      method: "get".to_string(),
      query_name: "by_symbol".to_string(),
      description: String::new(),
      count_query_name: None,
      pagination: None,
      response_format: None,
      cache_enabled: None,
      cache_ttl_seconds: None,
      rate_limit_enabled: None,
      rate_limit_requests: None,
      rate_limit_window_seconds: None,
    };
    e.normalize();
    assert_eq!(e.method, "GET");
    assert_eq!(e.aggregate_key(), "GET /api/generic/stock-trades/symbol/{symbol}");
    assert!(e.validate().is_ok());
    assert!(!e.paginated());
  }

  #[test]
  fn test_endpoint_rejects_relative_path() {
    let mut e = EndpointSpec {
      name: "bad".to_string(),
      path: "api/no-slash".to_string(),
      method: "GET".to_string(),
      query_name: "q".to_string(),
      description: String::new(),
      count_query_name: None,
      pagination: None,
      response_format: None,
      cache_enabled: None,
      cache_ttl_seconds: None,
      rate_limit_enabled: None,
      rate_limit_requests: None,
      rate_limit_window_seconds: None,
    };
    e.normalize();
    assert!(e.validate().is_err());
  }

  #[test]
  fn test_validate_catalog_name() {
    assert!(validate_catalog_name("stock_trades", "name").is_ok());
    assert!(validate_catalog_name("stock-trades-2", "name").is_ok());
    assert!(validate_catalog_name("_internal", "name").is_ok());
    assert!(validate_catalog_name("", "name").is_err());
    assert!(validate_catalog_name("9lives", "name").is_err());
    assert!(validate_catalog_name("has space", "name").is_err());
  }

  #[test]
  fn test_database_yaml_defaults_applied() {
    let yaml = r#"
name: staging
url: postgres://staging-host/app
driverId: postgres
"#;
    let spec: DatabaseSpec = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(spec.pool.maximum_pool_size, 10);
    assert_eq!(spec.username, "");
    assert!(spec.validate().is_ok());
  }
}
