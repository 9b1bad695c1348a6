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

//! Two-phase catalogue validator
//!
//! Phase A checks referential integrity across the three catalogues plus
//! parameter arity; Phase B probes live database schemas for the tables and
//! columns the queries reference. The table and column extractors are
//! best-effort; their output is reported verbatim, so a misread identifier
//! fails closed as a schema error instead of being skipped.

use qgate_catalog::Catalog;
use qgate_core::Result;
use qgate_db::sql::{count_placeholders, extract_columns, extract_tables};
use qgate_db::ConnectionManager;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Outcome of one validation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
  pub successes: Vec<String>,
  pub errors: Vec<String>,
}

impl Report {
  pub fn success(&mut self, msg: impl Into<String>) {
    self.successes.push(msg.into());
  }

  pub fn error(&mut self, msg: impl Into<String>) {
    self.errors.push(msg.into());
  }

  pub fn is_ok(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn merge(&mut self, other: Report) {
    self.successes.extend(other.successes);
    self.errors.extend(other.errors);
  }
}

/// Validator lifecycle; a single pass per invocation, no concurrency inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorState {
  Idle,
  RunningChain,
  RunningSchema,
  Done { ok: bool },
}

/// Phase A over the database catalogue only.
pub fn validate_databases(catalog: &Catalog) -> Report {
  let mut report = Report::default();
  for database in catalog.databases.values() {
    if database.driver_id.trim().is_empty() {
      report.error(format!("database '{}': driverId is empty", database.name));
      continue;
    }
    match database.pool.validate() {
      Ok(()) => report.success(format!("database '{}': pool bounds ok", database.name)),
      Err(e) => report.error(format!("database '{}': {}", database.name, e)),
    }
  }
  report
}

/// Phase A over the query catalogue only.
pub fn validate_queries(catalog: &Catalog) -> Report {
  let mut report = Report::default();
  for query in catalog.queries.values() {
    if !catalog.databases.contains_key(&query.database_name) {
      report.error(format!(
        "query '{}': unknown database '{}'",
        query.name, query.database_name
      ));
    }

    let placeholders = count_placeholders(&query.sql);
    if placeholders != query.parameters.len() {
      report.error(format!(
        "query '{}': sql has {} placeholders but {} parameters declared",
        query.name,
        placeholders,
        query.parameters.len()
      ));
    } else {
      report.success(format!("query '{}': parameter arity ok", query.name));
    }

    let mut positions = HashSet::new();
    for param in &query.parameters {
      if !positions.insert(param.position) {
        report.error(format!(
          "query '{}': duplicate parameter position {}",
          query.name, param.position
        ));
      }
    }
  }
  report
}

/// Phase A over the endpoint catalogue only.
pub fn validate_endpoints(catalog: &Catalog) -> Report {
  let mut report = Report::default();
  let mut routes: HashMap<(String, String), String> = HashMap::new();

  for endpoint in catalog.endpoints.values() {
    let mut ok = true;
    if !catalog.queries.contains_key(&endpoint.query_name) {
      report.error(format!(
        "endpoint '{}': unknown query '{}'",
        endpoint.name, endpoint.query_name
      ));
      ok = false;
    }
    if let Some(count_name) = &endpoint.count_query_name {
      if !catalog.queries.contains_key(count_name) {
        report.error(format!(
          "endpoint '{}': unknown count query '{}'",
          endpoint.name, count_name
        ));
        ok = false;
      }
    }

    let route = (endpoint.method.clone(), endpoint.path.clone());
    if let Some(existing) = routes.get(&route) {
      report.error(format!(
        "endpoint '{}': duplicate route {} {} (also declared by '{}')",
        endpoint.name, endpoint.method, endpoint.path, existing
      ));
      ok = false;
    } else {
      routes.insert(route, endpoint.name.clone());
    }

    if ok {
      report.success(format!("endpoint '{}': catalogue chain ok", endpoint.name));
    }
  }
  report
}

/// Referential closure only: endpoints resolve to queries, queries resolve
/// to databases.
pub fn validate_relationships(catalog: &Catalog) -> Report {
  let mut report = Report::default();
  for endpoint in catalog.endpoints.values() {
    match catalog.queries.get(&endpoint.query_name) {
      Some(query) if catalog.databases.contains_key(&query.database_name) => {
        report.success(format!(
          "endpoint '{}' -> query '{}' -> database '{}'",
          endpoint.name, query.name, query.database_name
        ));
      }
      Some(query) => {
        report.error(format!(
          "endpoint '{}': query '{}' targets unknown database '{}'",
          endpoint.name, query.name, query.database_name
        ));
      }
      None => {
        report.error(format!(
          "endpoint '{}': unknown query '{}'",
          endpoint.name, endpoint.query_name
        ));
      }
    }
  }
  report
}

/// Full Phase A.
pub fn validate_chain(catalog: &Catalog) -> Report {
  let mut report = validate_endpoints(catalog);
  report.merge(validate_queries(catalog));
  report.merge(validate_databases(catalog));
  report
}

pub struct Validator {
  manager: Arc<ConnectionManager>,
  state: Mutex<ValidatorState>,
}

impl Validator {
  pub fn new(manager: Arc<ConnectionManager>) -> Self {
    Self { manager, state: Mutex::new(ValidatorState::Idle) }
  }

  pub fn state(&self) -> ValidatorState {
    *self.state.lock().expect("validator state lock poisoned")
  }

  fn set_state(&self, state: ValidatorState) {
    *self.state.lock().expect("validator state lock poisoned") = state;
  }

  /// Run Phase A then Phase B; merge both into one report.
  pub async fn run(&self, catalog: &Catalog) -> Report {
    self.set_state(ValidatorState::RunningChain);
    let mut report = validate_chain(catalog);

    self.set_state(ValidatorState::RunningSchema);
    report.merge(self.validate_schema(catalog).await);

    let ok = report.is_ok();
    self.set_state(ValidatorState::Done { ok });
    for line in &report.successes {
      info!("validation ok: {}", line);
    }
    report
  }

  /// Phase B: introspect each available database and check every extracted
  /// table and column. Unavailable databases fail closed.
  pub async fn validate_schema(&self, catalog: &Catalog) -> Report {
    let mut report = Report::default();

    for database in catalog.databases.values() {
      let queries = catalog.queries_for_database(&database.name);
      if queries.is_empty() {
        continue;
      }

      if !self.manager.is_available(&database.name) {
        let reason = self
          .manager
          .failure_reason(&database.name)
          .unwrap_or_else(|| "not configured".to_string());
        report.error(format!(
          "database '{}': schema validation skipped, database unavailable: {}",
          database.name, reason
        ));
        continue;
      }

      let tables = match self.introspect_tables(&database.name).await {
        Ok(tables) => tables,
        Err(e) => {
          report.error(format!("database '{}': table introspection failed: {}", database.name, e));
          continue;
        }
      };
      let table_names: HashSet<String> = tables.iter().map(|t| t.to_lowercase()).collect();

      for query in &queries {
        let referenced = extract_tables(&query.sql);
        let mut tables_ok = true;
        for table in &referenced {
          // existence is case-insensitive: uppercase and lowercase variants
          // both collapse to the same lowered key
          if table_names.contains(&table.to_lowercase()) {
            report.success(format!(
              "query '{}': table '{}' exists in '{}'",
              query.name, table, database.name
            ));
          } else {
            report.error(format!(
              "query '{}': table '{}' not found in '{}'",
              query.name, table, database.name
            ));
            tables_ok = false;
          }
        }

        if !tables_ok || referenced.is_empty() {
          continue;
        }

        // the column extractor cannot attribute columns to join sides, so
        // referenced columns are checked against the union of the query's
        // tables
        let mut known_columns = HashSet::new();
        for table in &referenced {
          match self.introspect_columns(&database.name, table).await {
            Ok(columns) => known_columns.extend(columns.into_iter().map(|c| c.to_lowercase())),
            Err(e) => {
              report.error(format!(
                "query '{}': column introspection failed for '{}': {}",
                query.name, table, e
              ));
            }
          }
        }

        for column in extract_columns(&query.sql) {
          if known_columns.contains(&column) {
            report.success(format!("query '{}': column '{}' exists", query.name, column));
          } else {
            report.error(format!(
              "query '{}': column '{}' not found in {:?}",
              query.name, column, referenced
            ));
          }
        }
      }
    }

    report
  }

  async fn introspect_tables(&self, database: &str) -> Result<Vec<String>> {
    let conn = self.manager.acquire(database).await?;
    let rows = conn
      .query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema NOT IN ('pg_catalog', 'information_schema')",
        &[],
      )
      .await
      .map_err(|e| qgate_core::GatewayError::Internal(e.to_string()))?;
    Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
  }

  async fn introspect_columns(&self, database: &str, table: &str) -> Result<Vec<String>> {
    let conn = self.manager.acquire(database).await?;
    let rows = conn
      .query(
        "SELECT column_name FROM information_schema.columns WHERE lower(table_name) = lower($1)",
        &[&table],
      )
      .await
      .map_err(|e| qgate_core::GatewayError::Internal(e.to_string()))?;
    Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use qgate_catalog::{
    DatabaseSpec, EndpointSpec, ParamType, PoolSpec, QueryParamSpec, QuerySpec, QueryType,
  };

  fn database(name: &str) -> DatabaseSpec {
    DatabaseSpec {
      name: name.to_string(),
      description: String::new(),
      url: "postgres://localhost/x".to_string(),
      username: String::new(),
      password: String::new(),
      driver_id: "postgres".to_string(),
      pool: PoolSpec::default(),
    }
  }

  fn query(name: &str, database: &str, sql: &str, params: usize) -> QuerySpec {
    QuerySpec {
      name: name.to_string(),
      description: String::new(),
      database_name: database.to_string(),
      sql: sql.to_string(),
      parameters: (0..params)
        .map(|i| QueryParamSpec {
          name: format!("p{}", i + 1),
          param_type: ParamType::String,
          required: true,
          position: i + 1,
        })
        .collect(),
      query_type: QueryType::Select,
      timeout_seconds: 30,
    }
  }

  fn endpoint(name: &str, path: &str, query: &str) -> EndpointSpec {
    EndpointSpec {
      name: name.to_string(),
      path: path.to_string(),
      method: "GET".to_string(),
      query_name: query.to_string(),
      description: String::new(),
      count_query_name: None,
      pagination: None,
      response_format: None,
      cache_enabled: None,
      cache_ttl_seconds: None,
      rate_limit_enabled: None,
      rate_limit_requests: None,
      rate_limit_window_seconds: None,
    }
  }

  fn valid_catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.databases.insert("main".to_string(), database("main"));
    catalog.queries.insert(
      "by_symbol".to_string(),
      query("by_symbol", "main", "SELECT * FROM trades WHERE symbol = ?", 1),
    );
    catalog
      .endpoints
      .insert("trades".to_string(), endpoint("trades", "/api/trades/{symbol}", "by_symbol"));
    catalog
  }

  #[test]
  fn test_valid_catalog_passes_chain() {
    let report = validate_chain(&valid_catalog());
    assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);
    assert!(!report.successes.is_empty());
  }

  #[test]
  fn test_arity_mismatch_reported() {
    let mut catalog = valid_catalog();
    catalog.queries.insert(
      "bad".to_string(),
      query("bad", "main", "SELECT * FROM t WHERE a = ? AND b = ?", 1),
    );
    let report = validate_chain(&catalog);
    assert!(!report.is_ok());
    assert!(report.errors.iter().any(|e| e.contains("'bad'")
      && e.contains("2 placeholders")
      && e.contains("1 parameters")));
  }

  #[test]
  fn test_unknown_query_reference() {
    let mut catalog = valid_catalog();
    catalog
      .endpoints
      .insert("broken".to_string(), endpoint("broken", "/api/broken", "nope"));
    let report = validate_endpoints(&catalog);
    assert!(report.errors.iter().any(|e| e.contains("'broken'") && e.contains("'nope'")));
  }

  #[test]
  fn test_unknown_count_query_reference() {
    let mut catalog = valid_catalog();
    let mut e = endpoint("paged", "/api/paged", "by_symbol");
    e.count_query_name = Some("missing_count".to_string());
    catalog.endpoints.insert("paged".to_string(), e);
    let report = validate_endpoints(&catalog);
    assert!(report.errors.iter().any(|e| e.contains("missing_count")));
  }

  #[test]
  fn test_duplicate_route_detected() {
    let mut catalog = valid_catalog();
    catalog
      .endpoints
      .insert("dup-a".to_string(), endpoint("dup-a", "/api/same", "by_symbol"));
    catalog
      .endpoints
      .insert("dup-b".to_string(), endpoint("dup-b", "/api/same", "by_symbol"));
    let report = validate_endpoints(&catalog);
    assert!(report.errors.iter().any(|e| e.contains("duplicate route")));
  }

  #[test]
  fn test_unknown_database_reference() {
    let mut catalog = valid_catalog();
    catalog.queries.insert("orphan".to_string(), query("orphan", "ghost", "SELECT 1", 0));
    let report = validate_queries(&catalog);
    assert!(report.errors.iter().any(|e| e.contains("'orphan'") && e.contains("'ghost'")));
  }

  #[test]
  fn test_duplicate_positions_detected() {
    let mut catalog = valid_catalog();
    let mut q = query("dup_pos", "main", "SELECT * FROM t WHERE a = ? AND b = ?", 2);
    q.parameters[1].position = 1;
    catalog.queries.insert("dup_pos".to_string(), q);
    let report = validate_queries(&catalog);
    assert!(report.errors.iter().any(|e| e.contains("duplicate parameter position")));
  }

  #[test]
  fn test_relationships_walk_the_chain() {
    let report = validate_relationships(&valid_catalog());
    assert!(report.is_ok());
    assert!(report.successes[0].contains("endpoint 'trades'"));
    assert!(report.successes[0].contains("database 'main'"));
  }

  #[test]
  fn test_report_idempotent_for_same_catalog() {
    let catalog = valid_catalog();
    let a = validate_chain(&catalog);
    let b = validate_chain(&catalog);
    assert_eq!(a.successes, b.successes);
    assert_eq!(a.errors, b.errors);
  }

  #[tokio::test]
  async fn test_schema_phase_fails_closed_for_unavailable_database() {
    let catalog = valid_catalog();
    let manager = Arc::new(ConnectionManager::empty());
    let validator = Validator::new(manager);
    let report = validator.validate_schema(&catalog).await;
    assert!(!report.is_ok());
    assert!(report.errors[0].contains("database 'main'"));
    assert!(report.errors[0].contains("unavailable"));
  }

  #[tokio::test]
  async fn test_state_machine_reaches_done() {
    let catalog = valid_catalog();
    let validator = Validator::new(Arc::new(ConnectionManager::empty()));
    assert_eq!(validator.state(), ValidatorState::Idle);
    let report = validator.run(&catalog).await;
    // schema phase failed closed, so the pass is Done(fail)
    assert_eq!(validator.state(), ValidatorState::Done { ok: false });
    assert!(!report.is_ok());
  }
}
