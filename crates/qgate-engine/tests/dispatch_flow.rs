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

//! End-to-end engine scenarios that do not need a live database: route
//! resolution against a catalogue, dispatch-level error shaping, and the
//! validator gate.

use qgate_catalog::{
  Catalog, DatabaseSpec, EndpointSpec, PaginationSpec, ParamType, PoolSpec, QueryParamSpec,
  QuerySpec, QueryType,
};
use qgate_core::GatewayError;
use qgate_db::{ConnectionManager, QueryExecutor};
use qgate_engine::{validate_chain, DispatchEngine, ParamMap};
use serde_json::json;
use std::sync::Arc;

fn stock_trades_catalog() -> Catalog {
  let mut catalog = Catalog::default();

  catalog.databases.insert(
    "analytics".to_string(),
    DatabaseSpec {
      name: "analytics".to_string(),
      description: String::new(),
      url: "postgres://localhost/analytics".to_string(),
      username: String::new(),
      password: String::new(),
      driver_id: "postgres".to_string(),
      pool: PoolSpec::default(),
    },
  );

  catalog.queries.insert(
    "all".to_string(),
    QuerySpec {
      name: "all".to_string(),
      description: String::new(),
      database_name: "analytics".to_string(),
      sql: "SELECT * FROM stock_trades ORDER BY id LIMIT ? OFFSET ?".to_string(),
      parameters: vec![
        QueryParamSpec {
          name: "limit".to_string(),
          param_type: ParamType::Integer,
          required: true,
          position: 1,
        },
        QueryParamSpec {
          name: "offset".to_string(),
          param_type: ParamType::Integer,
          required: true,
          position: 2,
        },
      ],
      query_type: QueryType::Select,
      timeout_seconds: 30,
    },
  );

  catalog.queries.insert(
    "by_id".to_string(),
    QuerySpec {
      name: "by_id".to_string(),
      description: String::new(),
      database_name: "analytics".to_string(),
      sql: "SELECT * FROM stock_trades WHERE id = ?".to_string(),
      parameters: vec![QueryParamSpec {
        name: "id".to_string(),
        param_type: ParamType::Integer,
        required: true,
        position: 1,
      }],
      query_type: QueryType::Select,
      timeout_seconds: 30,
    },
  );

  catalog.endpoints.insert(
    "stock-trades".to_string(),
    EndpointSpec {
      name: "stock-trades".to_string(),
      path: "/api/generic/stock-trades".to_string(),
      method: "GET".to_string(),
      query_name: "all".to_string(),
      description: String::new(),
      count_query_name: None,
      pagination: Some(PaginationSpec { enabled: true, default_size: 20, max_size: 100 }),
      response_format: None,
      cache_enabled: None,
      cache_ttl_seconds: None,
      rate_limit_enabled: None,
      rate_limit_requests: None,
      rate_limit_window_seconds: None,
    },
  );

  catalog.endpoints.insert(
    "stock-trade-by-id".to_string(),
    EndpointSpec {
      name: "stock-trade-by-id".to_string(),
      path: "/api/generic/stock-trades/{id}".to_string(),
      method: "GET".to_string(),
      query_name: "by_id".to_string(),
      description: String::new(),
      count_query_name: None,
      pagination: None,
      response_format: None,
      cache_enabled: None,
      cache_ttl_seconds: None,
      rate_limit_enabled: None,
      rate_limit_requests: None,
      rate_limit_window_seconds: None,
    },
  );

  catalog
}

fn engine_for(catalog: Catalog) -> Arc<DispatchEngine> {
  let manager = Arc::new(ConnectionManager::empty());
  Arc::new(DispatchEngine::new(Arc::new(catalog), QueryExecutor::new(manager)))
}

#[tokio::test]
async fn resolve_matches_template_not_concrete_url() {
  let engine = engine_for(stock_trades_catalog());

  let route = engine.resolve("GET", "/api/generic/stock-trades/42").unwrap();
  assert_eq!(route.endpoint.name, "stock-trade-by-id");
  assert_eq!(route.path_params.get("id").map(String::as_str), Some("42"));
  // the aggregation key keeps the placeholder
  assert_eq!(route.endpoint.aggregate_key(), "GET /api/generic/stock-trades/{id}");

  assert!(engine.resolve("POST", "/api/generic/stock-trades/42").is_none());
  assert!(engine.resolve("GET", "/api/generic/unknown").is_none());
}

#[tokio::test]
async fn missing_required_parameter_maps_to_bad_request() {
  let engine = engine_for(stock_trades_catalog());
  let route = engine.resolve("GET", "/api/generic/stock-trades/42").unwrap();

  // no `id` in the parameter map at all
  let err = engine.dispatch(&route.endpoint, &ParamMap::new()).await.unwrap_err();
  match err {
    GatewayError::BadRequest(msg) => assert_eq!(msg, "Required parameter missing: id"),
    other => panic!("expected BadRequest, got {:?}", other),
  }
}

#[tokio::test]
async fn pagination_bounds_are_enforced_before_any_execution() {
  let engine = engine_for(stock_trades_catalog());
  let route = engine.resolve("GET", "/api/generic/stock-trades").unwrap();

  for (key, value) in [("page", "-1"), ("size", "0"), ("size", "101")] {
    let mut params = ParamMap::new();
    params.insert(key.to_string(), json!(value));
    let err = engine.dispatch(&route.endpoint, &params).await.unwrap_err();
    assert!(
      matches!(err, GatewayError::BadRequest(_)),
      "{}={} should be rejected, got {:?}",
      key,
      value,
      err
    );
  }
}

#[tokio::test]
async fn dispatch_against_unknown_database_is_unavailable_shape() {
  // the manager is empty, so the catalogue's database is unknown to it
  let engine = engine_for(stock_trades_catalog());
  let route = engine.resolve("GET", "/api/generic/stock-trades/42").unwrap();

  let mut params = ParamMap::new();
  params.insert("id".to_string(), json!("42"));
  let err = engine.dispatch(&route.endpoint, &params).await.unwrap_err();
  assert!(matches!(err, GatewayError::DatabaseUnknown(_)));
}

#[tokio::test]
async fn async_submission_answers_before_the_pipeline_finishes() {
  let engine = engine_for(stock_trades_catalog());
  let route = engine.resolve("GET", "/api/generic/stock-trades/42").unwrap();

  let started = std::time::Instant::now();
  let accepted = engine.submit_async(route.endpoint.clone(), ParamMap::new());
  assert!(started.elapsed().as_millis() < 50);

  let body = accepted.to_json();
  let id = body["requestId"].as_str().unwrap();
  assert_eq!(id.len(), 36);
  assert_eq!(id.as_bytes()[14], b'4');
  assert_eq!(body["endpoint"], json!("stock-trade-by-id"));
}

#[test]
fn gate_scenario_reports_arity_error_by_name() {
  let mut catalog = stock_trades_catalog();
  catalog.queries.insert(
    "bad".to_string(),
    QuerySpec {
      name: "bad".to_string(),
      description: String::new(),
      database_name: "analytics".to_string(),
      sql: "SELECT * FROM stock_trades WHERE symbol = ? AND volume > ?".to_string(),
      parameters: vec![QueryParamSpec {
        name: "symbol".to_string(),
        param_type: ParamType::String,
        required: true,
        position: 1,
      }],
      query_type: QueryType::Select,
      timeout_seconds: 30,
    },
  );

  let report = validate_chain(&catalog);
  assert!(!report.is_ok());
  assert!(report.errors.iter().any(|line| line.contains("'bad'")));
}

#[tokio::test]
async fn snapshot_swap_is_visible_to_new_resolutions_only() {
  let engine = engine_for(stock_trades_catalog());
  let old_snapshot = engine.snapshot();

  let mut rebound = stock_trades_catalog();
  rebound.endpoints.remove("stock-trade-by-id");
  engine.rebind(Arc::new(rebound));

  // the held snapshot still sees the endpoint; fresh resolution does not
  assert!(old_snapshot.endpoints.contains_key("stock-trade-by-id"));
  assert!(engine.resolve("GET", "/api/generic/stock-trades/42").is_none());
}
