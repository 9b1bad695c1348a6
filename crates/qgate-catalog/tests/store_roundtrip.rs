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

//! Store contract checks against the file provider: writing then reading
//! any spec yields a structural copy, and the filter-by-parent operations
//! stay consistent with the maps.

use qgate_catalog::{
  CatalogStore, DatabaseSpec, EndpointSpec, PaginationSpec, ParamType, PoolSpec, QueryParamSpec,
  QuerySpec, QueryType, YamlCatalogStore,
};
use tempfile::TempDir;

fn empty_store() -> (TempDir, YamlCatalogStore) {
  let dir = TempDir::new().unwrap();
  let store = YamlCatalogStore::open(dir.path()).unwrap();
  (dir, store)
}

fn sample_database(name: &str) -> DatabaseSpec {
  DatabaseSpec {
    name: name.to_string(),
    description: "trades warehouse".to_string(),
    url: format!("postgres://localhost/{}", name),
    username: "qgate".to_string(),
    password: "pw".to_string(),
    driver_id: "postgres".to_string(),
    pool: PoolSpec {
      maximum_pool_size: 8,
      minimum_idle: 1,
      connection_timeout_ms: 5_000,
      idle_timeout_ms: 300_000,
      max_lifetime_ms: 900_000,
      leak_detection_threshold_ms: 30_000,
      connection_test_query: "SELECT 1".to_string(),
    },
  }
}

fn sample_query(name: &str, database: &str) -> QuerySpec {
  QuerySpec {
    name: name.to_string(),
    description: "trades for one symbol".to_string(),
    database_name: database.to_string(),
    sql: "SELECT * FROM stock_trades WHERE symbol = ? AND traded_at > ?".to_string(),
    parameters: vec![
      QueryParamSpec {
        name: "symbol".to_string(),
        param_type: ParamType::String,
        required: true,
        position: 1,
      },
      QueryParamSpec {
        name: "from".to_string(),
        param_type: ParamType::Timestamp,
        required: false,
        position: 2,
      },
    ],
    query_type: QueryType::Select,
    timeout_seconds: 20,
  }
}

fn sample_endpoint(name: &str, query: &str) -> EndpointSpec {
  EndpointSpec {
    name: name.to_string(),
    path: format!("/api/generic/{}/{{symbol}}", name),
    method: "GET".to_string(),
    query_name: query.to_string(),
    description: String::new(),
    count_query_name: Some(format!("{}_count", query)),
    pagination: Some(PaginationSpec { enabled: true, default_size: 25, max_size: 200 }),
    response_format: Some("json".to_string()),
    cache_enabled: Some(false),
    cache_ttl_seconds: None,
    rate_limit_enabled: Some(true),
    rate_limit_requests: Some(100),
    rate_limit_window_seconds: Some(60),
  }
}

#[tokio::test]
async fn database_write_then_read_is_structural_copy() {
  let (_dir, store) = empty_store();
  let spec = sample_database("warehouse");

  assert!(store.upsert_database(spec.clone()).await.unwrap());
  assert_eq!(store.database("warehouse").await.unwrap().unwrap(), spec);
  assert!(store.database_exists("warehouse").await.unwrap());
  assert_eq!(store.database_count().await.unwrap(), 1);
}

#[tokio::test]
async fn query_write_then_read_is_structural_copy() {
  let (_dir, store) = empty_store();
  let spec = sample_query("by_symbol", "warehouse");

  assert!(store.upsert_query(spec.clone()).await.unwrap());
  assert_eq!(store.query("by_symbol").await.unwrap().unwrap(), spec);
}

#[tokio::test]
async fn endpoint_write_then_read_is_structural_copy() {
  let (_dir, store) = empty_store();
  let spec = sample_endpoint("stock-trades", "by_symbol");

  assert!(store.upsert_endpoint(spec.clone()).await.unwrap());
  assert_eq!(store.endpoint("stock-trades").await.unwrap().unwrap(), spec);
}

#[tokio::test]
async fn round_trip_survives_reopen_for_all_three_catalogues() {
  let dir = TempDir::new().unwrap();
  let database = sample_database("warehouse");
  let query = sample_query("by_symbol", "warehouse");
  let endpoint = sample_endpoint("stock-trades", "by_symbol");

  {
    let store = YamlCatalogStore::open(dir.path()).unwrap();
    store.upsert_database(database.clone()).await.unwrap();
    store.upsert_query(query.clone()).await.unwrap();
    store.upsert_endpoint(endpoint.clone()).await.unwrap();
  }

  let reopened = YamlCatalogStore::open(dir.path()).unwrap();
  let catalog = reopened.load_all().await.unwrap();
  assert_eq!(catalog.databases["warehouse"], database);
  assert_eq!(catalog.queries["by_symbol"], query);
  assert_eq!(catalog.endpoints["stock-trades"], endpoint);
}

#[tokio::test]
async fn filter_by_parent_tracks_the_maps() {
  let (_dir, store) = empty_store();
  store.upsert_database(sample_database("warehouse")).await.unwrap();
  store.upsert_database(sample_database("staging")).await.unwrap();
  store.upsert_query(sample_query("q1", "warehouse")).await.unwrap();
  store.upsert_query(sample_query("q2", "warehouse")).await.unwrap();
  store.upsert_query(sample_query("q3", "staging")).await.unwrap();
  store.upsert_endpoint(sample_endpoint("e1", "q1")).await.unwrap();

  assert_eq!(store.query_count_for_database("warehouse").await.unwrap(), 2);
  assert_eq!(store.query_count_for_database("staging").await.unwrap(), 1);
  assert_eq!(store.query_count_for_database("absent").await.unwrap(), 0);

  // e1 references q1 as its main query and q1_count as its count query
  assert_eq!(store.endpoint_count_for_query("q1").await.unwrap(), 1);
  assert_eq!(store.endpoint_count_for_query("q1_count").await.unwrap(), 1);
  assert_eq!(store.endpoint_count_for_query("q2").await.unwrap(), 0);
}

#[tokio::test]
async fn upsert_replaces_and_reports_created_flag() {
  let (_dir, store) = empty_store();
  let mut spec = sample_database("warehouse");

  assert!(store.upsert_database(spec.clone()).await.unwrap());
  spec.description = "relabelled".to_string();
  assert!(!store.upsert_database(spec.clone()).await.unwrap());
  assert_eq!(
    store.database("warehouse").await.unwrap().unwrap().description,
    "relabelled"
  );
  assert_eq!(store.database_count().await.unwrap(), 1);
}
