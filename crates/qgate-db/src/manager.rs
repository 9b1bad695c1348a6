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

//! Connection manager
//!
//! Owns one deadpool-postgres pool per available database and a separate
//! failed set with failure reason strings. At every observable moment the
//! available and failed sets are disjoint and together cover every
//! configured database. Per-database startup failures degrade that database
//! instead of aborting the process.

use crate::sql::extract_tables;
use deadpool_postgres::{
  Config as PoolBuilderConfig, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use qgate_catalog::{Catalog, DatabaseSpec};
use qgate_core::{GatewayError, Result};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;
use tracing::{info, warn};

/// Driver tokens the gateway can resolve to a PostgreSQL pool.
const DRIVER_TOKENS: [&str; 3] = ["postgres", "postgresql", "pg"];

/// Sweep cadence for idle/lifetime eviction.
const REAP_INTERVAL: Duration = Duration::from_secs(30);

struct PoolEntry {
  pool: Pool,
  spec: DatabaseSpec,
}

/// A scoped pool checkout. The connection goes back to the pool on drop;
/// holding it past the configured leak threshold logs a warning.
#[derive(Debug)]
pub struct PooledConnection {
  client: deadpool_postgres::Object,
  database: String,
  acquired_at: Instant,
  leak_threshold: Duration,
}

impl Deref for PooledConnection {
  type Target = deadpool_postgres::Object;

  fn deref(&self) -> &Self::Target {
    &self.client
  }
}

impl Drop for PooledConnection {
  fn drop(&mut self) {
    let held = self.acquired_at.elapsed();
    if held > self.leak_threshold {
      warn!(
        database = %self.database,
        held_ms = held.as_millis() as u64,
        threshold_ms = self.leak_threshold.as_millis() as u64,
        "connection held past leak detection threshold"
      );
    }
  }
}

/// Pooled data sources for all configured databases.
pub struct ConnectionManager {
  pools: Arc<RwLock<HashMap<String, PoolEntry>>>,
  failed: RwLock<HashMap<String, String>>,
  reaper: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ConnectionManager {
  fn default() -> Self {
    Self::empty()
  }
}

impl Drop for ConnectionManager {
  fn drop(&mut self) {
    if let Ok(mut reaper) = self.reaper.lock() {
      if let Some(handle) = reaper.take() {
        handle.abort();
      }
    }
  }
}

impl ConnectionManager {
  pub fn empty() -> Self {
    Self {
      pools: Arc::new(RwLock::new(HashMap::new())),
      failed: RwLock::new(HashMap::new()),
      reaper: Mutex::new(None),
    }
  }

  /// Build pools for every database in the catalogue. Individual failures
  /// land in the failed set; this never errors.
  pub async fn build(catalog: &Catalog) -> Self {
    let manager = Self::empty();
    manager.rebind(catalog).await;
    manager
  }

  /// Replace the pool partition from a fresh catalogue snapshot. Existing
  /// pools are dropped; in-flight checkouts keep their connection until
  /// they release it.
  pub async fn rebind(&self, catalog: &Catalog) {
    let mut pools = HashMap::new();
    let mut failed = HashMap::new();

    for spec in catalog.databases.values() {
      let mut required: Vec<String> = Vec::new();
      for query in catalog.queries_for_database(&spec.name) {
        for table in extract_tables(&query.sql) {
          if !required.contains(&table) {
            required.push(table);
          }
        }
      }

      match build_pool(spec, &required).await {
        Ok(pool) => {
          info!(database = %spec.name, tables = required.len(), "database pool ready");
          pools.insert(spec.name.clone(), PoolEntry { pool, spec: spec.clone() });
        }
        Err(reason) => {
          warn!(database = %spec.name, %reason, "database degraded to failed set");
          failed.insert(spec.name.clone(), reason);
        }
      }
    }

    *self.pools.write().expect("pool lock poisoned") = pools;
    *self.failed.write().expect("failed lock poisoned") = failed;
    self.restart_reaper();
  }

  /// Restart the eviction sweep for the current pool partition. Every
  /// `REAP_INTERVAL` each pool drops idle connections whose last use is
  /// older than the spec's `idle_timeout_ms` and connections whose age
  /// exceeds `max_lifetime_ms`. Checked-out connections are never touched.
  fn restart_reaper(&self) {
    let mut reaper = self.reaper.lock().expect("reaper lock poisoned");
    if let Some(handle) = reaper.take() {
      handle.abort();
    }

    let sweep: Vec<(Pool, Duration, Duration)> = {
      let pools = self.pools.read().expect("pool lock poisoned");
      pools
        .values()
        .map(|entry| {
          (
            entry.pool.clone(),
            Duration::from_millis(entry.spec.pool.idle_timeout_ms),
            Duration::from_millis(entry.spec.pool.max_lifetime_ms),
          )
        })
        .collect()
    };
    if sweep.is_empty() {
      return;
    }

    *reaper = Some(tokio::spawn(async move {
      let mut interval = tokio::time::interval(REAP_INTERVAL);
      loop {
        interval.tick().await;
        for (pool, idle_timeout, max_lifetime) in &sweep {
          pool.retain(|_, metrics| {
            metrics.last_used() < *idle_timeout && metrics.age() < *max_lifetime
          });
        }
      }
    }));
  }

  /// Check a connection out of the named pool.
  pub async fn acquire(&self, name: &str) -> Result<PooledConnection> {
    let (pool, leak_threshold) = {
      let pools = self.pools.read().expect("pool lock poisoned");
      match pools.get(name) {
        Some(entry) => (
          entry.pool.clone(),
          Duration::from_millis(entry.spec.pool.leak_detection_threshold_ms),
        ),
        None => {
          let failed = self.failed.read().expect("failed lock poisoned");
          return Err(match failed.get(name) {
            Some(reason) => GatewayError::DatabaseUnavailable {
              name: name.to_string(),
              reason: reason.clone(),
            },
            None => GatewayError::DatabaseUnknown(name.to_string()),
          });
        }
      }
    };

    let client = pool.get().await.map_err(|e| GatewayError::DatabaseUnavailable {
      name: name.to_string(),
      reason: format!("connection checkout failed: {}", e),
    })?;

    Ok(PooledConnection {
      client,
      database: name.to_string(),
      acquired_at: Instant::now(),
      leak_threshold,
    })
  }

  /// Whether the named database is in the available set.
  pub fn is_available(&self, name: &str) -> bool {
    self.pools.read().expect("pool lock poisoned").contains_key(name)
  }

  /// Failure reason for a database in the failed set.
  pub fn failure_reason(&self, name: &str) -> Option<String> {
    self.failed.read().expect("failed lock poisoned").get(name).cloned()
  }

  pub fn available_names(&self) -> Vec<String> {
    let mut names: Vec<String> =
      self.pools.read().expect("pool lock poisoned").keys().cloned().collect();
    names.sort();
    names
  }

  pub fn failed_snapshot(&self) -> HashMap<String, String> {
    self.failed.read().expect("failed lock poisoned").clone()
  }

  pub fn configured_count(&self) -> usize {
    self.pools.read().expect("pool lock poisoned").len()
      + self.failed.read().expect("failed lock poisoned").len()
  }

  /// True iff the database is available and a fresh test query succeeds
  /// within the pool's connection timeout.
  pub async fn healthy(&self, name: &str) -> bool {
    let test_query = {
      let pools = self.pools.read().expect("pool lock poisoned");
      match pools.get(name) {
        Some(entry) => entry.spec.pool.connection_test_query.clone(),
        None => return false,
      }
    };
    match self.acquire(name).await {
      Ok(conn) => conn.simple_query(&test_query).await.is_ok(),
      Err(_) => false,
    }
  }

  /// Conjunction of [`Self::healthy`] over the available set.
  pub async fn all_healthy(&self) -> bool {
    for name in self.available_names() {
      if !self.healthy(&name).await {
        return false;
      }
    }
    true
  }

  /// Drop every pool. Called on shutdown after the HTTP host has stopped.
  pub fn close_all(&self) {
    if let Some(handle) = self.reaper.lock().expect("reaper lock poisoned").take() {
      handle.abort();
    }
    let pools = self.pools.write().expect("pool lock poisoned");
    for entry in pools.values() {
      entry.pool.close();
    }
  }
}

/// Startup algorithm for one database: resolve the driver, build the pool,
/// probe with the test query, then probe every required table.
async fn build_pool(spec: &DatabaseSpec, required_tables: &[String]) -> std::result::Result<Pool, String> {
  if !DRIVER_TOKENS.contains(&spec.driver_id.to_lowercase().as_str()) {
    return Err(format!("driver unavailable: {}", spec.driver_id));
  }

  let mut cfg = PoolBuilderConfig::new();
  cfg.url = Some(spec.url.clone());
  if !spec.username.is_empty() {
    cfg.user = Some(spec.username.clone());
  }
  if !spec.password.is_empty() {
    cfg.password = Some(spec.password.clone());
  }
  cfg.manager = Some(ManagerConfig { recycling_method: RecyclingMethod::Fast });
  // wait, create and the recycle check are all bounded by the catalogued
  // connection timeout; idle and lifetime eviction run on the reaper sweep
  cfg.pool = Some(PoolConfig {
    max_size: spec.pool.maximum_pool_size as usize,
    timeouts: Timeouts {
      wait: Some(Duration::from_millis(spec.pool.connection_timeout_ms)),
      create: Some(Duration::from_millis(spec.pool.connection_timeout_ms)),
      recycle: Some(Duration::from_millis(spec.pool.connection_timeout_ms)),
    },
    ..PoolConfig::default()
  });

  let pool = cfg
    .create_pool(Some(Runtime::Tokio1), NoTls)
    .map_err(|e| format!("pool build failed: {}", e))?;

  let client = pool.get().await.map_err(|e| format!("connection probe failed: {}", e))?;
  client
    .simple_query(&spec.pool.connection_test_query)
    .await
    .map_err(|e| format!("test query failed: {}", pg_reason(&e)))?;

  let mut table_errors = Vec::new();
  for table in required_tables {
    let probe = format!("SELECT 1 FROM {} LIMIT 1", table);
    if let Err(e) = client.simple_query(&probe).await {
      table_errors.push(format!("{}: {}", table, pg_reason(&e)));
    }
  }
  drop(client);

  if !table_errors.is_empty() {
    pool.close();
    return Err(format!("required tables missing: {}", table_errors.join("; ")));
  }

  Ok(pool)
}

/// SQLSTATE plus message when the server reported one, otherwise the client
/// error text.
pub(crate) fn pg_reason(err: &tokio_postgres::Error) -> String {
  match err.as_db_error() {
    Some(db) => format!("{} {}", db.code().code(), db.message()),
    None => err.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use qgate_catalog::PoolSpec;
  use std::collections::BTreeMap;

  fn spec_with_driver(name: &str, driver: &str) -> DatabaseSpec {
    DatabaseSpec {
      name: name.to_string(),
      description: String::new(),
      url: "postgres://localhost:5432/qgate".to_string(),
      username: String::new(),
      password: String::new(),
      driver_id: driver.to_string(),
      pool: PoolSpec::default(),
    }
  }

  fn catalog_with(databases: Vec<DatabaseSpec>) -> Catalog {
    let mut catalog = Catalog::default();
    for spec in databases {
      catalog.databases.insert(spec.name.clone(), spec);
    }
    catalog.queries = BTreeMap::new();
    catalog
  }

  #[tokio::test]
  async fn test_unknown_driver_lands_in_failed_set() {
    let catalog = catalog_with(vec![spec_with_driver("legacy", "oracle-thin")]);
    let manager = ConnectionManager::build(&catalog).await;

    assert!(!manager.is_available("legacy"));
    let reason = manager.failure_reason("legacy").unwrap();
    assert_eq!(reason, "driver unavailable: oracle-thin");
    assert_eq!(manager.configured_count(), 1);
  }

  #[tokio::test]
  async fn test_malformed_url_lands_in_failed_set() {
    let mut spec = spec_with_driver("broken", "postgres");
    spec.url = "::not-a-url::".to_string();
    let manager = ConnectionManager::build(&catalog_with(vec![spec])).await;

    assert!(!manager.is_available("broken"));
    assert!(manager.failure_reason("broken").is_some());
  }

  #[tokio::test]
  async fn test_acquire_unknown_database() {
    let manager = ConnectionManager::empty();
    let err = manager.acquire("missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::DatabaseUnknown(_)));
  }

  #[tokio::test]
  async fn test_acquire_failed_database_reports_reason() {
    let catalog = catalog_with(vec![spec_with_driver("legacy", "h2")]);
    let manager = ConnectionManager::build(&catalog).await;

    let err = manager.acquire("legacy").await.unwrap_err();
    match err {
      GatewayError::DatabaseUnavailable { name, reason } => {
        assert_eq!(name, "legacy");
        assert_eq!(reason, "driver unavailable: h2");
      }
      other => panic!("expected DatabaseUnavailable, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_partition_is_complementary() {
    let catalog = catalog_with(vec![
      spec_with_driver("a", "oracle"),
      spec_with_driver("b", "mysql"),
    ]);
    let manager = ConnectionManager::build(&catalog).await;

    let available = manager.available_names();
    let failed = manager.failed_snapshot();
    assert!(available.is_empty());
    assert_eq!(failed.len(), 2);
    assert_eq!(manager.configured_count(), 2);
    for name in ["a", "b"] {
      assert!(failed.contains_key(name));
      assert!(!available.contains(&name.to_string()));
    }
  }

  #[tokio::test]
  async fn test_rebind_and_close_are_idempotent() {
    let catalog = catalog_with(vec![spec_with_driver("legacy", "oracle")]);
    let manager = ConnectionManager::build(&catalog).await;

    // a second rebind restarts the sweep, close aborts it; neither panics
    manager.rebind(&catalog).await;
    manager.close_all();
    manager.close_all();
    assert_eq!(manager.configured_count(), 1);
  }

  #[tokio::test]
  async fn test_healthy_is_false_for_failed_or_unknown() {
    let catalog = catalog_with(vec![spec_with_driver("legacy", "h2")]);
    let manager = ConnectionManager::build(&catalog).await;
    assert!(!manager.healthy("legacy").await);
    assert!(!manager.healthy("missing").await);
    // vacuous truth over an empty available set
    assert!(manager.all_healthy().await);
  }
}
