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

//! Catalogue store abstraction
//!
//! One logical repository behind two interchangeable providers (YAML file
//! and relational). The dispatch engine never talks to a provider directly;
//! it reads an immutable [`Catalog`] snapshot that is atomically replaced
//! after every admin write.

use crate::spec::{DatabaseSpec, EndpointSpec, QuerySpec};
use async_trait::async_trait;
use qgate_core::GatewayError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Catalogue store errors.
#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Store IO error: {0}")]
  Io(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Invalid catalogue entry: {0}")]
  Invalid(String),
}

impl From<std::io::Error> for StoreError {
  fn from(err: std::io::Error) -> Self {
    StoreError::Io(err.to_string())
  }
}

impl From<serde_yaml::Error> for StoreError {
  fn from(err: serde_yaml::Error) -> Self {
    StoreError::Invalid(err.to_string())
  }
}

impl From<serde_json::Error> for StoreError {
  fn from(err: serde_json::Error) -> Self {
    StoreError::Invalid(err.to_string())
  }
}

impl From<StoreError> for GatewayError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(m) => GatewayError::NotFound(m),
      StoreError::Conflict(m) => GatewayError::Conflict(m),
      StoreError::Invalid(m) => GatewayError::BadRequest(m),
      StoreError::Io(m) => GatewayError::Internal(m),
    }
  }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Immutable snapshot of the three catalogues. `BTreeMap` keeps iteration
/// order deterministic for route resolution and reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
  pub databases: BTreeMap<String, DatabaseSpec>,
  pub queries: BTreeMap<String, QuerySpec>,
  pub endpoints: BTreeMap<String, EndpointSpec>,
}

impl Catalog {
  /// Resolve the query an endpoint dispatches to.
  pub fn query_for_endpoint(&self, endpoint: &EndpointSpec) -> Option<&QuerySpec> {
    self.queries.get(&endpoint.query_name)
  }

  /// All queries targeting the given database, in name order.
  pub fn queries_for_database(&self, database: &str) -> Vec<&QuerySpec> {
    self.queries.values().filter(|q| q.database_name == database).collect()
  }

  /// All endpoints referencing the given query, in name order.
  pub fn endpoints_for_query(&self, query: &str) -> Vec<&EndpointSpec> {
    self
      .endpoints
      .values()
      .filter(|e| {
        e.query_name == query || e.count_query_name.as_deref() == Some(query)
      })
      .collect()
  }
}

/// Capability set shared by the file and relational providers.
///
/// `upsert_*` returns `true` when the write created a new entry and `false`
/// when it replaced an existing one; specs are validated before the write
/// and rejected with [`StoreError::Invalid`].
#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Load the full catalogue as one consistent snapshot.
  async fn load_all(&self) -> StoreResult<Catalog>;

  async fn database(&self, name: &str) -> StoreResult<Option<DatabaseSpec>>;
  async fn upsert_database(&self, spec: DatabaseSpec) -> StoreResult<bool>;
  async fn delete_database(&self, name: &str) -> StoreResult<bool>;
  async fn database_count(&self) -> StoreResult<usize>;

  async fn query(&self, name: &str) -> StoreResult<Option<QuerySpec>>;
  async fn upsert_query(&self, spec: QuerySpec) -> StoreResult<bool>;
  async fn delete_query(&self, name: &str) -> StoreResult<bool>;
  async fn query_count(&self) -> StoreResult<usize>;

  /// Queries filtered by their parent database.
  async fn queries_for_database(&self, database: &str) -> StoreResult<Vec<QuerySpec>>;

  async fn endpoint(&self, name: &str) -> StoreResult<Option<EndpointSpec>>;
  async fn upsert_endpoint(&self, spec: EndpointSpec) -> StoreResult<bool>;
  async fn delete_endpoint(&self, name: &str) -> StoreResult<bool>;
  async fn endpoint_count(&self) -> StoreResult<usize>;

  /// Endpoints filtered by their parent query (main or count reference).
  async fn endpoints_for_query(&self, query: &str) -> StoreResult<Vec<EndpointSpec>>;

  async fn database_exists(&self, name: &str) -> StoreResult<bool> {
    Ok(self.database(name).await?.is_some())
  }

  async fn query_exists(&self, name: &str) -> StoreResult<bool> {
    Ok(self.query(name).await?.is_some())
  }

  async fn endpoint_exists(&self, name: &str) -> StoreResult<bool> {
    Ok(self.endpoint(name).await?.is_some())
  }

  async fn query_count_for_database(&self, database: &str) -> StoreResult<usize> {
    Ok(self.queries_for_database(database).await?.len())
  }

  async fn endpoint_count_for_query(&self, query: &str) -> StoreResult<usize> {
    Ok(self.endpoints_for_query(query).await?.len())
  }
}
