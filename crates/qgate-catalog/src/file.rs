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

//! File-backed catalogue provider
//!
//! Loads the three YAML documents from the catalogue directory at startup
//! and keeps them in memory. Writes are journalled back to disk: the
//! affected document is re-serialised in full and atomically renamed over
//! the original, so a crash mid-write never leaves a torn file.

use crate::spec::{DatabaseSpec, EndpointSpec, QuerySpec};
use crate::store::{Catalog, CatalogStore, StoreError, StoreResult};
use async_trait::async_trait;
use qgate_core::{DATABASES_FILE, ENDPOINTS_FILE, QUERIES_FILE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct DatabasesDoc {
  #[serde(default)]
  databases: Vec<DatabaseSpec>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueriesDoc {
  #[serde(default)]
  queries: Vec<QuerySpec>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EndpointsDoc {
  #[serde(default)]
  endpoints: Vec<EndpointSpec>,
}

/// YAML catalogue store.
#[derive(Debug)]
pub struct YamlCatalogStore {
  dir: PathBuf,
  inner: RwLock<Catalog>,
}

impl YamlCatalogStore {
  /// Read the three documents under `dir`. A missing document is an empty
  /// catalogue section; an unreadable or malformed one is a hard error.
  pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
    let dir = dir.into();
    if !dir.is_dir() {
      return Err(StoreError::Io(format!("catalogue directory not found: {}", dir.display())));
    }

    let databases: DatabasesDoc = read_doc(&dir.join(DATABASES_FILE))?;
    let queries: QueriesDoc = read_doc(&dir.join(QUERIES_FILE))?;
    let endpoints: EndpointsDoc = read_doc(&dir.join(ENDPOINTS_FILE))?;

    let mut catalog = Catalog::default();
    for spec in databases.databases {
      spec.validate().map_err(StoreError::Invalid)?;
      insert_unique(&mut catalog.databases, spec.name.clone(), spec, "database")?;
    }
    for mut spec in queries.queries {
      spec.normalize();
      spec.validate().map_err(StoreError::Invalid)?;
      insert_unique(&mut catalog.queries, spec.name.clone(), spec, "query")?;
    }
    for mut spec in endpoints.endpoints {
      spec.normalize();
      spec.validate().map_err(StoreError::Invalid)?;
      insert_unique(&mut catalog.endpoints, spec.name.clone(), spec, "endpoint")?;
    }

    debug!(
      databases = catalog.databases.len(),
      queries = catalog.queries.len(),
      endpoints = catalog.endpoints.len(),
      "catalogue loaded from {}",
      dir.display()
    );

    Ok(Self { dir, inner: RwLock::new(catalog) })
  }

  fn journal_databases(&self, catalog: &Catalog) -> StoreResult<()> {
    let doc = DatabasesDoc { databases: catalog.databases.values().cloned().collect() };
    write_doc(&self.dir.join(DATABASES_FILE), &doc)
  }

  fn journal_queries(&self, catalog: &Catalog) -> StoreResult<()> {
    let doc = QueriesDoc { queries: catalog.queries.values().cloned().collect() };
    write_doc(&self.dir.join(QUERIES_FILE), &doc)
  }

  fn journal_endpoints(&self, catalog: &Catalog) -> StoreResult<()> {
    let doc = EndpointsDoc { endpoints: catalog.endpoints.values().cloned().collect() };
    write_doc(&self.dir.join(ENDPOINTS_FILE), &doc)
  }

  fn read(&self) -> Catalog {
    self.inner.read().expect("catalogue lock poisoned").clone()
  }
}

fn insert_unique<T>(
  map: &mut BTreeMap<String, T>,
  name: String,
  spec: T,
  what: &str,
) -> StoreResult<()> {
  if map.contains_key(&name) {
    return Err(StoreError::Invalid(format!("duplicate {} name: {}", what, name)));
  }
  map.insert(name, spec);
  Ok(())
}

fn read_doc<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> StoreResult<T> {
  if !path.exists() {
    warn!("catalogue document missing, treating as empty: {}", path.display());
    return Ok(T::default());
  }
  let text = fs::read_to_string(path)?;
  Ok(serde_yaml::from_str(&text)?)
}

fn write_doc<T: Serialize>(path: &Path, doc: &T) -> StoreResult<()> {
  let text = serde_yaml::to_string(doc)?;
  let tmp = path.with_extension("yaml.tmp");
  fs::write(&tmp, text)?;
  fs::rename(&tmp, path)?;
  Ok(())
}

#[async_trait]
impl CatalogStore for YamlCatalogStore {
  async fn load_all(&self) -> StoreResult<Catalog> {
    Ok(self.read())
  }

  async fn database(&self, name: &str) -> StoreResult<Option<DatabaseSpec>> {
    Ok(self.inner.read().expect("catalogue lock poisoned").databases.get(name).cloned())
  }

  async fn upsert_database(&self, spec: DatabaseSpec) -> StoreResult<bool> {
    spec.validate().map_err(StoreError::Invalid)?;
    let mut inner = self.inner.write().expect("catalogue lock poisoned");
    let created = inner.databases.insert(spec.name.clone(), spec).is_none();
    self.journal_databases(&inner)?;
    Ok(created)
  }

  async fn delete_database(&self, name: &str) -> StoreResult<bool> {
    let mut inner = self.inner.write().expect("catalogue lock poisoned");
    let removed = inner.databases.remove(name).is_some();
    if removed {
      self.journal_databases(&inner)?;
    }
    Ok(removed)
  }

  async fn database_count(&self) -> StoreResult<usize> {
    Ok(self.inner.read().expect("catalogue lock poisoned").databases.len())
  }

  async fn query(&self, name: &str) -> StoreResult<Option<QuerySpec>> {
    Ok(self.inner.read().expect("catalogue lock poisoned").queries.get(name).cloned())
  }

  async fn upsert_query(&self, mut spec: QuerySpec) -> StoreResult<bool> {
    spec.normalize();
    spec.validate().map_err(StoreError::Invalid)?;
    let mut inner = self.inner.write().expect("catalogue lock poisoned");
    let created = inner.queries.insert(spec.name.clone(), spec).is_none();
    self.journal_queries(&inner)?;
    Ok(created)
  }

  async fn delete_query(&self, name: &str) -> StoreResult<bool> {
    let mut inner = self.inner.write().expect("catalogue lock poisoned");
    let removed = inner.queries.remove(name).is_some();
    if removed {
      self.journal_queries(&inner)?;
    }
    Ok(removed)
  }

  async fn query_count(&self) -> StoreResult<usize> {
    Ok(self.inner.read().expect("catalogue lock poisoned").queries.len())
  }

  async fn queries_for_database(&self, database: &str) -> StoreResult<Vec<QuerySpec>> {
    Ok(
      self
        .inner
        .read()
        .expect("catalogue lock poisoned")
        .queries_for_database(database)
        .into_iter()
        .cloned()
        .collect(),
    )
  }

  async fn endpoint(&self, name: &str) -> StoreResult<Option<EndpointSpec>> {
    Ok(self.inner.read().expect("catalogue lock poisoned").endpoints.get(name).cloned())
  }

  async fn upsert_endpoint(&self, mut spec: EndpointSpec) -> StoreResult<bool> {
    spec.normalize();
    spec.validate().map_err(StoreError::Invalid)?;
    let mut inner = self.inner.write().expect("catalogue lock poisoned");
    let created = inner.endpoints.insert(spec.name.clone(), spec).is_none();
    self.journal_endpoints(&inner)?;
    Ok(created)
  }

  async fn delete_endpoint(&self, name: &str) -> StoreResult<bool> {
    let mut inner = self.inner.write().expect("catalogue lock poisoned");
    let removed = inner.endpoints.remove(name).is_some();
    if removed {
      self.journal_endpoints(&inner)?;
    }
    Ok(removed)
  }

  async fn endpoint_count(&self) -> StoreResult<usize> {
    Ok(self.inner.read().expect("catalogue lock poisoned").endpoints.len())
  }

  async fn endpoints_for_query(&self, query: &str) -> StoreResult<Vec<EndpointSpec>> {
    Ok(
      self
        .inner
        .read()
        .expect("catalogue lock poisoned")
        .endpoints_for_query(query)
        .into_iter()
        .cloned()
        .collect(),
    )
  }
}
