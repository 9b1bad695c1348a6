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

//! Relational catalogue provider
//!
//! Persists the three catalogues in `config_databases`, `config_queries`
//! and `config_endpoints` inside the gateway's own config database. Blocking
//! Diesel operations run on the tokio blocking pool.

pub mod models;
pub mod schema;

use crate::spec::{DatabaseSpec, EndpointSpec, QuerySpec};
use crate::store::{Catalog, CatalogStore, StoreError, StoreResult};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use models::{
  DatabaseRow, EndpointRow, NewDatabaseRow, NewEndpointRow, NewQueryRow, QueryRow,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub type ConfigDbPool = Pool<ConnectionManager<PgConnection>>;
pub type ConfigDbConnection = PooledConnection<ConnectionManager<PgConnection>>;

const CONFIG_POOL_SIZE: u32 = 5;
/// Connection timeout in seconds - pool will fail instead of retrying forever
const CONNECTION_TIMEOUT_SECS: u64 = 30;

impl From<DieselError> for StoreError {
  fn from(err: DieselError) -> Self {
    match err {
      DieselError::NotFound => StoreError::NotFound("Record not found".to_string()),
      DieselError::DatabaseError(kind, info) => match kind {
        diesel::result::DatabaseErrorKind::UniqueViolation => {
          StoreError::Conflict(info.message().to_string())
        }
        _ => StoreError::Io(info.message().to_string()),
      },
      _ => StoreError::Io(err.to_string()),
    }
  }
}

impl From<diesel::r2d2::PoolError> for StoreError {
  fn from(err: diesel::r2d2::PoolError) -> Self {
    StoreError::Io(err.to_string())
  }
}

/// Catalogue store backed by the gateway's config database.
pub struct RelationalCatalogStore {
  pool: Arc<ConfigDbPool>,
}

impl RelationalCatalogStore {
  /// Connect and make sure the three config tables exist.
  ///
  /// Fails fast if the database is unavailable by testing the connection
  /// before building the pool.
  pub fn connect(database_url: &str) -> StoreResult<Self> {
    PgConnection::establish(database_url)
      .map_err(|e| StoreError::Io(format!("Failed to connect to config database: {}", e)))?;

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
      .max_size(CONFIG_POOL_SIZE)
      .connection_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
      .build(manager)
      .map_err(|e| StoreError::Io(e.to_string()))?;

    let store = Self { pool: Arc::new(pool) };
    store.ensure_schema()?;
    Ok(store)
  }

  /// Idempotent DDL for the three catalogue tables.
  fn ensure_schema(&self) -> StoreResult<()> {
    let mut conn = self.pool.get()?;
    for ddl in [
      "CREATE TABLE IF NOT EXISTS config_databases (
         id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
         name TEXT NOT NULL UNIQUE,
         description TEXT,
         url TEXT NOT NULL,
         username TEXT,
         password TEXT,
         driver_id TEXT NOT NULL,
         maximum_pool_size INTEGER NOT NULL,
         minimum_idle INTEGER NOT NULL,
         connection_timeout_ms BIGINT NOT NULL,
         idle_timeout_ms BIGINT NOT NULL,
         max_lifetime_ms BIGINT NOT NULL,
         leak_detection_threshold_ms BIGINT NOT NULL,
         connection_test_query TEXT NOT NULL,
         created_at TIMESTAMP NOT NULL DEFAULT NOW(),
         updated_at TIMESTAMP NOT NULL DEFAULT NOW()
       )",
      "CREATE TABLE IF NOT EXISTS config_queries (
         id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
         name TEXT NOT NULL UNIQUE,
         description TEXT,
         database_name TEXT NOT NULL,
         sql TEXT NOT NULL,
         parameters TEXT NOT NULL,
         query_type TEXT NOT NULL,
         timeout_seconds BIGINT NOT NULL,
         created_at TIMESTAMP NOT NULL DEFAULT NOW(),
         updated_at TIMESTAMP NOT NULL DEFAULT NOW()
       )",
      "CREATE TABLE IF NOT EXISTS config_endpoints (
         id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
         name TEXT NOT NULL UNIQUE,
         description TEXT,
         path TEXT NOT NULL,
         method TEXT NOT NULL,
         query_name TEXT NOT NULL,
         response_format TEXT,
         cache_enabled BOOLEAN,
         cache_ttl_seconds BIGINT,
         rate_limit_enabled BOOLEAN,
         rate_limit_requests BIGINT,
         rate_limit_window_seconds BIGINT,
         created_at TIMESTAMP NOT NULL DEFAULT NOW(),
         updated_at TIMESTAMP NOT NULL DEFAULT NOW()
       )",
    ] {
      diesel::sql_query(ddl).execute(&mut conn)?;
    }
    Ok(())
  }

  /// Execute a blocking Diesel operation on the blocking pool.
  async fn run<F, R>(&self, f: F) -> StoreResult<R>
  where
    F: FnOnce(&mut ConfigDbConnection) -> StoreResult<R> + Send + 'static,
    R: Send + 'static,
  {
    let pool = Arc::clone(&self.pool);
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get()?;
      f(&mut conn)
    })
    .await
    .map_err(|e| StoreError::Io(format!("Task join error: {}", e)))?
  }
}

#[async_trait]
impl CatalogStore for RelationalCatalogStore {
  async fn load_all(&self) -> StoreResult<Catalog> {
    self
      .run(|conn| {
        let databases: Vec<DatabaseRow> =
          schema::config_databases::table.order(schema::config_databases::name.asc()).load(conn)?;
        let queries: Vec<QueryRow> =
          schema::config_queries::table.order(schema::config_queries::name.asc()).load(conn)?;
        let endpoints: Vec<EndpointRow> =
          schema::config_endpoints::table.order(schema::config_endpoints::name.asc()).load(conn)?;

        let mut catalog = Catalog {
          databases: BTreeMap::new(),
          queries: BTreeMap::new(),
          endpoints: BTreeMap::new(),
        };
        for row in databases {
          let spec: DatabaseSpec = row.into();
          catalog.databases.insert(spec.name.clone(), spec);
        }
        for row in queries {
          let spec = row.into_spec()?;
          catalog.queries.insert(spec.name.clone(), spec);
        }
        for row in endpoints {
          let spec: EndpointSpec = row.into();
          catalog.endpoints.insert(spec.name.clone(), spec);
        }
        Ok(catalog)
      })
      .await
  }

  async fn database(&self, name: &str) -> StoreResult<Option<DatabaseSpec>> {
    let name = name.to_string();
    self
      .run(move |conn| {
        use schema::config_databases::dsl;
        let row: Option<DatabaseRow> =
          dsl::config_databases.filter(dsl::name.eq(&name)).first(conn).optional()?;
        Ok(row.map(Into::into))
      })
      .await
  }

  async fn upsert_database(&self, spec: DatabaseSpec) -> StoreResult<bool> {
    spec.validate().map_err(StoreError::Invalid)?;
    self
      .run(move |conn| {
        use schema::config_databases::dsl;
        let row = NewDatabaseRow::from(&spec);
        let existing: Option<i64> = dsl::config_databases
          .filter(dsl::name.eq(&spec.name))
          .select(dsl::id)
          .first(conn)
          .optional()?;
        match existing {
          None => {
            diesel::insert_into(dsl::config_databases).values(&row).execute(conn)?;
            Ok(true)
          }
          Some(id) => {
            diesel::update(dsl::config_databases.filter(dsl::id.eq(id)))
              .set((&row, dsl::updated_at.eq(diesel::dsl::now)))
              .execute(conn)?;
            Ok(false)
          }
        }
      })
      .await
  }

  async fn delete_database(&self, name: &str) -> StoreResult<bool> {
    let name = name.to_string();
    self
      .run(move |conn| {
        use schema::config_databases::dsl;
        let deleted =
          diesel::delete(dsl::config_databases.filter(dsl::name.eq(&name))).execute(conn)?;
        Ok(deleted > 0)
      })
      .await
  }

  async fn database_count(&self) -> StoreResult<usize> {
    self
      .run(|conn| {
        use schema::config_databases::dsl;
        let count: i64 = dsl::config_databases.count().get_result(conn)?;
        Ok(count as usize)
      })
      .await
  }

  async fn query(&self, name: &str) -> StoreResult<Option<QuerySpec>> {
    let name = name.to_string();
    self
      .run(move |conn| {
        use schema::config_queries::dsl;
        let row: Option<QueryRow> =
          dsl::config_queries.filter(dsl::name.eq(&name)).first(conn).optional()?;
        row.map(QueryRow::into_spec).transpose()
      })
      .await
  }

  async fn upsert_query(&self, mut spec: QuerySpec) -> StoreResult<bool> {
    spec.normalize();
    spec.validate().map_err(StoreError::Invalid)?;
    self
      .run(move |conn| {
        use schema::config_queries::dsl;
        let row = NewQueryRow::try_from(&spec)?;
        let existing: Option<i64> = dsl::config_queries
          .filter(dsl::name.eq(&spec.name))
          .select(dsl::id)
          .first(conn)
          .optional()?;
        match existing {
          None => {
            diesel::insert_into(dsl::config_queries).values(&row).execute(conn)?;
            Ok(true)
          }
          Some(id) => {
            diesel::update(dsl::config_queries.filter(dsl::id.eq(id)))
              .set((&row, dsl::updated_at.eq(diesel::dsl::now)))
              .execute(conn)?;
            Ok(false)
          }
        }
      })
      .await
  }

  async fn delete_query(&self, name: &str) -> StoreResult<bool> {
    let name = name.to_string();
    self
      .run(move |conn| {
        use schema::config_queries::dsl;
        let deleted =
          diesel::delete(dsl::config_queries.filter(dsl::name.eq(&name))).execute(conn)?;
        Ok(deleted > 0)
      })
      .await
  }

  async fn query_count(&self) -> StoreResult<usize> {
    self
      .run(|conn| {
        use schema::config_queries::dsl;
        let count: i64 = dsl::config_queries.count().get_result(conn)?;
        Ok(count as usize)
      })
      .await
  }

  async fn queries_for_database(&self, database: &str) -> StoreResult<Vec<QuerySpec>> {
    let database = database.to_string();
    self
      .run(move |conn| {
        use schema::config_queries::dsl;
        let rows: Vec<QueryRow> = dsl::config_queries
          .filter(dsl::database_name.eq(&database))
          .order(dsl::name.asc())
          .load(conn)?;
        rows.into_iter().map(QueryRow::into_spec).collect()
      })
      .await
  }

  async fn endpoint(&self, name: &str) -> StoreResult<Option<EndpointSpec>> {
    let name = name.to_string();
    self
      .run(move |conn| {
        use schema::config_endpoints::dsl;
        let row: Option<EndpointRow> =
          dsl::config_endpoints.filter(dsl::name.eq(&name)).first(conn).optional()?;
        Ok(row.map(Into::into))
      })
      .await
  }

  async fn upsert_endpoint(&self, mut spec: EndpointSpec) -> StoreResult<bool> {
    spec.normalize();
    spec.validate().map_err(StoreError::Invalid)?;
    self
      .run(move |conn| {
        use schema::config_endpoints::dsl;
        let row = NewEndpointRow::from(&spec);
        let existing: Option<i64> = dsl::config_endpoints
          .filter(dsl::name.eq(&spec.name))
          .select(dsl::id)
          .first(conn)
          .optional()?;
        match existing {
          None => {
            diesel::insert_into(dsl::config_endpoints).values(&row).execute(conn)?;
            Ok(true)
          }
          Some(id) => {
            diesel::update(dsl::config_endpoints.filter(dsl::id.eq(id)))
              .set((&row, dsl::updated_at.eq(diesel::dsl::now)))
              .execute(conn)?;
            Ok(false)
          }
        }
      })
      .await
  }

  async fn delete_endpoint(&self, name: &str) -> StoreResult<bool> {
    let name = name.to_string();
    self
      .run(move |conn| {
        use schema::config_endpoints::dsl;
        let deleted =
          diesel::delete(dsl::config_endpoints.filter(dsl::name.eq(&name))).execute(conn)?;
        Ok(deleted > 0)
      })
      .await
  }

  async fn endpoint_count(&self) -> StoreResult<usize> {
    self
      .run(|conn| {
        use schema::config_endpoints::dsl;
        let count: i64 = dsl::config_endpoints.count().get_result(conn)?;
        Ok(count as usize)
      })
      .await
  }

  async fn endpoints_for_query(&self, query: &str) -> StoreResult<Vec<EndpointSpec>> {
    let query = query.to_string();
    self
      .run(move |conn| {
        use schema::config_endpoints::dsl;
        let rows: Vec<EndpointRow> = dsl::config_endpoints
          .filter(dsl::query_name.eq(&query))
          .order(dsl::name.asc())
          .load(conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
      })
      .await
  }
}
