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

//! Relational metrics sink
//!
//! Persists sampled performance records into a `performance_metrics` table
//! in the gateway's config database. Records are transferred here and never
//! retained in-process; a failed insert is the caller's to log and swallow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use qgate_engine::{MetricsError, MetricsSink, PerformanceRecord, RecordKind};
use std::sync::Arc;
use std::time::Duration;

diesel::table! {
    performance_metrics (id) {
        id -> Int8,
        record_kind -> Text,
        endpoint_key -> Text,
        method -> Text,
        start_timestamp -> Timestamptz,
        duration_millis -> Int8,
        memory_delta_bytes -> Int8,
        status_code -> Int4,
        success -> Bool,
        cache_hits -> Nullable<Int8>,
        cache_misses -> Nullable<Int8>,
        created_at -> Timestamptz,
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = performance_metrics)]
struct NewPerformanceMetric {
  record_kind: String,
  endpoint_key: String,
  method: String,
  start_timestamp: DateTime<Utc>,
  duration_millis: i64,
  memory_delta_bytes: i64,
  status_code: i32,
  success: bool,
  cache_hits: Option<i64>,
  cache_misses: Option<i64>,
}

impl From<&PerformanceRecord> for NewPerformanceMetric {
  fn from(record: &PerformanceRecord) -> Self {
    Self {
      record_kind: match record.kind {
        RecordKind::Basic => "BASIC".to_string(),
        RecordKind::Cache => "CACHE".to_string(),
      },
      endpoint_key: record.endpoint_key.clone(),
      method: record.method.clone(),
      start_timestamp: record.start_timestamp,
      duration_millis: record.duration_millis as i64,
      memory_delta_bytes: record.memory_delta_bytes as i64,
      status_code: record.status_code as i32,
      success: record.success,
      cache_hits: record.cache_hits.map(|v| v as i64),
      cache_misses: record.cache_misses.map(|v| v as i64),
    }
  }
}

pub struct RelationalMetricsSink {
  pool: Arc<Pool<ConnectionManager<PgConnection>>>,
}

impl RelationalMetricsSink {
  /// Connect and make sure the metrics table exists.
  pub fn connect(database_url: &str) -> Result<Self, MetricsError> {
    PgConnection::establish(database_url)
      .map_err(|e| MetricsError::Sink(format!("Failed to connect to metrics database: {}", e)))?;

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
      .max_size(2)
      .connection_timeout(Duration::from_secs(30))
      .build(manager)
      .map_err(|e| MetricsError::Sink(e.to_string()))?;

    let mut conn = pool.get().map_err(|e| MetricsError::Sink(e.to_string()))?;
    diesel::sql_query(
      "CREATE TABLE IF NOT EXISTS performance_metrics (
         id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
         record_kind TEXT NOT NULL,
         endpoint_key TEXT NOT NULL,
         method TEXT NOT NULL,
         start_timestamp TIMESTAMPTZ NOT NULL,
         duration_millis BIGINT NOT NULL,
         memory_delta_bytes BIGINT NOT NULL,
         status_code INTEGER NOT NULL,
         success BOOLEAN NOT NULL,
         cache_hits BIGINT,
         cache_misses BIGINT,
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
       )",
    )
    .execute(&mut conn)
    .map_err(|e| MetricsError::Sink(e.to_string()))?;

    Ok(Self { pool: Arc::new(pool) })
  }
}

#[async_trait]
impl MetricsSink for RelationalMetricsSink {
  async fn save(&self, record: &PerformanceRecord) -> Result<(), MetricsError> {
    let pool = Arc::clone(&self.pool);
    let row = NewPerformanceMetric::from(record);

    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get().map_err(|e| MetricsError::Sink(e.to_string()))?;
      diesel::insert_into(performance_metrics::table)
        .values(&row)
        .execute(&mut conn)
        .map_err(|e| MetricsError::Sink(e.to_string()))?;
      Ok(())
    })
    .await
    .map_err(|e| MetricsError::Sink(format!("Task join error: {}", e)))?
  }
}
