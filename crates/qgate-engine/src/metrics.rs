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

//! Metrics collector
//!
//! Wraps the dispatch engine as before/after advice. Every collected request
//! updates a per-`(method, path-template)` aggregate; a sampled subset also
//! emits an immutable [`PerformanceRecord`] to the configured
//! [`MetricsSink`], optionally on a detached task. Collector failures are
//! logged and swallowed; they never affect the primary response.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qgate_core::MetricsConfig;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Pid, System};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum MetricsError {
  #[error("Metrics sink error: {0}")]
  Sink(String),
}

/// Running per-endpoint summary. Monotonically non-decreasing between
/// resets.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointAggregate {
  pub total_requests: u64,
  pub successful_requests: u64,
  pub total_response_millis: u64,
  pub last_request_timestamp: Option<DateTime<Utc>>,
}

impl EndpointAggregate {
  fn record(&mut self, status: u16, duration_millis: u64, now: DateTime<Utc>) {
    self.total_requests += 1;
    if (200..400).contains(&status) {
      self.successful_requests += 1;
    }
    self.total_response_millis += duration_millis;
    self.last_request_timestamp = Some(now);
  }

  pub fn average_response_millis(&self) -> f64 {
    if self.total_requests == 0 {
      0.0
    } else {
      self.total_response_millis as f64 / self.total_requests as f64
    }
  }

  pub fn success_rate(&self) -> f64 {
    if self.total_requests == 0 {
      0.0
    } else {
      self.successful_requests as f64 / self.total_requests as f64
    }
  }
}

/// Discriminator for the record variants; `Cache` carries hit counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
  Basic,
  Cache,
}

/// Immutable snapshot of one sampled request. Handed to the sink, never
/// retained in-process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
  pub kind: RecordKind,
  pub endpoint_key: String,
  pub method: String,
  pub start_timestamp: DateTime<Utc>,
  pub duration_millis: u64,
  pub memory_delta_bytes: u64,
  pub status_code: u16,
  pub success: bool,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub cache_hits: Option<u64>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub cache_misses: Option<u64>,
}

/// Destination for sampled performance records.
#[async_trait]
pub trait MetricsSink: Send + Sync {
  async fn save(&self, record: &PerformanceRecord) -> Result<(), MetricsError>;
}

/// Sink that writes records to the log stream.
#[derive(Debug, Default)]
pub struct LogMetricsSink;

#[async_trait]
impl MetricsSink for LogMetricsSink {
  async fn save(&self, record: &PerformanceRecord) -> Result<(), MetricsError> {
    info!(
      endpoint = %record.endpoint_key,
      duration_ms = record.duration_millis,
      memory_delta = record.memory_delta_bytes,
      status = record.status_code,
      "performance record"
    );
    Ok(())
  }
}

/// Per-request slot captured before handling. Task-local: it lives on the
/// handler's stack and is never shared.
#[derive(Debug)]
pub struct RequestTimer {
  method: String,
  template: String,
  started: Instant,
  start_wall: DateTime<Utc>,
  memory_before: u64,
}

pub struct MetricsCollector {
  enabled: bool,
  sampling_rate: f64,
  async_save: bool,
  exclude_paths: Vec<String>,
  aggregates: Mutex<HashMap<String, EndpointAggregate>>,
  sink: Arc<dyn MetricsSink>,
  system: Mutex<System>,
  pid: Option<Pid>,
}

impl MetricsCollector {
  pub fn new(config: &MetricsConfig, sink: Arc<dyn MetricsSink>) -> Self {
    Self {
      enabled: config.enabled,
      sampling_rate: config.sampling_rate.clamp(0.0, 1.0),
      async_save: config.async_save,
      exclude_paths: config.exclude_paths.clone(),
      aggregates: Mutex::new(HashMap::new()),
      sink,
      system: Mutex::new(System::new()),
      pid: sysinfo::get_current_pid().ok(),
    }
  }

  /// Collection applies when the collector is on and the request path is
  /// not under an excluded prefix.
  pub fn should_collect(&self, path: &str) -> bool {
    self.enabled && !self.exclude_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
  }

  /// Before-advice: capture the clock and resident memory.
  pub fn begin(&self, method: &str, template: &str, path: &str) -> Option<RequestTimer> {
    if !self.should_collect(path) {
      return None;
    }
    Some(RequestTimer {
      method: method.to_uppercase(),
      template: template.to_string(),
      started: Instant::now(),
      start_wall: Utc::now(),
      memory_before: self.resident_memory(),
    })
  }

  /// After-advice: fold the request into its aggregate and maybe emit a
  /// sampled record.
  pub async fn finish(&self, timer: RequestTimer, status: u16) {
    let duration_millis = timer.started.elapsed().as_millis() as u64;
    let memory_delta_bytes = self.resident_memory().saturating_sub(timer.memory_before);
    let key = format!("{} {}", timer.method, timer.template);
    let now = Utc::now();

    {
      let mut aggregates = self.aggregates.lock().expect("aggregate lock poisoned");
      aggregates.entry(key.clone()).or_default().record(status, duration_millis, now);
    }

    if !self.sampled() {
      return;
    }

    let record = PerformanceRecord {
      kind: RecordKind::Basic,
      endpoint_key: key,
      method: timer.method,
      start_timestamp: timer.start_wall,
      duration_millis,
      memory_delta_bytes,
      status_code: status,
      success: (200..400).contains(&status),
      cache_hits: None,
      cache_misses: None,
    };

    if self.async_save {
      let sink = Arc::clone(&self.sink);
      tokio::spawn(async move {
        if let Err(e) = sink.save(&record).await {
          warn!("metrics save failed: {}", e);
        }
      });
    } else if let Err(e) = self.sink.save(&record).await {
      warn!("metrics save failed: {}", e);
    }
  }

  fn sampled(&self) -> bool {
    if self.sampling_rate >= 1.0 {
      return true;
    }
    if self.sampling_rate <= 0.0 {
      return false;
    }
    rand::thread_rng().gen::<f64>() < self.sampling_rate
  }

  fn resident_memory(&self) -> u64 {
    let Some(pid) = self.pid else {
      return 0;
    };
    let mut system = self.system.lock().expect("system lock poisoned");
    if !system.refresh_process(pid) {
      debug!("process refresh failed, reporting zero memory");
      return 0;
    }
    system.process(pid).map(|p| p.memory()).unwrap_or(0)
  }

  /// Read-only snapshot of all aggregates, keyed `"METHOD /template"`.
  pub fn snapshot(&self) -> BTreeMap<String, EndpointAggregate> {
    self
      .aggregates
      .lock()
      .expect("aggregate lock poisoned")
      .iter()
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect()
  }

  pub fn reset(&self) {
    self.aggregates.lock().expect("aggregate lock poisoned").clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn collector(config: MetricsConfig) -> MetricsCollector {
    MetricsCollector::new(&config, Arc::new(LogMetricsSink))
  }

  fn default_config() -> MetricsConfig {
    MetricsConfig {
      enabled: true,
      sampling_rate: 0.0,
      async_save: false,
      exclude_paths: vec!["/api/metrics".to_string()],
      persist: false,
    }
  }

  #[test]
  fn test_should_collect_respects_excludes() {
    let c = collector(default_config());
    assert!(c.should_collect("/api/generic/stock-trades"));
    assert!(!c.should_collect("/api/metrics/endpoints"));

    let mut config = default_config();
    config.enabled = false;
    let c = collector(config);
    assert!(!c.should_collect("/api/generic/stock-trades"));
  }

  #[tokio::test]
  async fn test_aggregate_updates_and_success_counting() {
    let c = collector(default_config());

    for status in [200, 404, 500, 301] {
      let timer = c.begin("GET", "/api/trades/{symbol}", "/api/trades/AAPL").unwrap();
      c.finish(timer, status).await;
    }

    let snapshot = c.snapshot();
    let aggregate = snapshot.get("GET /api/trades/{symbol}").unwrap();
    assert_eq!(aggregate.total_requests, 4);
    // 200 and 301 count as success, 404 and 500 do not
    assert_eq!(aggregate.successful_requests, 2);
    assert!(aggregate.successful_requests <= aggregate.total_requests);
    assert!(aggregate.last_request_timestamp.is_some());
  }

  #[tokio::test]
  async fn test_template_is_the_aggregation_key() {
    let c = collector(default_config());
    for symbol in ["AAPL", "MSFT", "TSLA"] {
      let path = format!("/api/trades/{}", symbol);
      let timer = c.begin("GET", "/api/trades/{symbol}", &path).unwrap();
      c.finish(timer, 200).await;
    }
    let snapshot = c.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot["GET /api/trades/{symbol}"].total_requests, 3);
  }

  #[tokio::test]
  async fn test_reset_zeroes_aggregates() {
    let c = collector(default_config());
    let timer = c.begin("GET", "/t", "/t").unwrap();
    c.finish(timer, 200).await;
    assert_eq!(c.snapshot().len(), 1);
    c.reset();
    assert!(c.snapshot().is_empty());
  }

  #[tokio::test]
  async fn test_monotonicity_between_resets() {
    let c = collector(default_config());
    let mut last_total = 0;
    let mut last_millis = 0;
    for _ in 0..5 {
      let timer = c.begin("GET", "/t", "/t").unwrap();
      c.finish(timer, 200).await;
      let snapshot = c.snapshot();
      let aggregate = &snapshot["GET /t"];
      assert!(aggregate.total_requests > last_total);
      assert!(aggregate.total_response_millis >= last_millis);
      last_total = aggregate.total_requests;
      last_millis = aggregate.total_response_millis;
    }
  }

  #[test]
  fn test_average_and_success_rate_empty() {
    let aggregate = EndpointAggregate::default();
    assert_eq!(aggregate.average_response_millis(), 0.0);
    assert_eq!(aggregate.success_rate(), 0.0);
  }

  #[test]
  fn test_performance_record_serialises_camel_case() {
    let record = PerformanceRecord {
      kind: RecordKind::Basic,
      endpoint_key: "GET /t".to_string(),
      method: "GET".to_string(),
      start_timestamp: Utc::now(),
      duration_millis: 12,
      memory_delta_bytes: 0,
      status_code: 200,
      success: true,
      cache_hits: None,
      cache_misses: None,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["kind"], "BASIC");
    assert_eq!(json["endpointKey"], "GET /t");
    assert_eq!(json["durationMillis"], 12);
    assert!(json.get("cacheHits").is_none());
  }

  #[test]
  fn test_cache_record_carries_counters() {
    let record = PerformanceRecord {
      kind: RecordKind::Cache,
      endpoint_key: "GET /t".to_string(),
      method: "GET".to_string(),
      start_timestamp: Utc::now(),
      duration_millis: 1,
      memory_delta_bytes: 0,
      status_code: 200,
      success: true,
      cache_hits: Some(9),
      cache_misses: Some(1),
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["kind"], "CACHE");
    assert_eq!(json["cacheHits"], 9);
  }
}
