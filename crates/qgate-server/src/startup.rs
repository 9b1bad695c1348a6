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

//! Startup orchestrator
//!
//! Load catalogue -> build pools (tolerating per-database failure) ->
//! optionally run the validator -> hand the built graph to the HTTP host.
//! Per-database failures degrade; global failures (catalogue unreadable,
//! bind failure) surface as errors and the process exits 1.

use crate::handlers;
use crate::sink::RelationalMetricsSink;
use crate::state::AppState;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use qgate_catalog::{CatalogStore, RelationalCatalogStore, YamlCatalogStore};
use qgate_core::{ConfigSource, GatewayConfig, ValidationMode};
use qgate_db::{ConnectionManager, QueryExecutor};
use qgate_engine::{
  DispatchEngine, LogMetricsSink, MetricsCollector, MetricsSink, Report, Validator,
};
use std::sync::Arc;
use tracing::{error, info, warn};

fn build_store(config: &GatewayConfig) -> Result<Arc<dyn CatalogStore>> {
  match config.config_source {
    ConfigSource::File => {
      let store = YamlCatalogStore::open(&config.catalog_dir)
        .with_context(|| format!("loading catalogue from {}", config.catalog_dir.display()))?;
      Ok(Arc::new(store))
    }
    ConfigSource::Database => {
      let url = config
        .config_database_url
        .as_deref()
        .context("QGATE_CONFIG_DATABASE_URL is required for the relational store")?;
      let store = RelationalCatalogStore::connect(url).context("connecting the config database")?;
      Ok(Arc::new(store))
    }
  }
}

fn build_sink(config: &GatewayConfig) -> Arc<dyn MetricsSink> {
  if config.metrics.persist {
    if let Some(url) = config.config_database_url.as_deref() {
      match RelationalMetricsSink::connect(url) {
        Ok(sink) => return Arc::new(sink),
        Err(e) => warn!("metrics persistence disabled: {}", e),
      }
    } else {
      warn!("QGATE_METRICS_PERSIST set but no config database URL; falling back to log sink");
    }
  }
  Arc::new(LogMetricsSink)
}

fn print_report(report: &Report) {
  for line in &report.successes {
    info!("validation ok: {}", line);
  }
  for line in &report.errors {
    error!("validation error: {}", line);
  }
}

/// Run the gateway. Returns the process exit code.
pub async fn run(config: GatewayConfig, validate_only_override: bool) -> Result<i32> {
  let store = build_store(&config)?;
  let catalog = Arc::new(store.load_all().await.context("loading catalogue")?);
  info!(
    databases = catalog.databases.len(),
    queries = catalog.queries.len(),
    endpoints = catalog.endpoints.len(),
    "catalogue loaded"
  );

  let manager = Arc::new(ConnectionManager::build(&catalog).await);
  for (name, reason) in manager.failed_snapshot() {
    warn!(database = %name, %reason, "database starts degraded");
  }

  let validator = Arc::new(Validator::new(Arc::clone(&manager)));
  let mode =
    if validate_only_override { ValidationMode::ValidateOnly } else { config.validation };

  match mode {
    ValidationMode::ValidateOnly => {
      let report = validator.run(&catalog).await;
      print_report(&report);
      manager.close_all();
      return Ok(if report.is_ok() { 0 } else { 1 });
    }
    ValidationMode::Gate => {
      let report = validator.run(&catalog).await;
      print_report(&report);
      if !report.is_ok() {
        error!("startup validation failed with {} error(s)", report.errors.len());
        manager.close_all();
        return Ok(1);
      }
    }
    ValidationMode::Disabled => {}
  }

  let metrics = Arc::new(MetricsCollector::new(&config.metrics, build_sink(&config)));
  let executor = QueryExecutor::new(Arc::clone(&manager));
  let engine = Arc::new(DispatchEngine::new(Arc::clone(&catalog), executor));

  let state = web::Data::new(AppState {
    config: config.clone(),
    store,
    manager: Arc::clone(&manager),
    engine,
    metrics,
    validator,
  });

  let bind_addr = (config.host.clone(), config.port);
  info!(host = %config.host, port = config.port, "gateway ready");

  HttpServer::new(move || App::new().app_data(state.clone()).configure(handlers::configure))
    .shutdown_timeout(config.shutdown_grace_secs)
    .bind(bind_addr)
    .with_context(|| format!("binding {}:{}", config.host, config.port))?
    .run()
    .await
    .context("HTTP host failed")?;

  info!("HTTP host stopped, closing pools");
  manager.close_all();
  Ok(0)
}
