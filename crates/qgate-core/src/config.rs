/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-dot-]browne[-at-]dwightjbrowne[-dot-]com
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

use crate::error::{GatewayError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Which provider backs the catalogue store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
  File,
  Database,
}

/// When (and whether) the validator runs at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
  /// Validator not run at startup.
  Disabled,
  /// Both phases run at startup; fatal errors abort with exit code 1.
  Gate,
  /// Run both phases and exit without starting the HTTP host.
  ValidateOnly,
}

/// Metrics collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
  /// Master switch for the per-request hook.
  pub enabled: bool,

  /// Probability in [0,1] that a request emits a `PerformanceRecord`.
  pub sampling_rate: f64,

  /// Deliver sampled records on a background task without joining.
  pub async_save: bool,

  /// Path prefixes excluded from collection.
  pub exclude_paths: Vec<String>,

  /// Persist sampled records to the relational sink when the relational
  /// config database is configured.
  pub persist: bool,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      sampling_rate: 1.0,
      async_save: true,
      exclude_paths: vec!["/api/metrics".to_string(), "/api/health".to_string()],
      persist: false,
    }
  }
}

/// Main configuration for the gateway process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
  /// Bind address for the HTTP host.
  pub host: String,

  /// Bind port for the HTTP host.
  pub port: u16,

  /// Directory holding the three catalogue documents.
  pub catalog_dir: PathBuf,

  /// Catalogue provider selection (process-wide, fixed at startup).
  pub config_source: ConfigSource,

  /// Connection URL of the gateway's own config database. Required when
  /// `config_source` is `Database` or `metrics.persist` is set.
  pub config_database_url: Option<String>,

  /// Startup validation mode.
  pub validation: ValidationMode,

  pub metrics: MetricsConfig,

  /// Seconds to let in-flight requests drain at shutdown.
  pub shutdown_grace_secs: u64,
}

impl GatewayConfig {
  /// Load configuration from environment variables.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let host = env::var("QGATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    let port = env::var("QGATE_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse()
      .map_err(|_| GatewayError::Config("Invalid QGATE_PORT".to_string()))?;

    let catalog_dir =
      PathBuf::from(env::var("QGATE_CATALOG_DIR").unwrap_or_else(|_| "./config".to_string()));

    let config_source = match env::var("QGATE_CONFIG_SOURCE")
      .unwrap_or_else(|_| "file".to_string())
      .to_lowercase()
      .as_str()
    {
      "file" => ConfigSource::File,
      "database" => ConfigSource::Database,
      other => {
        return Err(GatewayError::Config(format!("Invalid QGATE_CONFIG_SOURCE: {}", other)));
      }
    };

    let config_database_url = env::var("QGATE_CONFIG_DATABASE_URL").ok();

    if config_source == ConfigSource::Database && config_database_url.is_none() {
      return Err(GatewayError::Config(
        "QGATE_CONFIG_DATABASE_URL required when QGATE_CONFIG_SOURCE=database".to_string(),
      ));
    }

    let validation = match env::var("QGATE_VALIDATION")
      .unwrap_or_else(|_| "disabled".to_string())
      .to_lowercase()
      .as_str()
    {
      "disabled" => ValidationMode::Disabled,
      "gate" => ValidationMode::Gate,
      "validate-only" => ValidationMode::ValidateOnly,
      other => return Err(GatewayError::Config(format!("Invalid QGATE_VALIDATION: {}", other))),
    };

    let sampling_rate: f64 = env::var("QGATE_METRICS_SAMPLING_RATE")
      .unwrap_or_else(|_| "1.0".to_string())
      .parse()
      .map_err(|_| GatewayError::Config("Invalid QGATE_METRICS_SAMPLING_RATE".to_string()))?;

    if !(0.0..=1.0).contains(&sampling_rate) {
      return Err(GatewayError::Config(
        "QGATE_METRICS_SAMPLING_RATE must be within [0,1]".to_string(),
      ));
    }

    let metrics = MetricsConfig {
      enabled: env_flag("QGATE_METRICS_ENABLED", true)?,
      sampling_rate,
      async_save: env_flag("QGATE_METRICS_ASYNC_SAVE", true)?,
      exclude_paths: env::var("QGATE_METRICS_EXCLUDE_PATHS")
        .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_else(|_| MetricsConfig::default().exclude_paths),
      persist: env_flag("QGATE_METRICS_PERSIST", false)?,
    };

    let shutdown_grace_secs = env::var("QGATE_SHUTDOWN_GRACE_SECS")
      .unwrap_or_else(|_| "10".to_string())
      .parse()
      .map_err(|_| GatewayError::Config("Invalid QGATE_SHUTDOWN_GRACE_SECS".to_string()))?;

    Ok(Self {
      host,
      port,
      catalog_dir,
      config_source,
      config_database_url,
      validation,
      metrics,
      shutdown_grace_secs,
    })
  }

  /// Create a config with defaults rooted at the given catalogue directory
  /// (for testing).
  pub fn default_with_catalog_dir(catalog_dir: PathBuf) -> Self {
    Self {
      host: "127.0.0.1".to_string(),
      port: 8080,
      catalog_dir,
      config_source: ConfigSource::File,
      config_database_url: None,
      validation: ValidationMode::Disabled,
      metrics: MetricsConfig::default(),
      shutdown_grace_secs: 10,
    }
  }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
  match env::var(name) {
    Err(_) => Ok(default),
    Ok(v) => match v.to_lowercase().as_str() {
      "true" | "1" | "yes" => Ok(true),
      "false" | "0" | "no" => Ok(false),
      _ => Err(GatewayError::Config(format!("Invalid {}: {}", name, v))),
    },
  }
}
