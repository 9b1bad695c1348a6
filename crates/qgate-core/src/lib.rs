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

//! # qgate-core
//!
//! Core types, configuration, and error handling for the qgate SQL gateway.
//!
//! This crate provides the foundational components shared across all qgate crates:
//!
//! - [`GatewayConfig`] - process configuration (host, catalogue location, validation mode, metrics)
//! - [`GatewayError`] and [`Result`] - unified error handling with HTTP status mapping
//! - Reserved query-string parameter names and shared formatting constants
//!
//! ## Example
//!
//! ```
//! use qgate_core::{GatewayError, PARAM_PAGE};
//!
//! let err = GatewayError::BadRequest("Required parameter missing: id".to_string());
//! assert_eq!(err.status_code(), 400);
//! assert_eq!(PARAM_PAGE, "page");
//! ```

pub mod config;
pub mod error;
pub use config::{ConfigSource, GatewayConfig, MetricsConfig, ValidationMode};
pub use error::{GatewayError, Result};

/// Reserved query-string parameter: zero-based page index for paginated endpoints.
pub const PARAM_PAGE: &str = "page";

/// Reserved query-string parameter: page size for paginated endpoints.
pub const PARAM_SIZE: &str = "size";

/// Reserved query-string parameter: fire-and-forget submission when `true`.
pub const PARAM_ASYNC: &str = "async";

/// Synthetic bind parameter injected for paginated endpoints.
pub const PARAM_LIMIT: &str = "limit";

/// Synthetic bind parameter injected for paginated endpoints.
pub const PARAM_OFFSET: &str = "offset";

/// All reserved query-string names that are never forwarded to the binder.
pub const RESERVED_PARAMS: [&str; 3] = [PARAM_PAGE, PARAM_SIZE, PARAM_ASYNC];

/// Wall-clock format used in error envelopes and performance records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Catalogue document names expected under the catalogue directory.
pub const DATABASES_FILE: &str = "databases.yaml";
pub const QUERIES_FILE: &str = "queries.yaml";
pub const ENDPOINTS_FILE: &str = "endpoints.yaml";

/// Upper bound on a paginated endpoint's `maxSize`.
pub const PAGINATION_SIZE_CEILING: u32 = 10_000;

/// Render the current wall clock in the envelope format.
pub fn envelope_timestamp() -> String {
  chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reserved_params_contents() {
    assert!(RESERVED_PARAMS.contains(&"page"));
    assert!(RESERVED_PARAMS.contains(&"size"));
    assert!(RESERVED_PARAMS.contains(&"async"));
    assert!(!RESERVED_PARAMS.contains(&"limit"));
  }

  #[test]
  fn test_envelope_timestamp_parses_back() {
    let ts = envelope_timestamp();
    assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
  }

  #[test]
  fn test_pagination_ceiling() {
    assert_eq!(PAGINATION_SIZE_CEILING, 10_000);
  }
}
