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

use thiserror::Error;

/// Dispatch-level failure kinds. Every error raised inside a request handler
/// bubbles up as one of these; the HTTP layer is the single point that turns
/// them into a status code and JSON envelope.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
  #[error("Bad request: {0}")]
  BadRequest(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  /// Reserved for future auth support, never emitted by the core.
  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  /// Reserved for future auth support, never emitted by the core.
  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Database '{name}' unavailable: {reason}")]
  DatabaseUnavailable { name: String, reason: String },

  #[error("Unknown database: {0}")]
  DatabaseUnknown(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl GatewayError {
  /// Machine-readable error code carried in the JSON envelope.
  pub fn error_code(&self) -> &'static str {
    match self {
      GatewayError::BadRequest(_) => "BAD_REQUEST",
      GatewayError::NotFound(_) => "NOT_FOUND",
      GatewayError::Conflict(_) => "CONFLICT",
      GatewayError::Unauthorized(_) => "UNAUTHORIZED",
      GatewayError::Forbidden(_) => "FORBIDDEN",
      GatewayError::DatabaseUnavailable { .. } => "DATABASE_UNAVAILABLE",
      GatewayError::DatabaseUnknown(_) | GatewayError::Config(_) | GatewayError::Internal(_) => {
        "INTERNAL_ERROR"
      }
    }
  }

  /// Human-readable text for the JSON envelope, without the kind prefix
  /// the `Display` impl adds.
  pub fn message(&self) -> String {
    match self {
      GatewayError::BadRequest(m)
      | GatewayError::NotFound(m)
      | GatewayError::Conflict(m)
      | GatewayError::Unauthorized(m)
      | GatewayError::Forbidden(m)
      | GatewayError::Config(m)
      | GatewayError::Internal(m) => m.clone(),
      GatewayError::DatabaseUnavailable { .. } | GatewayError::DatabaseUnknown(_) => {
        self.to_string()
      }
    }
  }

  /// HTTP status the error maps to.
  pub fn status_code(&self) -> u16 {
    match self {
      GatewayError::BadRequest(_) => 400,
      GatewayError::NotFound(_) => 404,
      GatewayError::Conflict(_) => 409,
      GatewayError::Unauthorized(_) => 401,
      GatewayError::Forbidden(_) => 403,
      GatewayError::DatabaseUnavailable { .. } => 503,
      GatewayError::DatabaseUnknown(_) | GatewayError::Config(_) | GatewayError::Internal(_) => 500,
    }
  }
}

impl From<serde_json::Error> for GatewayError {
  fn from(err: serde_json::Error) -> Self {
    GatewayError::Internal(format!("Serialization error: {}", err))
  }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
