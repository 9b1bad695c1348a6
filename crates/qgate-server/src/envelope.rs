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

//! Error envelope
//!
//! The single choke point that turns a [`GatewayError`] into an HTTP
//! response. Every non-2xx body has the same shape.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use qgate_core::{envelope_timestamp, GatewayError};
use serde_json::json;

/// JSON body for a failed request.
pub fn error_body(err: &GatewayError, path: &str) -> serde_json::Value {
  json!({
    "error": true,
    "errorCode": err.error_code(),
    "message": err.message(),
    "path": path,
    "timestamp": envelope_timestamp(),
  })
}

/// Full HTTP response for a failed request.
pub fn error_response(err: &GatewayError, path: &str) -> HttpResponse {
  let status =
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  HttpResponse::build(status).json(error_body(err, path))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_body_shape() {
    let err = GatewayError::BadRequest("Required parameter missing: id".to_string());
    let body = error_body(&err, "/api/generic/stock-trades");
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["errorCode"], json!("BAD_REQUEST"));
    assert_eq!(body["message"], json!("Required parameter missing: id"));
    assert_eq!(body["path"], json!("/api/generic/stock-trades"));
    let ts = body["timestamp"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").is_ok());
  }

  #[test]
  fn test_error_response_status() {
    let err = GatewayError::DatabaseUnavailable {
      name: "staging".to_string(),
      reason: "connection refused".to_string(),
    };
    let resp = error_response(&err, "/x");
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  }
}
