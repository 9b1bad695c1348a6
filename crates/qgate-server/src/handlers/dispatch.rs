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

//! Catch-all dispatch handler
//!
//! Every request that no admin route claimed lands here. The engine's
//! template matcher resolves it against the current catalogue snapshot, so
//! catalogue reloads take effect without touching actix's router.

use crate::envelope::error_response;
use crate::state::AppState;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use qgate_core::{GatewayError, Result};
use qgate_engine::{DispatchEngine, ParamMap};
use serde_json::Value;
use std::collections::HashMap;

/// Parameter precedence, later overriding earlier: query string, path
/// variables, form fields, JSON body object (top-level keys only).
fn gather_params(
  req: &HttpRequest,
  body: &web::Bytes,
  path_params: &HashMap<String, String>,
) -> Result<ParamMap> {
  let mut params = ParamMap::new();

  let query_pairs: Vec<(String, String)> = serde_urlencoded::from_str(req.query_string())
    .map_err(|e| GatewayError::BadRequest(format!("Malformed query string: {}", e)))?;
  for (name, value) in query_pairs {
    params.insert(name, Value::String(value));
  }

  for (name, value) in path_params {
    params.insert(name.clone(), Value::String(value.clone()));
  }

  let content_type = req
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_lowercase();

  if content_type.starts_with("application/x-www-form-urlencoded") && !body.is_empty() {
    let text = std::str::from_utf8(body)
      .map_err(|_| GatewayError::BadRequest("Form body is not valid UTF-8".to_string()))?;
    let form_pairs: Vec<(String, String)> = serde_urlencoded::from_str(text)
      .map_err(|e| GatewayError::BadRequest(format!("Malformed form body: {}", e)))?;
    for (name, value) in form_pairs {
      params.insert(name, Value::String(value));
    }
  } else if content_type.starts_with("application/json") && !body.is_empty() {
    let value: Value = serde_json::from_slice(body)
      .map_err(|e| GatewayError::BadRequest(format!("Malformed JSON body: {}", e)))?;
    if let Value::Object(map) = value {
      for (name, value) in map {
        params.insert(name, value);
      }
    }
  }

  Ok(params)
}

/// Dispatch one user-configured endpoint request.
pub async fn dispatch_request(
  req: HttpRequest,
  body: web::Bytes,
  state: web::Data<AppState>,
) -> HttpResponse {
  let path = req.path().to_string();
  let method = req.method().as_str().to_string();

  let Some(route) = state.engine.resolve(&method, &path) else {
    return error_response(
      &GatewayError::NotFound(format!("No endpoint for {} {}", method, path)),
      &path,
    );
  };

  // metrics keys on the declared template, not the concrete URL
  let timer = state.metrics.begin(&route.endpoint.method, &route.endpoint.path, &path);

  let response = match gather_params(&req, &body, &route.path_params) {
    Err(e) => error_response(&e, &path),
    Ok(params) => {
      if DispatchEngine::is_async_request(&params) {
        let accepted = state.engine.submit_async(route.endpoint.clone(), params);
        HttpResponse::Accepted().json(accepted.to_json())
      } else {
        match state.engine.dispatch(&route.endpoint, &params).await {
          Ok(body) => HttpResponse::Ok().json(body),
          Err(e) => error_response(&e, &path),
        }
      }
    }
  };

  if let Some(timer) = timer {
    state.metrics.finish(timer, response.status().as_u16()).await;
  }

  response
}
