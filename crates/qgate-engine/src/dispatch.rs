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

//! Dispatch engine
//!
//! Resolves `(method, concrete path)` against the endpoint catalogue's path
//! templates, runs binder and executor, and shapes the response. The
//! catalogue snapshot is swapped atomically on reload; a request keeps the
//! snapshot it resolved against for its whole lifetime, so no actix route
//! is ever re-registered.

use crate::binder::{bind_parameters, ParamMap};
use qgate_catalog::{Catalog, EndpointSpec, PaginationSpec, QuerySpec};
use qgate_core::{
  GatewayError, Result, PARAM_ASYNC, PARAM_LIMIT, PARAM_OFFSET, PARAM_PAGE, PARAM_SIZE,
};
use qgate_db::QueryExecutor;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{error, info};
use uuid::Uuid;

/// Match a `{name}`-templated path against a concrete request path.
/// Returns the captured path variables on success.
pub fn match_path(template: &str, path: &str) -> Option<HashMap<String, String>> {
  let template_segments: Vec<&str> = template.split('/').collect();
  let path_segments: Vec<&str> = path.split('/').collect();
  if template_segments.len() != path_segments.len() {
    return None;
  }

  let mut vars = HashMap::new();
  for (t, p) in template_segments.iter().zip(path_segments.iter()) {
    if t.starts_with('{') && t.ends_with('}') && t.len() > 2 {
      if p.is_empty() {
        return None;
      }
      vars.insert(t[1..t.len() - 1].to_string(), p.to_string());
    } else if t != p {
      return None;
    }
  }
  Some(vars)
}

/// A resolved route: the owning endpoint plus captured path variables.
#[derive(Debug, Clone)]
pub struct RouteMatch {
  pub endpoint: EndpointSpec,
  pub path_params: HashMap<String, String>,
}

/// Body of a 202 response for an async submission.
#[derive(Debug, Clone)]
pub struct AsyncAccepted {
  pub request_id: Uuid,
  pub endpoint: String,
}

impl AsyncAccepted {
  pub fn to_json(&self) -> Value {
    json!({
      "message": "Request accepted for asynchronous processing",
      "requestId": self.request_id.to_string(),
      "endpoint": self.endpoint,
      "timestamp": chrono::Utc::now().timestamp_millis(),
    })
  }
}

pub struct DispatchEngine {
  catalog: RwLock<Arc<Catalog>>,
  executor: QueryExecutor,
}

impl DispatchEngine {
  pub fn new(catalog: Arc<Catalog>, executor: QueryExecutor) -> Self {
    Self { catalog: RwLock::new(catalog), executor }
  }

  /// Current catalogue snapshot. Callers hold the Arc for the lifetime of
  /// one request.
  pub fn snapshot(&self) -> Arc<Catalog> {
    Arc::clone(&self.catalog.read().expect("catalog lock poisoned"))
  }

  /// Swap in a rebuilt snapshot after an admin write.
  pub fn rebind(&self, catalog: Arc<Catalog>) {
    *self.catalog.write().expect("catalog lock poisoned") = catalog;
  }

  pub fn executor(&self) -> &QueryExecutor {
    &self.executor
  }

  /// Resolve an inbound request against the endpoint templates.
  pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch> {
    let catalog = self.snapshot();
    let method = method.to_uppercase();
    for endpoint in catalog.endpoints.values() {
      if endpoint.method != method {
        continue;
      }
      if let Some(path_params) = match_path(&endpoint.path, path) {
        return Some(RouteMatch { endpoint: endpoint.clone(), path_params });
      }
    }
    None
  }

  /// Whether the client asked for fire-and-forget handling.
  pub fn is_async_request(params: &ParamMap) -> bool {
    params
      .get(PARAM_ASYNC)
      .map(|v| match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
      })
      .unwrap_or(false)
  }

  /// Run the full pipeline inline and shape the response body.
  pub async fn dispatch(&self, endpoint: &EndpointSpec, params: &ParamMap) -> Result<Value> {
    let catalog = self.snapshot();
    let query = catalog
      .query_for_endpoint(endpoint)
      .ok_or_else(|| {
        GatewayError::Internal(format!(
          "endpoint '{}' references unknown query '{}'",
          endpoint.name, endpoint.query_name
        ))
      })?
      .clone();

    match endpoint.pagination.as_ref().filter(|p| p.enabled) {
      Some(pagination) => {
        self.dispatch_paged(endpoint, pagination, &query, &catalog, params).await
      }
      None => self.dispatch_plain(&query, params).await,
    }
  }

  /// Fork the same pipeline onto a detached task and answer immediately.
  /// The task's outcome is logged and discarded; no durability guarantee.
  pub fn submit_async(
    self: &Arc<Self>,
    endpoint: EndpointSpec,
    params: ParamMap,
  ) -> AsyncAccepted {
    let accepted = AsyncAccepted { request_id: Uuid::new_v4(), endpoint: endpoint.name.clone() };
    let engine = Arc::clone(self);
    let request_id = accepted.request_id;
    tokio::spawn(async move {
      match engine.dispatch(&endpoint, &params).await {
        Ok(_) => {
          info!(endpoint = %endpoint.name, %request_id, "async request completed");
        }
        Err(e) => {
          error!(endpoint = %endpoint.name, %request_id, error = %e, "async request failed");
        }
      }
    });
    accepted
  }

  async fn dispatch_plain(&self, query: &QuerySpec, params: &ParamMap) -> Result<Value> {
    let binds = bind_parameters(query, &scrub_reserved(params))?;
    let mut rows = self.executor.execute(query, &binds).await?;
    match rows.len() {
      0 => Err(GatewayError::NotFound("no data found".to_string())),
      1 => Ok(Value::Object(rows.remove(0))),
      _ => Ok(json!({ "data": rows })),
    }
  }

  async fn dispatch_paged(
    &self,
    endpoint: &EndpointSpec,
    pagination: &PaginationSpec,
    query: &QuerySpec,
    catalog: &Catalog,
    params: &ParamMap,
  ) -> Result<Value> {
    let page = int_param(params, PARAM_PAGE, 0)?;
    let size = int_param(params, PARAM_SIZE, pagination.default_size as i64)?;
    if page < 0 {
      return Err(GatewayError::BadRequest(format!("page must be >= 0, got {}", page)));
    }
    if size <= 0 || size > pagination.max_size as i64 {
      return Err(GatewayError::BadRequest(format!(
        "size must be within 1..={}, got {}",
        pagination.max_size, size
      )));
    }
    let offset = page * size;

    // synthetic limit/offset ride after the declared parameters; they bind
    // only if the query declares them
    let declared = scrub_reserved(params);
    let mut paged_params = declared.clone();
    paged_params.insert(PARAM_LIMIT.to_string(), json!(size));
    paged_params.insert(PARAM_OFFSET.to_string(), json!(offset));

    let binds = bind_parameters(query, &paged_params)?;
    let rows = self.executor.execute(query, &binds).await?;

    let (total, last) = match &endpoint.count_query_name {
      Some(count_name) => {
        let count_query = catalog.queries.get(count_name).ok_or_else(|| {
          GatewayError::Internal(format!(
            "endpoint '{}' references unknown count query '{}'",
            endpoint.name, count_name
          ))
        })?;
        // the count query sees the declared parameters only
        let count_binds = bind_parameters(count_query, &declared)?;
        let total = self.executor.execute_count(count_query, &count_binds).await?;
        (total, (page + 1) * size >= total)
      }
      None => derived_total(offset, size, rows.len() as i64),
    };

    Ok(paged_envelope(rows, page, size, total, last))
  }
}

/// Page accounting when no count query is configured: the total is only
/// known to the end of the current page, and a short page marks the last
/// one. A full page never does, even when it exhausts the table.
fn derived_total(offset: i64, size: i64, returned: i64) -> (i64, bool) {
  (offset + returned, returned < size)
}

/// Reserved query-string names never reach the binder.
fn scrub_reserved(params: &ParamMap) -> ParamMap {
  let mut scrubbed = params.clone();
  scrubbed.remove(PARAM_PAGE);
  scrubbed.remove(PARAM_SIZE);
  scrubbed.remove(PARAM_ASYNC);
  scrubbed
}

/// Build the pagination envelope. `last` is the caller's to decide: exact
/// when a count query supplied the total, short-page-derived otherwise.
pub fn paged_envelope(
  rows: Vec<Map<String, Value>>,
  page: i64,
  size: i64,
  total: i64,
  last: bool,
) -> Value {
  let total_pages = if total == 0 { 0 } else { (total + size - 1) / size };
  json!({
    "data": rows,
    "page": page,
    "size": size,
    "totalElements": total,
    "totalPages": total_pages,
    "first": page == 0,
    "last": last,
  })
}

fn int_param(params: &ParamMap, name: &str, default: i64) -> Result<i64> {
  match params.get(name) {
    None | Some(Value::Null) => Ok(default),
    Some(Value::Number(n)) => {
      n.as_i64().ok_or_else(|| bad_int(name, &Value::Number(n.clone())))
    }
    Some(Value::String(s)) if s.is_empty() => Ok(default),
    Some(Value::String(s)) => {
      s.trim().parse::<i64>().map_err(|_| bad_int(name, &Value::String(s.clone())))
    }
    Some(other) => Err(bad_int(name, other)),
  }
}

fn bad_int(name: &str, value: &Value) -> GatewayError {
  GatewayError::BadRequest(format!("Invalid integer for parameter '{}': {}", name, value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_match_path_exact() {
    let vars = match_path("/api/generic/stock-trades", "/api/generic/stock-trades").unwrap();
    assert!(vars.is_empty());
    assert!(match_path("/api/generic/stock-trades", "/api/generic/other").is_none());
  }

  #[test]
  fn test_match_path_placeholder() {
    let vars = match_path(
      "/api/generic/stock-trades/symbol/{symbol}",
      "/api/generic/stock-trades/symbol/AAPL",
    )
    .unwrap();
    assert_eq!(vars.get("symbol").map(String::as_str), Some("AAPL"));
  }

  #[test]
  fn test_match_path_length_mismatch() {
    assert!(match_path("/a/{x}", "/a").is_none());
    assert!(match_path("/a/{x}", "/a/b/c").is_none());
  }

  #[test]
  fn test_match_path_empty_segment_does_not_bind() {
    assert!(match_path("/a/{x}", "/a/").is_none());
  }

  #[test]
  fn test_match_path_multiple_placeholders() {
    let vars = match_path("/t/{a}/x/{b}", "/t/1/x/2").unwrap();
    assert_eq!(vars.get("a").map(String::as_str), Some("1"));
    assert_eq!(vars.get("b").map(String::as_str), Some("2"));
  }

  #[test]
  fn test_paged_envelope_math() {
    let body = paged_envelope(vec![Map::new(), Map::new()], 0, 2, 3, false);
    assert_eq!(body["page"], json!(0));
    assert_eq!(body["size"], json!(2));
    assert_eq!(body["totalElements"], json!(3));
    assert_eq!(body["totalPages"], json!(2));
    assert_eq!(body["first"], json!(true));
    assert_eq!(body["last"], json!(false));

    let body = paged_envelope(vec![Map::new()], 1, 2, 3, true);
    assert_eq!(body["first"], json!(false));
    assert_eq!(body["last"], json!(true));
  }

  #[test]
  fn test_paged_envelope_empty() {
    let body = paged_envelope(vec![], 0, 20, 0, true);
    assert_eq!(body["totalPages"], json!(0));
    assert_eq!(body["last"], json!(true));
  }

  #[test]
  fn test_derived_total_full_page_is_not_last() {
    // page 0 of a larger table: LIMIT filled the page, more may follow
    assert_eq!(derived_total(0, 2, 2), (2, false));
    // a later full page is not last either
    assert_eq!(derived_total(4, 2, 2), (6, false));
  }

  #[test]
  fn test_derived_total_short_or_empty_page_is_last() {
    assert_eq!(derived_total(4, 2, 1), (5, true));
    assert_eq!(derived_total(0, 20, 0), (0, true));
  }

  #[test]
  fn test_int_param_parsing() {
    let mut params = ParamMap::new();
    assert_eq!(int_param(&params, "page", 0).unwrap(), 0);

    params.insert("page".to_string(), json!("3"));
    assert_eq!(int_param(&params, "page", 0).unwrap(), 3);

    params.insert("page".to_string(), json!(5));
    assert_eq!(int_param(&params, "page", 0).unwrap(), 5);

    params.insert("page".to_string(), json!("x"));
    assert!(int_param(&params, "page", 0).is_err());
  }

  #[test]
  fn test_is_async_request() {
    let mut params = ParamMap::new();
    assert!(!DispatchEngine::is_async_request(&params));
    params.insert("async".to_string(), json!("true"));
    assert!(DispatchEngine::is_async_request(&params));
    params.insert("async".to_string(), json!("TRUE"));
    assert!(DispatchEngine::is_async_request(&params));
    params.insert("async".to_string(), json!("1"));
    assert!(!DispatchEngine::is_async_request(&params));
  }

  #[test]
  fn test_async_accepted_body() {
    let accepted = AsyncAccepted { request_id: Uuid::new_v4(), endpoint: "trades".to_string() };
    let body = accepted.to_json();
    assert_eq!(body["endpoint"], json!("trades"));
    // UUID v4 shape: 36 chars, version nibble 4
    let id = body["requestId"].as_str().unwrap();
    assert_eq!(id.len(), 36);
    assert_eq!(id.as_bytes()[14], b'4');
    assert!(body["timestamp"].is_i64());
  }
}
