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

//! Health, introspection and on-demand validation routes

use crate::envelope::error_response;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use qgate_core::{envelope_timestamp, GatewayError};
use qgate_engine::{
  validate_databases, validate_endpoints, validate_queries, validate_relationships, Report,
};
use serde_json::json;

/// GET /api/health
pub async fn health() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "UP" }))
}

/// GET /api/generic/health
pub async fn engine_health(state: web::Data<AppState>) -> HttpResponse {
  let catalog = state.engine.snapshot();
  HttpResponse::Ok().json(json!({
    "status": "UP",
    "endpoints": catalog.endpoints.len(),
    "databases": {
      "available": state.manager.available_names(),
      "failed": state.manager.failed_snapshot(),
    },
    "timestamp": envelope_timestamp(),
  }))
}

/// GET /api/generic/endpoints
pub async fn list_endpoints(state: web::Data<AppState>) -> HttpResponse {
  let catalog = state.engine.snapshot();
  let endpoints: Vec<_> = catalog.endpoints.values().collect();
  HttpResponse::Ok().json(endpoints)
}

/// GET /api/generic/endpoints/{name}
pub async fn get_endpoint(
  req: HttpRequest,
  name: web::Path<String>,
  state: web::Data<AppState>,
) -> HttpResponse {
  let catalog = state.engine.snapshot();
  match catalog.endpoints.get(name.as_str()) {
    Some(endpoint) => HttpResponse::Ok().json(endpoint),
    None => error_response(
      &GatewayError::NotFound(format!("Unknown endpoint: {}", name)),
      req.path(),
    ),
  }
}

/// GET /api/generic/config
pub async fn full_config(state: web::Data<AppState>) -> HttpResponse {
  let catalog = state.engine.snapshot();
  HttpResponse::Ok().json(json!({
    "databases": catalog.databases,
    "queries": catalog.queries,
    "endpoints": catalog.endpoints,
  }))
}

fn report_response(report: Report) -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "valid": report.is_ok(),
    "successes": report.successes,
    "errors": report.errors,
    "timestamp": envelope_timestamp(),
  }))
}

/// GET /api/generic/config/validate - full two-phase run
pub async fn validate_all(state: web::Data<AppState>) -> HttpResponse {
  let catalog = state.engine.snapshot();
  report_response(state.validator.run(&catalog).await)
}

/// GET /api/generic/config/validate/endpoints
pub async fn validate_endpoints_only(state: web::Data<AppState>) -> HttpResponse {
  report_response(validate_endpoints(&state.engine.snapshot()))
}

/// GET /api/generic/config/validate/queries
pub async fn validate_queries_only(state: web::Data<AppState>) -> HttpResponse {
  report_response(validate_queries(&state.engine.snapshot()))
}

/// GET /api/generic/config/validate/databases
pub async fn validate_databases_only(state: web::Data<AppState>) -> HttpResponse {
  report_response(validate_databases(&state.engine.snapshot()))
}

/// GET /api/generic/config/validate/relationships
pub async fn validate_relationships_only(state: web::Data<AppState>) -> HttpResponse {
  report_response(validate_relationships(&state.engine.snapshot()))
}
