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

//! Metrics admin routes

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use qgate_core::envelope_timestamp;
use serde_json::{json, Map, Value};

/// GET /api/metrics/endpoints - aggregate snapshot with derived rates
pub async fn endpoint_metrics(state: web::Data<AppState>) -> HttpResponse {
  let mut body = Map::new();
  for (key, aggregate) in state.metrics.snapshot() {
    body.insert(
      key,
      json!({
        "totalRequests": aggregate.total_requests,
        "successfulRequests": aggregate.successful_requests,
        "totalResponseMillis": aggregate.total_response_millis,
        "averageResponseMillis": aggregate.average_response_millis(),
        "successRate": aggregate.success_rate(),
        "lastRequestTimestamp": aggregate.last_request_timestamp,
      }),
    );
  }
  HttpResponse::Ok().json(Value::Object(body))
}

/// POST /api/metrics/reset
pub async fn reset_metrics(state: web::Data<AppState>) -> HttpResponse {
  state.metrics.reset();
  HttpResponse::Ok().json(json!({
    "message": "Endpoint metrics reset",
    "timestamp": envelope_timestamp(),
  }))
}
