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

//! Catalogue store admin (CRUD)
//!
//! Writes go through the configured store and are followed by a synchronous
//! snapshot rebind, so the dispatch engine and connection manager pick the
//! change up before the response is sent.

use crate::envelope::error_response;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use qgate_catalog::{DatabaseSpec, EndpointSpec, QuerySpec};
use qgate_core::GatewayError;
use serde_json::json;

async fn rebind_or_error(state: &AppState, req: &HttpRequest) -> Option<HttpResponse> {
  match state.reload().await {
    Ok(()) => None,
    Err(e) => Some(error_response(&e, req.path())),
  }
}

fn not_found(req: &HttpRequest, what: &str, name: &str) -> HttpResponse {
  error_response(&GatewayError::NotFound(format!("Unknown {}: {}", what, name)), req.path())
}

fn conflict(req: &HttpRequest, what: &str, name: &str) -> HttpResponse {
  error_response(
    &GatewayError::Conflict(format!("{} '{}' already exists", what, name)),
    req.path(),
  )
}

// ---- databases -----------------------------------------------------------

pub async fn list_databases(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
  match state.store.load_all().await {
    Ok(catalog) => {
      HttpResponse::Ok().json(catalog.databases.values().collect::<Vec<_>>())
    }
    Err(e) => error_response(&e.into(), req.path()),
  }
}

pub async fn get_database(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
) -> HttpResponse {
  match state.store.database(&name).await {
    Ok(Some(spec)) => HttpResponse::Ok().json(spec),
    Ok(None) => not_found(&req, "database", &name),
    Err(e) => error_response(&e.into(), req.path()),
  }
}

pub async fn create_database(
  state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Json<DatabaseSpec>,
) -> HttpResponse {
  let spec = body.into_inner();
  match state.store.database_exists(&spec.name).await {
    Ok(true) => return conflict(&req, "database", &spec.name),
    Ok(false) => {}
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Err(e) = state.store.upsert_database(spec.clone()).await {
    return error_response(&e.into(), req.path());
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Created().json(spec)
}

pub async fn update_database(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
  body: web::Json<DatabaseSpec>,
) -> HttpResponse {
  let mut spec = body.into_inner();
  spec.name = name.into_inner();
  match state.store.database_exists(&spec.name).await {
    Ok(false) => return not_found(&req, "database", &spec.name),
    Ok(true) => {}
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Err(e) = state.store.upsert_database(spec.clone()).await {
    return error_response(&e.into(), req.path());
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Ok().json(spec)
}

pub async fn delete_database(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
) -> HttpResponse {
  match state.store.delete_database(&name).await {
    Ok(true) => {}
    Ok(false) => return not_found(&req, "database", &name),
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Ok().json(json!({ "deleted": true, "name": name.as_str() }))
}

// ---- queries -------------------------------------------------------------

pub async fn list_queries(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
  match state.store.load_all().await {
    Ok(catalog) => HttpResponse::Ok().json(catalog.queries.values().collect::<Vec<_>>()),
    Err(e) => error_response(&e.into(), req.path()),
  }
}

pub async fn get_query(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
) -> HttpResponse {
  match state.store.query(&name).await {
    Ok(Some(spec)) => HttpResponse::Ok().json(spec),
    Ok(None) => not_found(&req, "query", &name),
    Err(e) => error_response(&e.into(), req.path()),
  }
}

pub async fn create_query(
  state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Json<QuerySpec>,
) -> HttpResponse {
  let spec = body.into_inner();
  match state.store.query_exists(&spec.name).await {
    Ok(true) => return conflict(&req, "query", &spec.name),
    Ok(false) => {}
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Err(e) = state.store.upsert_query(spec.clone()).await {
    return error_response(&e.into(), req.path());
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Created().json(spec)
}

pub async fn update_query(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
  body: web::Json<QuerySpec>,
) -> HttpResponse {
  let mut spec = body.into_inner();
  spec.name = name.into_inner();
  match state.store.query_exists(&spec.name).await {
    Ok(false) => return not_found(&req, "query", &spec.name),
    Ok(true) => {}
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Err(e) = state.store.upsert_query(spec.clone()).await {
    return error_response(&e.into(), req.path());
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Ok().json(spec)
}

pub async fn delete_query(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
) -> HttpResponse {
  match state.store.delete_query(&name).await {
    Ok(true) => {}
    Ok(false) => return not_found(&req, "query", &name),
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Ok().json(json!({ "deleted": true, "name": name.as_str() }))
}

// ---- endpoints -----------------------------------------------------------

pub async fn list_endpoints(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
  match state.store.load_all().await {
    Ok(catalog) => HttpResponse::Ok().json(catalog.endpoints.values().collect::<Vec<_>>()),
    Err(e) => error_response(&e.into(), req.path()),
  }
}

pub async fn get_endpoint(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
) -> HttpResponse {
  match state.store.endpoint(&name).await {
    Ok(Some(spec)) => HttpResponse::Ok().json(spec),
    Ok(None) => not_found(&req, "endpoint", &name),
    Err(e) => error_response(&e.into(), req.path()),
  }
}

pub async fn create_endpoint(
  state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Json<EndpointSpec>,
) -> HttpResponse {
  let spec = body.into_inner();
  match state.store.endpoint_exists(&spec.name).await {
    Ok(true) => return conflict(&req, "endpoint", &spec.name),
    Ok(false) => {}
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Err(e) = state.store.upsert_endpoint(spec.clone()).await {
    return error_response(&e.into(), req.path());
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Created().json(spec)
}

pub async fn update_endpoint(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
  body: web::Json<EndpointSpec>,
) -> HttpResponse {
  let mut spec = body.into_inner();
  spec.name = name.into_inner();
  match state.store.endpoint_exists(&spec.name).await {
    Ok(false) => return not_found(&req, "endpoint", &spec.name),
    Ok(true) => {}
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Err(e) = state.store.upsert_endpoint(spec.clone()).await {
    return error_response(&e.into(), req.path());
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Ok().json(spec)
}

pub async fn delete_endpoint(
  state: web::Data<AppState>,
  req: HttpRequest,
  name: web::Path<String>,
) -> HttpResponse {
  match state.store.delete_endpoint(&name).await {
    Ok(true) => {}
    Ok(false) => return not_found(&req, "endpoint", &name),
    Err(e) => return error_response(&e.into(), req.path()),
  }
  if let Some(resp) = rebind_or_error(&state, &req).await {
    return resp;
  }
  HttpResponse::Ok().json(json!({ "deleted": true, "name": name.as_str() }))
}
