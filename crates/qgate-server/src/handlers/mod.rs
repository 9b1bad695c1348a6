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

pub mod admin;
pub mod config_mgmt;
pub mod dispatch;
pub mod metrics;

use actix_web::web;

/// Register the fixed admin surface; everything else falls through to the
/// dispatch engine's template matcher.
pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/api/health", web::get().to(admin::health))
    .route("/api/generic/health", web::get().to(admin::engine_health))
    .route("/api/generic/endpoints", web::get().to(admin::list_endpoints))
    .route("/api/generic/endpoints/{name}", web::get().to(admin::get_endpoint))
    .route("/api/generic/config", web::get().to(admin::full_config))
    .route("/api/generic/config/validate", web::get().to(admin::validate_all))
    .route(
      "/api/generic/config/validate/endpoints",
      web::get().to(admin::validate_endpoints_only),
    )
    .route("/api/generic/config/validate/queries", web::get().to(admin::validate_queries_only))
    .route(
      "/api/generic/config/validate/databases",
      web::get().to(admin::validate_databases_only),
    )
    .route(
      "/api/generic/config/validate/relationships",
      web::get().to(admin::validate_relationships_only),
    )
    .route("/api/metrics/endpoints", web::get().to(metrics::endpoint_metrics))
    .route("/api/metrics/reset", web::post().to(metrics::reset_metrics))
    .service(
      web::scope("/api/management/config-mgmt")
        .service(
          web::resource("/databases")
            .route(web::get().to(config_mgmt::list_databases))
            .route(web::post().to(config_mgmt::create_database)),
        )
        .service(
          web::resource("/databases/{name}")
            .route(web::get().to(config_mgmt::get_database))
            .route(web::put().to(config_mgmt::update_database))
            .route(web::delete().to(config_mgmt::delete_database)),
        )
        .service(
          web::resource("/queries")
            .route(web::get().to(config_mgmt::list_queries))
            .route(web::post().to(config_mgmt::create_query)),
        )
        .service(
          web::resource("/queries/{name}")
            .route(web::get().to(config_mgmt::get_query))
            .route(web::put().to(config_mgmt::update_query))
            .route(web::delete().to(config_mgmt::delete_query)),
        )
        .service(
          web::resource("/endpoints")
            .route(web::get().to(config_mgmt::list_endpoints))
            .route(web::post().to(config_mgmt::create_endpoint)),
        )
        .service(
          web::resource("/endpoints/{name}")
            .route(web::get().to(config_mgmt::get_endpoint))
            .route(web::put().to(config_mgmt::update_endpoint))
            .route(web::delete().to(config_mgmt::delete_endpoint)),
        ),
    )
    .default_service(web::to(dispatch::dispatch_request));
}
