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

//! # qgate-engine
//!
//! The runtime dispatch engine of the qgate SQL gateway:
//!
//! - [`binder`] - coerces untyped request parameters into typed bind values
//! - [`dispatch`] - path-template resolution, pagination, response shaping,
//!   async fire-and-forget submissions
//! - [`validator`] - two-phase catalogue validation (chain + live schema)
//! - [`metrics`] - per-endpoint aggregates and sampled performance records

pub mod binder;
pub mod dispatch;
pub mod metrics;
pub mod validator;

pub use binder::{bind_parameters, ParamMap};
pub use dispatch::{match_path, AsyncAccepted, DispatchEngine, RouteMatch};
pub use metrics::{
  EndpointAggregate, LogMetricsSink, MetricsCollector, MetricsError, MetricsSink,
  PerformanceRecord, RecordKind, RequestTimer,
};
pub use validator::{
  validate_chain, validate_databases, validate_endpoints, validate_queries,
  validate_relationships, Report, Validator, ValidatorState,
};
