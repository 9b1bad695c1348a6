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

//! Parameter binder
//!
//! Coerces the untyped request parameter map into typed bind values per the
//! query's declared parameters. Parameters resolve in declaration order,
//! producing contiguous positions 1..N. Values that arrived already typed
//! (numbers and booleans from a JSON body) are accepted without a string
//! round trip when compatible.

use chrono::{NaiveDate, NaiveDateTime};
use qgate_catalog::{ParamType, QueryParamSpec, QuerySpec};
use qgate_core::{GatewayError, Result};
use qgate_db::BindValue;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Untyped parameters gathered from the HTTP request.
pub type ParamMap = HashMap<String, Value>;

/// Timestamp formats tried in order; first success wins.
const TIMESTAMP_FORMATS: [&str; 4] = [
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.3f",
  "%Y-%m-%dT%H:%M:%S%.3f",
];

/// Resolve every declared parameter of `query` against `params`, yielding
/// the positional bind list.
pub fn bind_parameters(query: &QuerySpec, params: &ParamMap) -> Result<Vec<BindValue>> {
  let mut binds = Vec::with_capacity(query.parameters.len());
  for spec in &query.parameters {
    match params.get(&spec.name) {
      Some(value) if !is_missing(Some(value)) => binds.push(coerce(spec, value)?),
      _ => {
        if spec.required {
          return Err(GatewayError::BadRequest(format!(
            "Required parameter missing: {}",
            spec.name
          )));
        }
        binds.push(BindValue::Null);
      }
    }
  }
  Ok(binds)
}

/// Missing means absent, JSON null, or the empty string.
fn is_missing(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.is_empty(),
    _ => false,
  }
}

fn coerce(spec: &QueryParamSpec, value: &Value) -> Result<BindValue> {
  match spec.param_type {
    ParamType::String => Ok(BindValue::Text(stringify(value))),

    ParamType::Integer => match value {
      Value::Number(n) => n
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .map(BindValue::Int)
        .ok_or_else(|| bad_value(spec, value)),
      Value::String(s) => s.trim().parse::<i32>().map(BindValue::Int).map_err(|_| bad_value(spec, value)),
      _ => Err(bad_value(spec, value)),
    },

    ParamType::Long => match value {
      Value::Number(n) => n.as_i64().map(BindValue::Long).ok_or_else(|| bad_value(spec, value)),
      Value::String(s) => {
        s.trim().parse::<i64>().map(BindValue::Long).map_err(|_| bad_value(spec, value))
      }
      _ => Err(bad_value(spec, value)),
    },

    ParamType::Decimal => match value {
      Value::Number(n) => {
        Decimal::from_str(&n.to_string()).map(BindValue::Decimal).map_err(|_| bad_value(spec, value))
      }
      Value::String(s) => {
        Decimal::from_str(s.trim()).map(BindValue::Decimal).map_err(|_| bad_value(spec, value))
      }
      _ => Err(bad_value(spec, value)),
    },

    ParamType::Boolean => match value {
      Value::Bool(b) => Ok(BindValue::Bool(*b)),
      Value::String(s) => {
        if s.eq_ignore_ascii_case("true") {
          Ok(BindValue::Bool(true))
        } else if s.eq_ignore_ascii_case("false") {
          Ok(BindValue::Bool(false))
        } else {
          Err(bad_value(spec, value))
        }
      }
      _ => Err(bad_value(spec, value)),
    },

    ParamType::Timestamp => match value {
      Value::String(s) => parse_timestamp(s.trim()).map(BindValue::Timestamp).ok_or_else(|| bad_value(spec, value)),
      _ => Err(bad_value(spec, value)),
    },
  }
}

fn stringify(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn bad_value(spec: &QueryParamSpec, value: &Value) -> GatewayError {
  GatewayError::BadRequest(format!(
    "Invalid {} value for parameter '{}': {}",
    spec.param_type,
    spec.name,
    stringify(value)
  ))
}

/// Try the declared formats in order, then a bare date at midnight.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
  for fmt in TIMESTAMP_FORMATS {
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(ts);
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}
