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

//! Dynamic row materialisation
//!
//! Result sets have shapes the gateway cannot know at compile time, so each
//! row becomes an ordered `column -> value` JSON object. Column order is the
//! driver's; SQL NULL maps to an explicit JSON null.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use qgate_core::{GatewayError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use tokio_postgres::types::Type;
use tokio_postgres::Row;
use tracing::warn;

/// Materialise one row as an ordered record.
pub fn row_to_record(row: &Row) -> Result<Map<String, Value>> {
  let mut record = Map::new();
  for (idx, column) in row.columns().iter().enumerate() {
    let value = column_value(row, idx, column.type_())?;
    record.insert(column.name().to_string(), value);
  }
  Ok(record)
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> Result<Value> {
  let value = match *ty {
    Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool)),
    Type::INT2 => {
      row.try_get::<_, Option<i16>>(idx).map(|v| v.map(|n| Value::Number(Number::from(n))))
    }
    Type::INT4 => {
      row.try_get::<_, Option<i32>>(idx).map(|v| v.map(|n| Value::Number(Number::from(n))))
    }
    Type::INT8 => {
      row.try_get::<_, Option<i64>>(idx).map(|v| v.map(|n| Value::Number(Number::from(n))))
    }
    Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx).map(|v| v.map(|n| float_value(n as f64))),
    Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map(|v| v.map(float_value)),
    Type::NUMERIC => row.try_get::<_, Option<Decimal>>(idx).map(|v| v.map(decimal_value)),
    Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
      row.try_get::<_, Option<String>>(idx).map(|v| v.map(Value::String))
    }
    Type::DATE => row
      .try_get::<_, Option<NaiveDate>>(idx)
      .map(|v| v.map(|d| Value::String(d.format("%Y-%m-%d").to_string()))),
    Type::TIMESTAMP => row
      .try_get::<_, Option<NaiveDateTime>>(idx)
      .map(|v| v.map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))),
    Type::TIMESTAMPTZ => row
      .try_get::<_, Option<DateTime<Utc>>>(idx)
      .map(|v| v.map(|t| Value::String(t.to_rfc3339()))),
    Type::UUID => row
      .try_get::<_, Option<uuid::Uuid>>(idx)
      .map(|v| v.map(|u| Value::String(u.to_string()))),
    Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx),
    _ => {
      // unrecognised type: take the text representation when the driver
      // offers one, otherwise surface null
      return Ok(match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(s)) => Value::String(s),
        Ok(None) => Value::Null,
        Err(_) => {
          warn!("cannot decode column {} of type {}, emitting null", idx, ty.name());
          Value::Null
        }
      });
    }
  };

  value
    .map(|opt| opt.unwrap_or(Value::Null))
    .map_err(|e| GatewayError::Internal(format!("failed to decode column {}: {}", idx, e)))
}

fn float_value(n: f64) -> Value {
  Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// NUMERIC becomes a JSON number when the value survives an f64 round trip,
/// otherwise the exact decimal string.
fn decimal_value(d: Decimal) -> Value {
  if let Some(f) = d.to_f64() {
    if Decimal::try_from(f).map(|back| back == d).unwrap_or(false) {
      if let Some(n) = Number::from_f64(f) {
        return Value::Number(n);
      }
    }
  }
  Value::String(d.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn test_float_value_nan_is_null() {
    assert_eq!(float_value(f64::NAN), Value::Null);
    assert_eq!(float_value(2.5), Value::Number(Number::from_f64(2.5).unwrap()));
  }

  #[test]
  fn test_decimal_value_exact() {
    let d = Decimal::from_str("42.5").unwrap();
    assert_eq!(decimal_value(d), Value::Number(Number::from_f64(42.5).unwrap()));
  }

  #[test]
  fn test_decimal_value_precise_falls_back_to_string() {
    let d = Decimal::from_str("0.123456789012345678901234567").unwrap();
    match decimal_value(d) {
      Value::String(s) => assert_eq!(s, "0.123456789012345678901234567"),
      other => panic!("expected string, got {:?}", other),
    }
  }
}
