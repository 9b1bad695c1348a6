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

//! # qgate-db
//!
//! Pooled connection management and dynamic query execution for the qgate
//! SQL gateway.
//!
//! - [`ConnectionManager`] - one deadpool-postgres pool per available
//!   database, a failed set with reasons, startup probes, scoped checkouts
//! - [`QueryExecutor`] - positional binds, per-query timeout, dynamic row
//!   materialisation into ordered JSON records
//! - [`sql`] - placeholder counting/rewriting and the best-effort table and
//!   column extractors shared with the validator

pub mod executor;
pub mod manager;
pub mod rows;
pub mod sql;

pub use executor::{BindValue, QueryExecutor, Record};
pub use manager::{ConnectionManager, PooledConnection};
