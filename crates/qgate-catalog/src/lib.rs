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

//! # qgate-catalog
//!
//! Catalogue model and stores for the qgate SQL gateway.
//!
//! The gateway is parameterised by three catalogues: databases, queries and
//! endpoints. This crate owns their types, the [`CatalogStore`] capability
//! set, and its two providers:
//!
//! - [`YamlCatalogStore`] - three YAML documents on disk, journalled writes
//! - [`RelationalCatalogStore`] - three tables in the gateway's own config
//!   database, Diesel on the blocking pool
//!
//! Consumers read an immutable [`Catalog`] snapshot; admin writes go through
//! a store and are followed by a snapshot rebuild.

pub mod file;
pub mod relational;
pub mod spec;
pub mod store;

pub use file::YamlCatalogStore;
pub use relational::RelationalCatalogStore;
pub use spec::{
  DatabaseSpec, EndpointSpec, PaginationSpec, ParamType, PoolSpec, QueryParamSpec, QuerySpec,
  QueryType,
};
pub use store::{Catalog, CatalogStore, StoreError, StoreResult};
