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

use qgate_catalog::CatalogStore;
use qgate_core::{GatewayConfig, Result};
use qgate_db::ConnectionManager;
use qgate_engine::{DispatchEngine, MetricsCollector, Validator};
use std::sync::Arc;
use tracing::info;

/// Everything a request handler needs, built once by the orchestrator.
pub struct AppState {
  pub config: GatewayConfig,
  pub store: Arc<dyn CatalogStore>,
  pub manager: Arc<ConnectionManager>,
  pub engine: Arc<DispatchEngine>,
  pub metrics: Arc<MetricsCollector>,
  pub validator: Arc<Validator>,
}

impl AppState {
  /// Synchronous rebind after an admin write: rebuild the catalogue
  /// snapshot from the store, rebuild pools for it, and swap the dispatch
  /// engine's snapshot. In-flight requests keep the snapshot they resolved
  /// against.
  pub async fn reload(&self) -> Result<()> {
    let catalog = Arc::new(self.store.load_all().await?);
    self.manager.rebind(&catalog).await;
    self.engine.rebind(Arc::clone(&catalog));
    info!(
      databases = catalog.databases.len(),
      queries = catalog.queries.len(),
      endpoints = catalog.endpoints.len(),
      "catalogue rebound"
    );
    Ok(())
  }
}
