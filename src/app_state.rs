//! Shared application state handed to every HTTP handler.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config_loader::VaultConfig;
use crate::errors::VaultResult;
use crate::id_alloc::IdAllocator;
use crate::lifecycle::RecordLifecycle;
use crate::navigation::Navigation;
use crate::record_store::{open_store, RecordStore};

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub allocator: IdAllocator,
    pub lifecycle: RecordLifecycle,
    pub navigation: Navigation,
    pub secret_key: Option<String>,
    pub io_timeout: Duration,
}

impl AppState {
    /// Open the configured backend and wire the service layers around it.
    pub fn build(config: &VaultConfig) -> VaultResult<Arc<Self>> {
        let store = open_store(config)?;
        info!(backend = ?config.backend, data_dir = %config.data_dir, "record store ready");

        Ok(Arc::new(AppState {
            allocator: IdAllocator::new(store.clone()),
            lifecycle: RecordLifecycle::new(store.clone()),
            navigation: Navigation::new(store.clone()),
            store,
            secret_key: config.api.secret_key.clone(),
            io_timeout: Duration::from_millis(config.api.io_timeout_ms),
        }))
    }
}
