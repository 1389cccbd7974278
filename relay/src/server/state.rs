use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::server::registry::Registry;

/// Shared application state exposed to handlers.
///
/// The registry is the only shared mutable resource in the relay core;
/// every membership mutation and every recipient snapshot goes through
/// its lock (see `router`).
#[derive(Clone)]
pub struct AppState {
    pub(crate) registry: Arc<RwLock<Registry>>,
    pub config: Arc<RwLock<Config>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            config: Arc::new(RwLock::new(config)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
