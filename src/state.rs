use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    models::CartItem,
    store::{MemoryStore, SharedStore},
};

/// Per-user carts. Client-held state, never persisted.
pub type Carts = RwLock<HashMap<Uuid, Vec<CartItem>>>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub carts: Arc<Carts>,
    /// Serializes read-modify-write sequences on stored collections.
    pub write_gate: Arc<Mutex<()>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: SharedStore, config: AppConfig) -> Self {
        Self {
            store,
            carts: Arc::new(RwLock::new(HashMap::new())),
            write_gate: Arc::new(Mutex::new(())),
            config: Arc::new(config),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }
}
