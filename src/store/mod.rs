use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Keys of the persisted layout. Collections hold JSON arrays.
pub mod keys {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const REVIEWS: &str = "reviews";
    pub const CURRENT_USER: &str = "currentUser";
    pub const SCHEMA_VERSION: &str = "schemaVersion";
}

pub const SCHEMA_VERSION: u32 = 1;

/// Path value that selects the in-memory backend.
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed value under `{key}`: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored schema version {found} does not match expected version {expected}")]
    SchemaMismatch { found: u32, expected: u32 },
}

/// String key-value storage holding raw JSON text.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn KvStore>;

/// Open the backend selected by `path`: memory for `None` or `:memory:`, files otherwise.
pub async fn open_store(path: Option<&str>) -> Result<SharedStore, StoreError> {
    match path {
        None | Some(MEMORY_PATH) => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        Some(root) => {
            tracing::info!(root = %root, "using file store");
            Ok(Arc::new(FileStore::open(root).await?))
        }
    }
}

/// Stamp a fresh store with the current schema version, or reject one written by another version.
pub async fn ensure_schema(store: &dyn KvStore) -> Result<(), StoreError> {
    match load_record::<u32>(store, keys::SCHEMA_VERSION).await? {
        None => save_record(store, keys::SCHEMA_VERSION, &SCHEMA_VERSION).await,
        Some(found) if found == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(StoreError::SchemaMismatch {
            found,
            expected: SCHEMA_VERSION,
        }),
    }
}

pub async fn load_record<T>(store: &dyn KvStore, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })
}

pub async fn save_record<T>(store: &dyn KvStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + Sync + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.set(key, raw).await
}

/// Load a collection; a missing key reads as empty.
pub async fn load_list<T>(store: &dyn KvStore, key: &str) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
{
    Ok(load_record(store, key).await?.unwrap_or_default())
}

pub async fn save_list<T>(store: &dyn KvStore, key: &str, items: &[T]) -> Result<(), StoreError>
where
    T: Serialize + Sync,
{
    save_record(store, key, items).await
}
