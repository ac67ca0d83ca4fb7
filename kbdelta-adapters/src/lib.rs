//! # kbdelta-adapters
//!
//! Concrete change stores and document sources for kbdelta.
//!
//! - [`FileStore`] keeps the blob in a local JSON file
//! - [`RestStore`] (feature `rest`, default) talks to a realtime-database
//!   style REST node
//! - [`fetch_document`] loads the baseline from a file or an HTTP URL
//!
//! ## Usage
//!
//! ```ignore
//! use kbdelta_adapters::{fetch_document, store_from_config, DocumentSource};
//! use kbdelta_core::{Config, Session};
//!
//! let config = Config::from_file("kbdelta.yml")?;
//! let document = fetch_document(&DocumentSource::from_config(&config), timeout).await?;
//! let store = store_from_config(&config)?;
//! let (session, outcome) = Session::open(document, store, config.store.key_encoding).await;
//! ```

use async_trait::async_trait;
use kbdelta_core::{ChangeStore, Config, MemoryStore, StoreError, StoreKind, UnconfiguredStore};
use serde_json::Value;

mod file_store;
#[cfg(feature = "rest")]
mod rest_store;
mod source;

pub use file_store::FileStore;
#[cfg(feature = "rest")]
pub use rest_store::RestStore;
pub use source::{fetch_document, DocumentError, DocumentSource};

/// Any store the configuration can select.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Unconfigured(UnconfiguredStore),
    Memory(MemoryStore),
    File(FileStore),
    #[cfg(feature = "rest")]
    Rest(RestStore),
}

/// Build the store named by `config.store`.
pub fn store_from_config(config: &Config) -> Result<AnyStore, StoreError> {
    let store = &config.store;
    match store.kind {
        StoreKind::None => Ok(AnyStore::Unconfigured(UnconfiguredStore)),
        StoreKind::Memory => Ok(AnyStore::Memory(MemoryStore::new())),
        StoreKind::File => {
            let path = config
                .store_path()
                .ok_or_else(|| StoreError::Backend("file store requires `path`".into()))?;
            Ok(AnyStore::File(FileStore::new(path)))
        }
        #[cfg(feature = "rest")]
        StoreKind::Rest => {
            let url = store
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Backend("rest store requires `url`".into()))?;
            Ok(AnyStore::Rest(RestStore::new(
                url,
                &store.node,
                store.auth.clone(),
                std::time::Duration::from_secs(store.timeout_secs),
            )?))
        }
        #[cfg(not(feature = "rest"))]
        StoreKind::Rest => Err(StoreError::Backend(
            "rest store support was not compiled in".into(),
        )),
    }
}

impl AnyStore {
    fn inner(&self) -> &dyn ChangeStore {
        match self {
            AnyStore::Unconfigured(s) => s,
            AnyStore::Memory(s) => s,
            AnyStore::File(s) => s,
            #[cfg(feature = "rest")]
            AnyStore::Rest(s) => s,
        }
    }
}

#[async_trait]
impl ChangeStore for AnyStore {
    async fn save(&self, blob: &Value) -> Result<(), StoreError> {
        self.inner().save(blob).await
    }

    async fn load(&self) -> Result<Option<Value>, StoreError> {
        self.inner().load().await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner().clear().await
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }
}
