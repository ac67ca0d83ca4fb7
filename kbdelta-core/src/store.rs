//! Persistence seam for encoded change sets.
//!
//! The core treats the store as an opaque async blob slot. Concrete
//! backends (files, REST databases) live in `kbdelta-adapters`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// No backend was configured. Loads treat this as "nothing saved".
    #[error("Change store is not configured")]
    NotConfigured,

    /// The backend was reached (or tried) and failed.
    #[error("Change store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, StoreError::NotConfigured)
    }
}

/// Abstract interface for change-set persistence.
///
/// Implementations hold a single blob. Retry and timeout policy belong to
/// the implementation.
#[async_trait]
pub trait ChangeStore: Send + Sync {
    /// Overwrite the stored blob.
    async fn save(&self, blob: &Value) -> Result<(), StoreError>;

    /// Fetch the stored blob, `None` if nothing has been saved.
    async fn load(&self) -> Result<Option<Value>, StoreError>;

    /// Drop the stored blob.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Store used when no backend is configured: every call reports `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredStore;

#[async_trait]
impl ChangeStore for UnconfiguredStore {
    async fn save(&self, _blob: &Value) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn load(&self) -> Result<Option<Value>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn describe(&self) -> String {
        "unconfigured".to_string()
    }
}

/// In-process store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Value>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `blob`.
    pub fn with_blob(blob: Value) -> Self {
        let store = Self::default();
        *store.lock_slot() = Some(blob);
        store
    }

    /// Make every subsequent call fail with a backend error (or stop doing so).
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner()) = failing;
    }

    /// Current contents of the slot.
    pub fn snapshot(&self) -> Option<Value> {
        self.lock_slot().clone()
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<Value>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.fail.lock().unwrap_or_else(|e| e.into_inner()) {
            Err(StoreError::backend("memory store set to fail"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChangeStore for MemoryStore {
    async fn save(&self, blob: &Value) -> Result<(), StoreError> {
        self.check()?;
        *self.lock_slot() = Some(blob.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Value>, StoreError> {
        self.check()?;
        Ok(self.lock_slot().clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        *self.lock_slot() = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[async_trait]
impl<S: ChangeStore + ?Sized> ChangeStore for Box<S> {
    async fn save(&self, blob: &Value) -> Result<(), StoreError> {
        (**self).save(blob).await
    }

    async fn load(&self) -> Result<Option<Value>, StoreError> {
        (**self).load().await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
