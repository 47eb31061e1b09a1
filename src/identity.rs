//! Stable per-installation device identifier.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::platform::KeyValueStore;

/// Key the identifier is persisted under.
pub const DEVICE_ID_KEY: &str = "deviceId";

/// Resolves the device identifier once and then serves it from memory.
pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
    cached: RwLock<Option<String>>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// The device identifier, generating and persisting one on first use.
    ///
    /// Store errors are returned as-is; nothing is cached until a read or
    /// write succeeds.
    pub fn unique_device_id(&self) -> Result<String> {
        if let Some(id) = self.cached.read().as_ref() {
            return Ok(id.clone());
        }

        let mut cached = self.cached.write();
        // Another thread may have resolved it while we waited for the lock
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let id = match self.store.get(DEVICE_ID_KEY)?.filter(|id| !id.is_empty()) {
            Some(existing) => {
                tracing::debug!("[identity] Loaded persisted device id");
                existing
            }
            None => {
                let generated = Uuid::new_v4().to_string();
                self.store.set(DEVICE_ID_KEY, &generated)?;
                // Re-read so concurrent writers in other processes converge
                // on whatever value actually landed.
                let persisted = self
                    .store
                    .get(DEVICE_ID_KEY)?
                    .filter(|id| !id.is_empty())
                    .unwrap_or(generated);
                tracing::info!("[identity] Generated new device id {}", persisted);
                persisted
            }
        };

        *cached = Some(id.clone());
        Ok(id)
    }

    /// Forget the identifier, both persisted and cached. The next access
    /// generates a new one.
    pub fn reset(&self) -> Result<()> {
        let mut cached = self.cached.write();
        self.store.remove(DEVICE_ID_KEY)?;
        *cached = None;
        tracing::info!("[identity] Device id reset");
        Ok(())
    }
}
