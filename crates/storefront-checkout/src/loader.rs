//! Module Unlock Loader
//!
//! Fetches the modules a paid session unlocked. A failure is reported once and
//! never retried here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use storefront_core::{Module, PresentationMode, SessionId};

use crate::backend::CheckoutBackend;
use crate::error::{CheckoutError, Result};

/// Modules delivered for a paid session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnlockedModules {
    pub modules: Vec<Module>,
    pub mode: PresentationMode,
    /// Package the backend generated the modules for
    pub package: Option<String>,
}

pub struct ModuleUnlockLoader {
    backend: Arc<dyn CheckoutBackend>,
}

impl ModuleUnlockLoader {
    pub fn new(backend: Arc<dyn CheckoutBackend>) -> Self {
        Self { backend }
    }

    pub async fn load_modules(&self, session_id: &SessionId) -> Result<UnlockedModules> {
        let reply = self.backend.modules(session_id).await.map_err(|e| {
            tracing::error!(%session_id, error = %e, "Failed to load unlocked modules");
            CheckoutError::ModuleLoadFailed(match e {
                CheckoutError::Backend { message, .. } => message,
                other => other.to_string(),
            })
        })?;

        let mode = PresentationMode::detect(&reply.modules);
        tracing::info!(%session_id, count = reply.modules.len(), ?mode, "Modules unlocked");

        Ok(UnlockedModules {
            modules: reply.modules,
            mode,
            package: reply.package,
        })
    }
}
