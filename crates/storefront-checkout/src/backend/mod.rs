//! Backend Integration
//!
//! The storefront backend creates payment sessions, reports their status and
//! serves the modules unlocked by a paid session.

mod http;
mod scripted;

pub use http::HttpBackend;
pub use scripted::{ScriptedBackend, ScriptedStatus};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use storefront_core::{Module, PaymentStatus, SessionId, UserForm};

use crate::error::Result;

/// `POST /checkout/session` body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub package_id: String,
    pub origin_url: String,
    pub user_form: UserForm,
}

/// `POST /checkout/session` reply
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Payment page to redirect to
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,
}

/// `GET /checkout/status/{session_id}` reply
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub payment_status: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

impl StatusResponse {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_report(self.payment_status.as_deref(), self.status.as_deref())
    }
}

/// `GET /modules/{session_id}` reply
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModulesResponse {
    pub modules: Vec<Module>,

    /// Package the modules were generated for
    #[serde(default)]
    pub package: Option<String>,

    /// Form the modules were generated from
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// Backend client trait (Strategy pattern)
///
/// Implemented over HTTP for production and by [`ScriptedBackend`] for
/// tests and offline demos.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Create a payment session
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<CreateSessionResponse>;

    /// Fetch the payment status of a session
    async fn checkout_status(&self, session_id: &SessionId) -> Result<StatusResponse>;

    /// Fetch the modules unlocked by a paid session
    async fn modules(&self, session_id: &SessionId) -> Result<ModulesResponse>;

    /// Backend name
    fn name(&self) -> &str;
}
