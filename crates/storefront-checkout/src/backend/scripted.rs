//! Scripted Backend
//!
//! In-memory backend that replays a scripted sequence of status replies.
//! For testing and offline demos. Records every call it receives.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use storefront_core::{Module, SessionId};

use super::{
    CheckoutBackend, CreateSessionRequest, CreateSessionResponse, ModulesResponse, StatusResponse,
};
use crate::error::{CheckoutError, Result};

/// Base of the fake payment page URLs
const PAYMENT_PAGE: &str = "https://pay.example";

/// One scripted reply to a status query
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedStatus {
    Pending,
    Paid,
    Expired,
    /// Unrecognised `payment_status` value
    Other(String),
    /// Transport failure
    Fail(String),
}

impl ScriptedStatus {
    fn reply(&self) -> Result<StatusResponse> {
        let (payment_status, status) = match self {
            Self::Pending => ("unpaid", "open"),
            Self::Paid => ("paid", "complete"),
            Self::Expired => ("unpaid", "expired"),
            Self::Other(raw) => (raw.as_str(), "open"),
            Self::Fail(msg) => {
                return Err(CheckoutError::Backend {
                    status: 503,
                    message: msg.clone(),
                });
            }
        };
        Ok(StatusResponse {
            payment_status: Some(payment_status.to_string()),
            status: Some(status.to_string()),
        })
    }
}

struct ScriptState {
    statuses: VecDeque<ScriptedStatus>,
    session_id: Option<String>,
    create_failure: Option<String>,
    omit_url: bool,
    modules: Vec<Module>,
    modules_failure: Option<String>,
    session_requests: Vec<CreateSessionRequest>,
    status_queries: Vec<SessionId>,
    module_queries: Vec<SessionId>,
    in_flight: u32,
    max_in_flight: u32,
}

/// Backend double with a scripted status sequence
pub struct ScriptedBackend {
    state: Mutex<ScriptState>,
    latency: Duration,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Every status query answers `pending`; modules are the sample set
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                statuses: VecDeque::from([ScriptedStatus::Pending]),
                session_id: None,
                create_failure: None,
                omit_url: false,
                modules: Self::sample_modules(),
                modules_failure: None,
                session_requests: Vec::new(),
                status_queries: Vec::new(),
                module_queries: Vec::new(),
                in_flight: 0,
                max_in_flight: 0,
            }),
            latency: Duration::ZERO,
        }
    }

    /// Status replies in order; the last one repeats forever
    #[must_use]
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = ScriptedStatus>) -> Self {
        let statuses: VecDeque<_> = statuses.into_iter().collect();
        if !statuses.is_empty() {
            self.state().statuses = statuses;
        }
        self
    }

    /// Fixed id for created sessions (otherwise a random `cs_test_` id)
    #[must_use]
    pub fn with_session_id(self, id: impl Into<String>) -> Self {
        self.state().session_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_modules(self, modules: Vec<Module>) -> Self {
        self.state().modules = modules;
        self
    }

    /// Session creation answers with an error payload
    #[must_use]
    pub fn failing_session_creation(self, message: impl Into<String>) -> Self {
        self.state().create_failure = Some(message.into());
        self
    }

    /// Session creation succeeds but carries no payment URL
    #[must_use]
    pub fn without_payment_url(self) -> Self {
        self.state().omit_url = true;
        self
    }

    /// Module fetch answers with an error payload
    #[must_use]
    pub fn failing_modules(self, message: impl Into<String>) -> Self {
        self.state().modules_failure = Some(message.into());
        self
    }

    /// Simulated round-trip time for status queries
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn session_requests(&self) -> Vec<CreateSessionRequest> {
        self.state().session_requests.clone()
    }

    pub fn status_queries(&self) -> Vec<SessionId> {
        self.state().status_queries.clone()
    }

    pub fn module_queries(&self) -> Vec<SessionId> {
        self.state().module_queries.clone()
    }

    /// Highest number of status queries that were outstanding at once
    pub fn max_concurrent_status_queries(&self) -> u32 {
        self.state().max_in_flight
    }

    /// Small module set used when none is scripted
    pub fn sample_modules() -> Vec<Module> {
        vec![
            Module::new(
                "business_idea",
                "💡 Idée de Business",
                "Concept principal: une offre construite sur tes compétences.\n\
                     Première étape: liste 3 problèmes de ton audience.",
            ),
            Module::new(
                "brand_name",
                "🏷️ Nom de Marque",
                "Choisis un nom simple, mémorable et qui reflète ton expertise.",
            ),
            Module::new(
                "action_plan",
                "📋 Plan d'Action Simple",
                "Semaine 1: création de contenu\nSemaine 2: engagement\n\
                     Semaine 3: première offre\nSemaine 4: optimisation",
            ),
        ]
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts a status query as outstanding until it completes or is dropped
struct OutstandingQuery<'a> {
    backend: &'a ScriptedBackend,
}

impl<'a> OutstandingQuery<'a> {
    fn begin(backend: &'a ScriptedBackend, session_id: &SessionId) -> Self {
        let mut state = backend.state();
        state.status_queries.push(session_id.clone());
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
        Self { backend }
    }
}

impl Drop for OutstandingQuery<'_> {
    fn drop(&mut self) {
        let mut state = self.backend.state();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

#[async_trait]
impl CheckoutBackend for ScriptedBackend {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse> {
        let mut state = self.state();
        state.session_requests.push(request.clone());

        if let Some(message) = &state.create_failure {
            return Err(CheckoutError::Backend {
                status: 500,
                message: message.clone(),
            });
        }
        if state.omit_url {
            return Ok(CreateSessionResponse::default());
        }

        let session_id = state
            .session_id
            .clone()
            .unwrap_or_else(|| format!("cs_test_{}", uuid::Uuid::new_v4().simple()));

        Ok(CreateSessionResponse {
            url: Some(format!("{PAYMENT_PAGE}/{session_id}")),
            session_id: Some(session_id),
        })
    }

    async fn checkout_status(&self, session_id: &SessionId) -> Result<StatusResponse> {
        let _query = OutstandingQuery::begin(self, session_id);

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        let mut state = self.state();
        let scripted = if state.statuses.len() > 1 {
            state.statuses.pop_front()
        } else {
            state.statuses.front().cloned()
        };
        drop(state);

        scripted.unwrap_or(ScriptedStatus::Pending).reply()
    }

    async fn modules(&self, session_id: &SessionId) -> Result<ModulesResponse> {
        let mut state = self.state();
        state.module_queries.push(session_id.clone());

        if let Some(message) = &state.modules_failure {
            return Err(CheckoutError::Backend {
                status: 500,
                message: message.clone(),
            });
        }

        Ok(ModulesResponse {
            modules: state.modules.clone(),
            package: None,
            user: None,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
