//! Payment Status Poller
//!
//! Confirms a payment after the buyer returns from the payment page. The
//! poller asks the backend for the session status on a fixed interval until
//! the session is paid or expired, or until the attempt budget runs out.
//!
//! Polling is sequential: the next query is only scheduled once the previous
//! one has completed. Only one poll per session may run at a time, and a
//! session that reached a final status is never queried again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use storefront_core::{PaymentStatus, SessionId};

use crate::backend::{CheckoutBackend, StatusResponse};
use crate::error::{CheckoutError, Result};

/// Polling budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    /// Status queries before giving up
    pub max_attempts: u32,
    /// Delay between two queries
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

/// How a poll ended. `attempts` counts the status queries that completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    Paid { attempts: u32 },
    Expired { attempts: u32 },
    /// Budget exhausted without a final status
    Abandoned { attempts: u32 },
    /// Stopped by the cancellation token
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    /// Paid and expired sessions are never polled again
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid { .. } | Self::Expired { .. })
    }

    pub const fn attempts(self) -> u32 {
        match self {
            Self::Paid { attempts }
            | Self::Expired { attempts }
            | Self::Abandoned { attempts }
            | Self::Cancelled { attempts } => attempts,
        }
    }

    /// The error a caller surfaces for an unpaid outcome
    pub fn error(self) -> Option<CheckoutError> {
        match self {
            Self::Expired { .. } => Some(CheckoutError::PollingExpired),
            Self::Abandoned { attempts } => Some(CheckoutError::PollingAbandoned { attempts }),
            Self::Paid { .. } | Self::Cancelled { .. } => None,
        }
    }
}

/// Observable poller progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollState {
    #[default]
    Idle,
    Polling { attempt: u32 },
    Finished(PollOutcome),
}

enum Track {
    InFlight,
    Resolved(PollOutcome),
}

pub struct PaymentStatusPoller {
    backend: Arc<dyn CheckoutBackend>,
    config: PollerConfig,
    /// Polls in flight and final outcomes. Resolved entries are kept for the
    /// lifetime of the poller so a reloaded return URL never queries again.
    sessions: Mutex<HashMap<SessionId, Track>>,
    state: watch::Sender<PollState>,
}

impl PaymentStatusPoller {
    pub fn new(backend: Arc<dyn CheckoutBackend>, config: PollerConfig) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            backend,
            config,
            sessions: Mutex::new(HashMap::new()),
            state,
        }
    }

    pub const fn config(&self) -> PollerConfig {
        self.config
    }

    /// Watch attempt progress
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Poll `session_id` until it resolves, the budget runs out or `cancel`
    /// fires.
    ///
    /// A session that already resolved returns its earlier outcome without a
    /// backend query. A session with a poll still running is rejected with
    /// [`CheckoutError::PollInProgress`].
    pub async fn poll(
        &self,
        session_id: &SessionId,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        {
            let mut sessions = self.sessions();
            match sessions.get(session_id) {
                Some(Track::Resolved(outcome)) => {
                    tracing::debug!(%session_id, ?outcome, "Session already resolved");
                    return Ok(*outcome);
                }
                Some(Track::InFlight) => {
                    return Err(CheckoutError::PollInProgress(session_id.to_string()));
                }
                None => {
                    sessions.insert(session_id.clone(), Track::InFlight);
                }
            }
        }

        let _in_flight = InFlight {
            sessions: &self.sessions,
            session_id,
        };

        let outcome = self.run(session_id, cancel).await;

        if outcome.is_terminal() {
            self.sessions()
                .insert(session_id.clone(), Track::Resolved(outcome));
        }
        self.state.send_replace(PollState::Finished(outcome));

        Ok(outcome)
    }

    async fn run(&self, session_id: &SessionId, cancel: &CancellationToken) -> PollOutcome {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            self.state.send_replace(PollState::Polling { attempt });

            let reply = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(
                        %session_id,
                        attempts = attempt - 1,
                        "Payment polling cancelled"
                    );
                    return PollOutcome::Cancelled { attempts: attempt - 1 };
                }
                reply = self.backend.checkout_status(session_id) => reply,
            };

            match reply.as_ref().map(StatusResponse::payment_status) {
                Ok(PaymentStatus::Paid) => {
                    tracing::info!(%session_id, attempt, "Payment confirmed");
                    return PollOutcome::Paid { attempts: attempt };
                }
                Ok(PaymentStatus::Expired) => {
                    tracing::info!(%session_id, attempt, "Payment session expired");
                    return PollOutcome::Expired { attempts: attempt };
                }
                Ok(status) => {
                    tracing::debug!(%session_id, attempt, %status, "Payment not confirmed yet");
                }
                Err(e) => {
                    let e = CheckoutError::PollingTransientFailure(e.to_string());
                    tracing::warn!(%session_id, attempt, error = %e, "Status check failed");
                }
            }

            if attempt == max_attempts {
                break;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(%session_id, attempts = attempt, "Payment polling cancelled");
                    return PollOutcome::Cancelled { attempts: attempt };
                }
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }

        tracing::warn!(%session_id, attempts = max_attempts, "Payment verification abandoned");
        PollOutcome::Abandoned {
            attempts: max_attempts,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Track>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight mark when a poll ends, including when its future is dropped
struct InFlight<'a> {
    sessions: &'a Mutex<HashMap<SessionId, Track>>,
    session_id: &'a SessionId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(sessions.get(self.session_id), Some(Track::InFlight)) {
            sessions.remove(self.session_id);
        }
    }
}
