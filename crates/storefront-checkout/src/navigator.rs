//! Navigation State Machine
//!
//! Owns the active screen, the buyer form and the active checkout session,
//! and drives the initiator, poller and loader from user actions.
//!
//! | From      | Action                        | To                         |
//! |-----------|-------------------------------|----------------------------|
//! | `home`    | select a package              | `form`                     |
//! | `form`    | submit (ok)                   | `form` (caller redirects)  |
//! | `form`    | submit (rejected)             | `form` + notice            |
//! | start     | return URL with a session id  | `success`                  |
//! | start     | return URL with `/cancel`     | `cancel`                   |
//! | `success` | confirm, paid                 | `modules`                  |
//! | `success` | confirm, expired              | `home` + notice            |
//! | `success` | confirm, budget exhausted     | `success` + notice         |
//! | `cancel`  | acknowledge                   | `home`                     |
//! | `modules` | full trial (demo sets only)   | `form`                     |
//! | any       | return home                   | `home`                     |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use storefront_core::{
    CheckoutSession, FormField, FormModel, Module, ModuleViewer, NavigationState, Package,
    PackageCatalog, PaymentStatus, PresentationMode, StartupRoute,
};

use crate::backend::CheckoutBackend;
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::initiator::{CheckoutRedirect, CheckoutSessionInitiator};
use crate::loader::{ModuleUnlockLoader, UnlockedModules};
use crate::poller::{PaymentStatusPoller, PollOutcome, PollState};

/// User-visible message queued by the state machine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    FormIncomplete { fields: Vec<FormField> },
    SessionCreationFailed { reason: String },
    PaymentExpired,
    VerificationTimedOut { attempts: u32 },
    ModulesUnavailable { reason: String },
}

impl Notice {
    /// Notice for a checkout error, when the buyer should hear about it
    pub fn from_error(error: &CheckoutError) -> Option<Self> {
        match error {
            CheckoutError::Validation(fields) => Some(Self::FormIncomplete {
                fields: fields.clone(),
            }),
            CheckoutError::SessionCreationFailed(reason) => Some(Self::SessionCreationFailed {
                reason: reason.clone(),
            }),
            CheckoutError::PollingExpired => Some(Self::PaymentExpired),
            CheckoutError::PollingAbandoned { attempts } => Some(Self::VerificationTimedOut {
                attempts: *attempts,
            }),
            CheckoutError::ModuleLoadFailed(reason) => Some(Self::ModulesUnavailable {
                reason: reason.clone(),
            }),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        let error = match self {
            Self::FormIncomplete { fields } => CheckoutError::Validation(fields.clone()),
            Self::SessionCreationFailed { reason } => {
                CheckoutError::SessionCreationFailed(reason.clone())
            }
            Self::PaymentExpired => CheckoutError::PollingExpired,
            Self::VerificationTimedOut { attempts } => CheckoutError::PollingAbandoned {
                attempts: *attempts,
            },
            Self::ModulesUnavailable { reason } => CheckoutError::ModuleLoadFailed(reason.clone()),
        };
        error.user_message()
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

pub struct NavigationStateMachine {
    state: NavigationState,
    catalog: PackageCatalog,
    form: FormModel,
    session: Option<CheckoutSession>,
    unlocked: Option<UnlockedModules>,
    viewer: ModuleViewer,
    notices: Vec<Notice>,
    origin_url: String,
    initiator: CheckoutSessionInitiator,
    poller: PaymentStatusPoller,
    loader: ModuleUnlockLoader,
    shutdown: CancellationToken,
}

impl NavigationStateMachine {
    /// Create a machine at `home` over the standard catalog
    pub fn new(backend: Arc<dyn CheckoutBackend>, config: &CheckoutConfig) -> Self {
        Self::with_catalog(backend, config, PackageCatalog::standard())
    }

    pub fn with_catalog(
        backend: Arc<dyn CheckoutBackend>,
        config: &CheckoutConfig,
        catalog: PackageCatalog,
    ) -> Self {
        Self {
            state: NavigationState::Home,
            catalog,
            form: FormModel::new(),
            session: None,
            unlocked: None,
            viewer: ModuleViewer::new(),
            notices: Vec::new(),
            origin_url: config.origin_url.clone(),
            initiator: CheckoutSessionInitiator::new(backend.clone()),
            poller: PaymentStatusPoller::new(backend.clone(), config.poll),
            loader: ModuleUnlockLoader::new(backend),
            shutdown: CancellationToken::new(),
        }
    }

    /// Derive the first screen from the location the buyer landed on.
    ///
    /// Any earlier flow is discarded; only a session matching the returned id
    /// survives.
    pub fn start(&mut self, location: &str) -> NavigationState {
        let route = StartupRoute::from_url(location);

        let session = match &route {
            StartupRoute::Success(id) => Some(
                self.session
                    .take()
                    .filter(|s| &s.id == id)
                    .unwrap_or_else(|| CheckoutSession::resumed(id.clone())),
            ),
            StartupRoute::Home | StartupRoute::Cancel => None,
        };

        self.reset_flow();
        self.session = session;
        self.state = route.state();

        tracing::info!(state = %self.state, "Storefront started");
        self.state
    }

    pub const fn state(&self) -> NavigationState {
        self.state
    }

    pub const fn catalog(&self) -> &PackageCatalog {
        &self.catalog
    }

    pub const fn form(&self) -> &FormModel {
        &self.form
    }

    pub const fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    pub const fn unlocked(&self) -> Option<&UnlockedModules> {
        self.unlocked.as_ref()
    }

    pub fn modules(&self) -> &[Module] {
        self.unlocked.as_ref().map_or(&[], |u| u.modules.as_slice())
    }

    pub fn mode(&self) -> PresentationMode {
        self.unlocked.as_ref().map(|u| u.mode).unwrap_or_default()
    }

    pub const fn viewer(&self) -> &ModuleViewer {
        &self.viewer
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices for display
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Watch payment confirmation progress
    pub fn poll_progress(&self) -> watch::Receiver<PollState> {
        self.poller.subscribe()
    }

    /// Token that stops any pending confirmation when cancelled
    pub fn cancellation_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop pending work; the view is going away
    pub fn teardown(&self) {
        self.shutdown.cancel();
    }

    /// Choose a package and open the form
    pub fn select_package(&mut self, package_id: &str) -> Result<&Package> {
        self.require(&[NavigationState::Home, NavigationState::Form], "select a package")?;

        let package = self.form.select_package(&self.catalog, package_id)?;
        if self.state != NavigationState::Form {
            tracing::info!(package_id, "Package selected");
        }
        self.state = NavigationState::Form;
        Ok(package)
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> Result<()> {
        self.require(&[NavigationState::Form], "edit the form")?;
        Ok(self.form.set_field(field, value)?)
    }

    /// Set a field addressed by its English or wire name
    pub fn set_named(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.require(&[NavigationState::Form], "edit the form")?;
        Ok(self.form.set_named(name, value)?)
    }

    /// Submit the form and create a payment session.
    ///
    /// The machine stays on `form`; the caller sends the buyer to the returned
    /// URL. A rejected submission queues a notice and keeps the answers.
    pub async fn submit(&mut self) -> Result<CheckoutRedirect> {
        self.require(&[NavigationState::Form], "submit the form")?;

        match self.initiator.create_session(&self.form, &self.origin_url).await {
            Ok((redirect, session)) => {
                if session.is_some() {
                    self.session = session;
                }
                Ok(redirect)
            }
            Err(e) => {
                self.notify(&e);
                Err(e)
            }
        }
    }

    /// Confirm the payment of the session the buyer returned with, then load
    /// its modules.
    ///
    /// Expiry routes home. An exhausted budget and a failed module fetch stay
    /// on `success` with a notice. Cancellation leaves everything as is.
    pub async fn confirm_payment(&mut self) -> Result<PollOutcome> {
        self.require(&[NavigationState::Success], "confirm the payment")?;

        let Some(session_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            return Err(CheckoutError::InvalidTransition {
                from: self.state,
                action: "confirm a payment without a session",
            });
        };

        let token = self.shutdown.child_token();
        let outcome = self.poller.poll(&session_id, &token).await?;

        match outcome {
            PollOutcome::Paid { .. } => {
                self.record_status(PaymentStatus::Paid);
                match self.loader.load_modules(&session_id).await {
                    Ok(unlocked) => {
                        self.unlocked = Some(unlocked);
                        self.transition(NavigationState::Modules);
                    }
                    Err(e) => self.notify(&e),
                }
            }
            PollOutcome::Expired { .. } => {
                self.record_status(PaymentStatus::Expired);
                self.queue_outcome(outcome);
                self.go_home();
            }
            PollOutcome::Abandoned { .. } => self.queue_outcome(outcome),
            PollOutcome::Cancelled { .. } => {}
        }

        Ok(outcome)
    }

    pub fn acknowledge_cancel(&mut self) -> Result<()> {
        self.require(&[NavigationState::Cancel], "acknowledge a cancellation")?;
        self.go_home();
        Ok(())
    }

    /// Open the form with the top tier preselected, from a demo module set
    pub fn begin_full_trial(&mut self) -> Result<&Package> {
        self.require(&[NavigationState::Modules], "start a full trial")?;
        if !self.mode().is_demo() {
            return Err(CheckoutError::InvalidTransition {
                from: self.state,
                action: "start a full trial outside a demo",
            });
        }

        let top = self
            .catalog
            .top_tier()
            .map(|p| p.id.clone())
            .ok_or_else(|| CheckoutError::Config("catalog is empty".into()))?;

        self.viewer.close();
        self.unlocked = None;
        self.transition(NavigationState::Form);
        Ok(self.form.select_package(&self.catalog, &top)?)
    }

    /// Show one unlocked module in the viewer
    pub fn open_module(&mut self, module_id: &str) -> Result<&Module> {
        self.require(&[NavigationState::Modules], "open a module")?;

        let module = self
            .modules()
            .iter()
            .find(|m| m.id == module_id)
            .cloned()
            .ok_or_else(|| CheckoutError::ModuleLoadFailed(format!("no module {module_id}")))?;

        Ok(self.viewer.open(module))
    }

    pub fn close_module(&mut self) {
        self.viewer.close();
    }

    /// Go back to the package list and forget the current flow
    pub fn return_home(&mut self) {
        self.go_home();
    }

    fn go_home(&mut self) {
        self.reset_flow();
        self.transition(NavigationState::Home);
    }

    fn reset_flow(&mut self) {
        self.form.reset();
        self.session = None;
        self.unlocked = None;
        self.viewer.close();
    }

    fn transition(&mut self, to: NavigationState) {
        if self.state != to {
            tracing::info!(from = %self.state, %to, "Navigation");
            self.state = to;
        }
    }

    fn require(&self, allowed: &[NavigationState], action: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    fn record_status(&mut self, status: PaymentStatus) {
        if let Some(session) = self.session.as_mut() {
            session.record_status(status);
        }
    }

    fn queue_outcome(&mut self, outcome: PollOutcome) {
        if let Some(error) = outcome.error() {
            self.notify(&error);
        }
    }

    fn notify(&mut self, error: &CheckoutError) {
        if let Some(notice) = Notice::from_error(error) {
            tracing::info!(notice = %notice, "Notice queued");
            self.notices.push(notice);
        }
    }
}

impl Drop for NavigationStateMachine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
