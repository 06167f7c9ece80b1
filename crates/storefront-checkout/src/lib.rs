//! # storefront-checkout
//!
//! Checkout orchestration for the module-bundle storefront.
//!
//! ## Hosted payment flow
//!
//! ```text
//! ┌────────────┐ create_session ┌──────────────┐ redirect back ┌────────────┐
//! │    form    │───────────────▶│ payment page │──────────────▶│  success   │
//! └────────────┘                └──────────────┘               └─────┬──────┘
//!                                                                    │ poll every 2s
//!                                                                    │ (10 attempts max)
//!                                  ┌─────────┐   paid   ┌────────────▼───────────┐
//!                                  │ modules │◀─────────│ PaymentStatusPoller    │
//!                                  └─────────┘  + load  └────────────────────────┘
//! ```
//!
//! - [`CheckoutSessionInitiator`] sends the form and returns the payment URL.
//! - [`PaymentStatusPoller`] confirms the payment with a bounded, cancellable
//!   retry loop, one poll per session at a time.
//! - [`ModuleUnlockLoader`] fetches the modules of a paid session.
//! - [`NavigationStateMachine`] owns the screen and the active session and
//!   drives the three components from user actions.
//!
//! All backend access goes through the [`CheckoutBackend`] trait:
//! [`HttpBackend`] in production, [`ScriptedBackend`] in tests and demos.

pub mod backend;
pub mod config;
pub mod error;
pub mod initiator;
pub mod loader;
pub mod navigator;
pub mod poller;

pub use backend::{
    CheckoutBackend, CreateSessionRequest, CreateSessionResponse, HttpBackend, ModulesResponse,
    ScriptedBackend, ScriptedStatus, StatusResponse,
};
pub use config::CheckoutConfig;
pub use error::{CheckoutError, Result};
pub use initiator::{CheckoutRedirect, CheckoutSessionInitiator};
pub use loader::{ModuleUnlockLoader, UnlockedModules};
pub use navigator::{NavigationStateMachine, Notice};
pub use poller::{PaymentStatusPoller, PollOutcome, PollState, PollerConfig};
