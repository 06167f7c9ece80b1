//! # storefront-core
//!
//! Domain model for the module-bundle storefront.
//!
//! ## Flow
//!
//! ```text
//! ┌──────┐ select ┌──────┐ submit ┌──────────────┐ return ┌─────────┐ paid ┌─────────┐
//! │ home │───────▶│ form │───────▶│ payment page │───────▶│ success │─────▶│ modules │
//! └──────┘        └──────┘        └──────────────┘        └─────────┘      └─────────┘
//!    ▲                                    │ cancel             │ expired
//!    │  acknowledge   ┌────────┐          │                    │
//!    ├────────────────│ cancel │◀─────────┘                    │
//!    │                └────────┘                               │
//!    └─────────────────────────────────────────────────────────┘
//! ```
//!
//! This crate holds the data only: the catalog, the buyer form and its
//! validation, sessions and their payment status, unlocked modules, and the
//! navigation states with the startup classifier. Everything that talks to
//! the backend lives in `storefront-checkout`.

pub mod catalog;
pub mod error;
pub mod form;
pub mod module;
pub mod navigation;
pub mod session;

pub use catalog::{Package, PackageCatalog};
pub use error::{Result, StorefrontError};
pub use form::{
    Choice, Experience, FormField, FormModel, Submission, TargetIncome, UserForm, WeeklyTime,
};
pub use module::{Module, ModuleViewer, PresentationMode};
pub use navigation::{NavigationState, ReturnLocation, StartupRoute};
pub use session::{CheckoutSession, PaymentStatus, SessionId};
