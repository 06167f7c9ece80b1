//! Checkout Error Types

use thiserror::Error;

use storefront_core::{FormField, NavigationState, StorefrontError};

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout flow errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Form is incomplete; no request was sent
    #[error("Form incomplete: {}", FormField::join(.0))]
    Validation(Vec<FormField>),

    /// Backend unreachable or answered without a payment URL
    #[error("Session creation failed: {0}")]
    SessionCreationFailed(String),

    /// One status check failed; the poller retries on its own
    #[error("Status check failed: {0}")]
    PollingTransientFailure(String),

    /// The payment session expired
    #[error("Payment session expired")]
    PollingExpired,

    /// Retry budget exhausted without a final status
    #[error("Payment not confirmed after {attempts} attempts")]
    PollingAbandoned { attempts: u32 },

    /// A poll for this session is already outstanding
    #[error("Already polling session {0}")]
    PollInProgress(String),

    /// Modules could not be fetched after payment
    #[error("Module load failed: {0}")]
    ModuleLoadFailed(String),

    /// Action not available on the current screen
    #[error("Cannot {action} from {from}")]
    InvalidTransition {
        from: NavigationState,
        action: &'static str,
    },

    /// Backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Domain error
    #[error(transparent)]
    Domain(#[from] StorefrontError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Check if this error clears up by trying again later
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PollingTransientFailure(_) | Self::Http(_) | Self::Backend { .. }
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(fields) => {
                format!("Please complete the form: {}.", FormField::join(fields))
            }
            Self::SessionCreationFailed(msg) => {
                format!("Could not start the payment: {msg}. Please try again.")
            }
            Self::PollingExpired => "Your payment session expired. Please try again.".into(),
            Self::PollingAbandoned { .. } => {
                "Payment verification timed out. Please contact support.".into()
            }
            Self::ModuleLoadFailed(_) => {
                "Your payment is confirmed but your modules could not be loaded.".into()
            }
            Self::Domain(e) => e.user_message(),
            Self::InvalidTransition { .. } => "That action is not available here.".into(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}
