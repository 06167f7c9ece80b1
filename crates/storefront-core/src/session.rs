//! Checkout Sessions
//!
//! One payment attempt, identified by the opaque token the backend issues.
//! Status is only ever updated from a backend report, never inferred locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::form::UserForm;

/// Opaque payment session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Payment state of a session as last reported by the backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Expired,
    /// Any value the storefront does not recognise
    Unknown(String),
}

impl PaymentStatus {
    /// Classify a backend status report.
    ///
    /// `payment_status == "paid"` wins; otherwise `status == "expired"`;
    /// anything else is still pending (or unknown, for unrecognised values).
    pub fn from_report(payment_status: Option<&str>, status: Option<&str>) -> Self {
        match (payment_status, status) {
            (Some("paid"), _) => Self::Paid,
            (_, Some("expired")) => Self::Expired,
            (None | Some("pending" | "unpaid" | "no_payment_required"), _) => Self::Pending,
            (Some(other), _) => Self::Unknown(other.to_string()),
        }
    }

    /// Paid and expired are final; polling stops on either
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Expired)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Expired => "expired",
            Self::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment attempt
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Backend-assigned identifier
    pub id: SessionId,

    /// Last status reported by the backend
    pub status: PaymentStatus,

    /// Form snapshot the session was created from. Absent when the session
    /// was recovered from a return URL after the page reloaded.
    pub form: Option<UserForm>,

    /// When this process first learned of the session
    pub created_at: DateTime<Utc>,

    /// Last status refresh
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// A freshly created session
    pub fn created(id: SessionId, form: UserForm) -> Self {
        let mut session = Self::resumed(id);
        session.form = Some(form);
        session
    }

    /// A session recovered from the return location
    pub fn resumed(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: PaymentStatus::Pending,
            form: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a status fetched from the backend
    pub fn record_status(&mut self, status: PaymentStatus) {
        if self.status != status {
            tracing::debug!(
                session_id = %self.id,
                from = %self.status,
                to = %status,
                "Payment status changed"
            );
        }
        self.status = status;
        self.updated_at = Utc::now();
    }
}
