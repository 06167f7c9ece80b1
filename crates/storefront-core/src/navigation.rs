//! Navigation States and Startup Classification
//!
//! The storefront shows exactly one screen at a time. The first screen is
//! derived once from the location the buyer lands on: a payment-session
//! query parameter means the buyer is back from the payment page, a
//! `cancel` path segment means they abandoned it.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StorefrontError};
use crate::session::SessionId;

/// Query parameter carrying the payment session id on return
pub const SESSION_QUERY_PARAM: &str = "session_id";

/// Path segment marking a cancelled payment
pub const CANCEL_PATH_SEGMENT: &str = "cancel";

/// Current screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationState {
    #[default]
    Home,
    Form,
    Modules,
    Success,
    Cancel,
}

impl NavigationState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Form => "form",
            Self::Modules => "modules",
            Self::Success => "success",
            Self::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for NavigationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the return location says about the payment flow
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReturnLocation {
    pub session_id: Option<SessionId>,
    pub cancelled: bool,
}

impl ReturnLocation {
    /// Read the session marker and cancel marker from a URL
    pub fn parse(location: &str) -> Result<Self> {
        let url = Url::parse(location)
            .map_err(|e| StorefrontError::InvalidLocation(format!("{location}: {e}")))?;

        let session_id = url
            .query_pairs()
            .find(|(key, _)| key == SESSION_QUERY_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(SessionId::new);

        let cancelled = url
            .path_segments()
            .is_some_and(|mut segments| segments.any(|s| s == CANCEL_PATH_SEGMENT));

        Ok(Self {
            session_id,
            cancelled,
        })
    }
}

/// Initial screen plus the session to resume, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupRoute {
    Home,
    /// Back from the payment page; the session must be confirmed
    Success(SessionId),
    Cancel,
}

impl StartupRoute {
    /// Map a return location to the first screen.
    ///
    /// A session id takes precedence over a cancel marker.
    pub fn classify(location: &ReturnLocation) -> Self {
        match (&location.session_id, location.cancelled) {
            (Some(id), _) => Self::Success(id.clone()),
            (None, true) => Self::Cancel,
            (None, false) => Self::Home,
        }
    }

    /// Classify a raw URL; unparseable input starts at home
    pub fn from_url(location: &str) -> Self {
        match ReturnLocation::parse(location) {
            Ok(parsed) => Self::classify(&parsed),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable start location, starting at home");
                Self::Home
            }
        }
    }

    pub const fn state(&self) -> NavigationState {
        match self {
            Self::Home => NavigationState::Home,
            Self::Success(_) => NavigationState::Success,
            Self::Cancel => NavigationState::Cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_origin_is_home() {
        assert_eq!(StartupRoute::from_url("https://shop.example/"), StartupRoute::Home);
        assert_eq!(StartupRoute::from_url("https://shop.example/?ref=ads"), StartupRoute::Home);
    }

    #[test]
    fn test_session_id_is_success() {
        let route = StartupRoute::from_url("https://shop.example/success?session_id=cs_test_42");
        assert_eq!(route, StartupRoute::Success(SessionId::new("cs_test_42")));
        assert_eq!(route.state(), NavigationState::Success);
    }

    #[test]
    fn test_cancel_path_is_cancel() {
        let route = StartupRoute::from_url("https://shop.example/cancel");
        assert_eq!(route, StartupRoute::Cancel);
        assert_eq!(route.state(), NavigationState::Cancel);
    }

    #[test]
    fn test_cancel_must_be_a_whole_segment() {
        assert_eq!(
            StartupRoute::from_url("https://shop.example/cancelled-orders"),
            StartupRoute::Home
        );
        assert_eq!(
            StartupRoute::from_url("https://shop.example/shop/cancel/"),
            StartupRoute::Cancel
        );
    }

    #[test]
    fn test_session_id_takes_precedence_over_cancel() {
        let route = StartupRoute::from_url("https://shop.example/cancel?session_id=cs_1");
        assert_eq!(route, StartupRoute::Success(SessionId::new("cs_1")));
    }

    #[test]
    fn test_empty_session_id_is_ignored() {
        assert_eq!(
            StartupRoute::from_url("https://shop.example/success?session_id="),
            StartupRoute::Home
        );
        assert_eq!(
            StartupRoute::from_url("https://shop.example/cancel?session_id="),
            StartupRoute::Cancel
        );
    }

    #[test]
    fn test_encoded_session_id() {
        let parsed =
            ReturnLocation::parse("https://shop.example/success?session_id=cs%5F9").unwrap();
        assert_eq!(parsed.session_id, Some(SessionId::new("cs_9")));
        assert!(!parsed.cancelled);
    }

    #[test]
    fn test_unparseable_location_is_home() {
        assert!(ReturnLocation::parse("not a url").is_err());
        assert_eq!(StartupRoute::from_url("not a url"), StartupRoute::Home);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(NavigationState::default(), NavigationState::Home);
        assert_eq!(serde_json::to_value(NavigationState::Modules).unwrap(), "modules");
        assert_eq!(NavigationState::Cancel.to_string(), "cancel");
    }
}
