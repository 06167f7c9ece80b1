//! Checkout Session Initiator
//!
//! Sends the validated form and chosen package to the backend and returns
//! the payment page to redirect to. No retries here: a failed attempt needs
//! the buyer to submit again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use storefront_core::{CheckoutSession, FormModel, SessionId, StorefrontError};

use crate::backend::{CheckoutBackend, CreateSessionRequest};
use crate::error::{CheckoutError, Result};

/// Where to send the buyer to pay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    /// External payment page
    pub url: String,

    /// Session id, when the backend reported one
    pub session_id: Option<SessionId>,
}

pub struct CheckoutSessionInitiator {
    backend: Arc<dyn CheckoutBackend>,
}

impl CheckoutSessionInitiator {
    pub fn new(backend: Arc<dyn CheckoutBackend>) -> Self {
        Self { backend }
    }

    /// Create a payment session for a submittable form.
    ///
    /// An incomplete form is rejected before any request is made.
    pub async fn create_session(
        &self,
        form: &FormModel,
        origin_url: &str,
    ) -> Result<(CheckoutRedirect, Option<CheckoutSession>)> {
        let submission = form.submission().map_err(|e| match e {
            StorefrontError::Validation(fields) => CheckoutError::Validation(fields),
            other => CheckoutError::Domain(other),
        })?;

        let request = CreateSessionRequest {
            package_id: submission.package_id,
            origin_url: origin_url.trim_end_matches('/').to_string(),
            user_form: submission.user_form,
        };

        let reply = self
            .backend
            .create_session(&request)
            .await
            .map_err(|e| {
                tracing::error!(
                    backend = self.backend.name(),
                    error = %e,
                    "Checkout session creation failed"
                );
                CheckoutError::SessionCreationFailed(match e {
                    CheckoutError::Backend { message, .. } => message,
                    other => other.to_string(),
                })
            })?;

        let url = reply
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CheckoutError::SessionCreationFailed("no payment URL returned".into()))?;

        let session_id = reply.session_id.map(SessionId::new);
        let session = session_id
            .clone()
            .map(|id| CheckoutSession::created(id, request.user_form));

        tracing::info!(
            package_id = %request.package_id,
            session_id = ?session_id,
            "Checkout session created"
        );

        Ok((CheckoutRedirect { url, session_id }, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use storefront_core::{FormField, PackageCatalog};

    fn filled_form() -> FormModel {
        let catalog = PackageCatalog::standard();
        let mut form = FormModel::new();
        form.set_field(FormField::Name, "Sophie").unwrap();
        form.set_field(FormField::Email, "sophie@example.com").unwrap();
        form.set_field(FormField::Skills, "Rédaction").unwrap();
        form.set_field(FormField::Passion, "Cuisine").unwrap();
        form.set_field(FormField::WeeklyTime, "10-20 heures").unwrap();
        form.set_field(FormField::TargetIncome, "3000-5000€").unwrap();
        form.set_field(FormField::Experience, "Confirmé").unwrap();
        form.select_package(&catalog, "starter").unwrap();
        form
    }

    #[tokio::test]
    async fn test_create_session_returns_redirect() {
        let backend = Arc::new(ScriptedBackend::new().with_session_id("abc"));
        let initiator = CheckoutSessionInitiator::new(backend.clone());

        let (redirect, session) = initiator
            .create_session(&filled_form(), "https://shop.example/")
            .await
            .unwrap();

        assert_eq!(redirect.url, "https://pay.example/abc");
        assert_eq!(redirect.session_id, Some(SessionId::new("abc")));

        let session = session.unwrap();
        assert_eq!(session.id, SessionId::new("abc"));
        assert_eq!(session.form.unwrap().name, "Sophie");

        let requests = backend.session_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].package_id, "starter");
        assert_eq!(requests[0].origin_url, "https://shop.example");
        assert_eq!(requests[0].user_form.package_name, "Starter");
    }

    #[tokio::test]
    async fn test_incomplete_form_makes_no_request() {
        let backend = Arc::new(ScriptedBackend::new());
        let initiator = CheckoutSessionInitiator::new(backend.clone());

        let mut form = filled_form();
        form.set_field(FormField::Email, "").unwrap();

        let err = initiator.create_session(&form, "https://shop.example").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(fields) if fields == vec![FormField::Email]
        ));
        assert!(backend.session_requests().is_empty());
    }

    #[tokio::test]
    async fn test_form_without_package_makes_no_request() {
        let backend = Arc::new(ScriptedBackend::new());
        let initiator = CheckoutSessionInitiator::new(backend.clone());

        let mut form = filled_form();
        form.reset();

        let err = initiator.create_session(&form, "https://shop.example").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(fields) if fields.contains(&FormField::Package)
        ));
        assert!(backend.session_requests().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure() {
        let backend = Arc::new(ScriptedBackend::new().failing_session_creation("Package invalide"));
        let initiator = CheckoutSessionInitiator::new(backend.clone());

        let err = initiator
            .create_session(&filled_form(), "https://shop.example")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::SessionCreationFailed(msg) if msg == "Package invalide"
        ));
        assert_eq!(backend.session_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_is_a_failure() {
        let backend = Arc::new(ScriptedBackend::new().without_payment_url());
        let initiator = CheckoutSessionInitiator::new(backend);

        let err = initiator
            .create_session(&filled_form(), "https://shop.example")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SessionCreationFailed(_)));
    }
}
