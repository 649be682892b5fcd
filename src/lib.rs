//! CampusVibe client core
//!
//! Session gating and profile onboarding for the CampusVibe campus social
//! app. The hosted auth service and profile table are reached over REST;
//! rendering, routing and toasts belong to the embedding front end, which
//! plugs in through [`gate::Navigator`] and [`notify::Notifier`].

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod notify;
pub mod onboarding;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{RestIdentityProvider, SessionManager};
use crate::config::ClientOptions;
use crate::error::Error;
use crate::gate::RouteGuard;
use crate::notify::ToastQueue;
use crate::onboarding::{OnboardingWizard, StepOutcome};
use crate::store::RestProfileStore;

/// The main entry point for the CampusVibe client
pub struct CampusVibe {
    /// The base URL for the backend project
    pub url: String,
    /// The anonymous API key for the backend project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    identity: Arc<RestIdentityProvider>,
    profiles: Arc<RestProfileStore>,
    toasts: Arc<ToastQueue>,
    session: Arc<SessionManager>,
}

impl CampusVibe {
    /// Create a new client
    ///
    /// # Example
    ///
    /// ```
    /// use campus_vibe::CampusVibe;
    ///
    /// let app = CampusVibe::new("https://your-project-url.example.co", "your-anon-key");
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use campus_vibe::{CampusVibe, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_profiles_table("profiles");
    /// let app = CampusVibe::new_with_options("https://your-project-url.example.co", "your-anon-key", options);
    /// ```
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            Client::new()
        });

        let identity = Arc::new(RestIdentityProvider::new(url, key, http_client.clone()));
        let profiles = Arc::new(
            RestProfileStore::new(url, key, &options.profiles_table, http_client.clone())
                .with_session(identity.session()),
        );
        let toasts = Arc::new(ToastQueue::new(options.toast_duration));
        let session = Arc::new(SessionManager::new(
            identity.clone(),
            profiles.clone(),
            toasts.clone(),
            &options,
        ));

        Self {
            url: url.to_string(),
            key: key.to_string(),
            http_client,
            options,
            identity,
            profiles,
            toasts,
            session,
        }
    }

    /// The identity provider
    pub fn auth(&self) -> &RestIdentityProvider {
        &self.identity
    }

    /// The profile store
    pub fn profiles(&self) -> &RestProfileStore {
        &self.profiles
    }

    /// Notifications waiting to be shown
    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    /// The session owner. Clone the `Arc` to run [`SessionManager::listen`]
    /// on a task.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// A route guard over the configured destinations
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.options.routes.clone())
    }

    /// A wizard for the currently signed-in user
    pub fn onboarding_wizard(&self) -> OnboardingWizard {
        OnboardingWizard::new(
            self.session.snapshot().identity,
            self.profiles.clone(),
            self.toasts.clone(),
        )
    }

    /// Advance `wizard`; once the profile is written the session is
    /// re-resolved so the gate moves on from onboarding.
    pub async fn advance_onboarding(&self, wizard: &OnboardingWizard) -> Result<StepOutcome, Error> {
        let outcome = wizard.advance().await?;
        if let StepOutcome::Submitted(_) = &outcome {
            self.session.refresh().await;
        }
        Ok(outcome)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Credentials, Identity, IdentityProvider, SessionSnapshot};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::gate::{Decision, GateState, Navigator, Redirect};
    pub use crate::notify::{Notification, Notifier, Severity};
    pub use crate::onboarding::{OnboardingDraft, OnboardingWizard, StepOutcome, SubmitOutcome};
    pub use crate::store::{ProfileRecord, ProfileStore};
    pub use crate::CampusVibe;
}
