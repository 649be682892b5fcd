//! Authentication and session management

mod limits;
mod session;
mod types;

use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::error::Error;
use crate::fetch::Fetch;

pub use limits::*;
pub use session::*;
pub use types::*;

/// Token session slot shared between the auth client and data clients
pub type SharedSession = Arc<RwLock<Option<Session>>>;

/// Current access token in a shared session slot
pub fn access_token(session: &SharedSession) -> Option<String> {
    let guard = session.read().unwrap_or_else(PoisonError::into_inner);
    guard.as_ref().map(|s| s.access_token.clone())
}

/// Contract for the external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, if any
    fn current_identity(&self) -> Option<Identity>;

    /// Identity changes (sign-in and sign-out). The same identity may be
    /// delivered more than once.
    fn subscribe(&self) -> broadcast::Receiver<Option<Identity>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, Error>;

    /// Sign out. Succeeds when nobody is signed in.
    async fn sign_out(&self) -> Result<(), Error>;

    /// Email a verification link to the signed-in user. Succeeds without
    /// sending anything when nobody is signed in.
    async fn send_verification_email(&self) -> Result<(), Error>;
}

/// Identity provider backed by the hosted auth REST API
pub struct RestIdentityProvider {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: SharedSession,

    changes: broadcast::Sender<Option<Identity>>,
}

impl RestIdentityProvider {
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(RwLock::new(None)),
            changes,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// The session slot, for clients that must authorize as the user
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    fn store_session(&self, session: Option<Session>) -> Option<Identity> {
        let identity = session.as_ref().map(|s| Identity::from(&s.user));
        {
            let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
            *current = session;
        }
        // no receivers is fine
        let _ = self.changes.send(identity.clone());
        identity
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, Error> {
        let url = self.get_auth_url("/token");

        let session = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .query("grant_type", "password")
            .json(credentials)?
            .execute::<Session>()
            .await?;

        log::info!("signed in as {}", session.user.id);
        self.store_session(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        let current = self.session.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|s| Identity::from(&s.user))
    }

    fn subscribe(&self) -> broadcast::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, Error> {
        let session = self.sign_in_with_password(credentials).await?;
        Ok(Identity::from(&session.user))
    }

    async fn sign_out(&self) -> Result<(), Error> {
        let token = match access_token(&self.session) {
            Some(token) => token,
            None => return Ok(()),
        };

        // the local session is dropped even if the server call fails
        self.store_session(None);

        let url = self.get_auth_url("/logout");
        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .execute_empty()
            .await
    }

    async fn send_verification_email(&self) -> Result<(), Error> {
        let (token, email) = {
            let current = self.session.read().unwrap_or_else(PoisonError::into_inner);
            match current.as_ref() {
                Some(session) => (session.access_token.clone(), session.user.email.clone()),
                None => return Ok(()),
            }
        };
        let email = email.ok_or_else(|| Error::auth("signed-in user has no email address"))?;

        let url = self.get_auth_url("/resend");
        let payload = serde_json::json!({
            "type": "signup",
            "email": email
        });

        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .json(&payload)?
            .execute_empty()
            .await
    }
}
