//! Session state owned by the client
//!
//! [`SessionManager`] is the only writer of the process-wide session. It
//! reacts to identity changes, resolves the matching profile, and publishes
//! complete [`SessionSnapshot`]s through a `watch` channel; everything else
//! reads snapshots. A resolution that finishes after a newer identity change
//! has started is discarded: the generation check and the publish happen
//! under one lock, and notifications go out only after a publish.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};

use super::limits::{InactivityTimer, SignInLimiter};
use super::types::{Credentials, Identity};
use super::IdentityProvider;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::gate::{derive_gate_state, GateState};
use crate::notify::{Notification, Notifier};
use crate::store::{ProfileRecord, ProfileStore};

const PROFILE_FETCH_FAILED: &str = "Failed to fetch user profile";

/// Read-only view of the session at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub profile: Option<ProfileRecord>,
    pub is_loading: bool,
    /// Set when the profile could not be fetched during resolution
    pub auth_error: Option<String>,
}

impl SessionSnapshot {
    /// State at process start, before the first resolution
    pub fn initial() -> Self {
        Self {
            identity: None,
            profile: None,
            is_loading: true,
            auth_error: None,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            is_loading: false,
            ..Self::initial()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn has_completed_profile(&self) -> bool {
        self.profile.as_ref().map_or(false, ProfileRecord::is_complete)
    }

    pub fn gate_state(&self) -> GateState {
        derive_gate_state(self.is_loading, self.is_authenticated(), self.has_completed_profile())
    }
}

/// Owner of the session state
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionSnapshot>,
    /// Bumped by every resolution; held while publishing
    generation: Mutex<u64>,
    limiter: Mutex<SignInLimiter>,
    activity: Mutex<InactivityTimer>,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
        options: &ClientOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::initial());
        Self {
            provider,
            store,
            notifier,
            state,
            generation: Mutex::new(0),
            limiter: Mutex::new(SignInLimiter::new(options.sign_in_rate_limit)),
            activity: Mutex::new(InactivityTimer::new(options.inactivity_timeout)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Resolve the provider's current identity, then follow its changes
    /// until the provider goes away.
    pub async fn listen(&self) {
        let mut changes = self.provider.subscribe();
        self.handle_identity_change(self.provider.current_identity()).await;

        loop {
            match changes.recv().await {
                Ok(identity) => self.handle_identity_change(identity).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("missed {} identity changes, resyncing", skipped);
                    self.handle_identity_change(self.provider.current_identity()).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// React to a sign-in or sign-out reported by the identity provider
    pub async fn handle_identity_change(&self, identity: Option<Identity>) {
        {
            let current = self.state.borrow();
            if !current.is_loading && current.identity == identity {
                log::debug!("identity unchanged, skipping resolution");
                return;
            }
        }

        if let Err(Error::StaleIdentity) = self.resolve(identity).await {
            log::debug!("dropped stale session resolution");
        }
    }

    /// Re-read the profile of the current identity, e.g. after onboarding
    pub async fn refresh(&self) {
        let identity = self.state.borrow().identity.clone();
        if let Err(Error::StaleIdentity) = self.resolve(identity).await {
            log::debug!("dropped stale session refresh");
        }
    }

    async fn resolve(&self, identity: Option<Identity>) -> Result<(), Error> {
        let generation = {
            let mut current = self.lock_generation();
            *current += 1;

            match &identity {
                Some(_) => {
                    // hide the previous state until the new one is complete
                    self.state.send_modify(|s| s.is_loading = true);
                }
                None => {
                    self.lock_activity().clear();
                    self.state.send_replace(SessionSnapshot::signed_out());
                }
            }
            *current
        };

        let identity = match identity {
            Some(identity) => identity,
            None => {
                log::info!("session cleared");
                return Ok(());
            }
        };

        if let Err(e) = self.store.touch_last_login(&identity.uid).await {
            log::warn!("could not stamp last login for {}: {}", identity.uid, e);
        }

        let (profile, auth_error) = match self.store.get_profile(&identity.uid).await {
            Ok(profile) => (profile, None),
            Err(e) => {
                log::error!("error fetching profile for {}: {}", identity.uid, e);
                (None, Some(PROFILE_FETCH_FAILED.to_string()))
            }
        };

        let fetch_failed = auth_error.is_some();
        let summary = profile
            .as_ref()
            .map_or("none", |p| if p.is_complete() { "complete" } else { "pending" });
        let uid = identity.uid.clone();

        {
            let current = self.lock_generation();
            if *current != generation {
                return Err(Error::StaleIdentity);
            }
            self.lock_activity().touch(Utc::now());
            self.state.send_replace(SessionSnapshot {
                identity: Some(identity),
                profile,
                is_loading: false,
                auth_error,
            });
        }

        log::info!("session resolved for {} (profile: {})", uid, summary);
        if fetch_failed {
            self.notifier
                .notify(Notification::error("Error", "Failed to fetch your profile data"));
        }
        Ok(())
    }

    /// Sign in, subject to the attempt limit. A first sign-in gets a stub
    /// profile so the user is routed to onboarding.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, Error> {
        self.sign_in_at(credentials, Utc::now()).await
    }

    pub async fn sign_in_at(&self, credentials: &Credentials, now: DateTime<Utc>) -> Result<Identity, Error> {
        let checked = self.lock_limiter().check_and_record(now);
        if let Err(e) = checked {
            if let Error::RateLimited { minutes_left } = e {
                self.notifier.notify(Notification::error(
                    "Too many attempts",
                    &format!("Please try again after {} minutes", minutes_left),
                ));
            }
            return Err(e);
        }

        let identity = match self.sign_in_and_prepare(credentials).await {
            Ok(identity) => identity,
            Err(e) => {
                log::error!("sign in failed: {}", e);
                self.notifier
                    .notify(Notification::error("Authentication failed", &e.to_string()));
                return Err(e);
            }
        };

        self.lock_limiter().reset();
        self.notifier
            .notify(Notification::info("Welcome!", "You've successfully signed in"));
        self.handle_identity_change(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_in_and_prepare(&self, credentials: &Credentials) -> Result<Identity, Error> {
        let identity = self.provider.sign_in(credentials).await?;

        if self.store.get_profile(&identity.uid).await?.is_none() {
            log::info!("creating onboarding stub for {}", identity.uid);
            self.store
                .upsert_profile(&identity.uid, &ProfileRecord::stub(&identity))
                .await?;
        }

        Ok(identity)
    }

    /// Sign out. Local session state is reset whether or not the provider
    /// call succeeds.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let result = self.provider.sign_out().await;
        self.resolve(None).await?;

        match &result {
            Ok(()) => self
                .notifier
                .notify(Notification::info("Signed out", "You've been successfully signed out")),
            Err(e) => {
                log::error!("sign out error: {}", e);
                self.notifier
                    .notify(Notification::error("Error", "Failed to sign out. Please try again."));
            }
        }
        result
    }

    /// Ask the provider to email a verification link to the signed-in
    /// user. Does nothing when nobody is signed in.
    pub async fn send_verification_email(&self) -> Result<(), Error> {
        let signed_in = self.state.borrow().identity.is_some();
        if !signed_in {
            log::debug!("no signed-in user, not sending verification email");
            return Ok(());
        }

        let result = self.provider.send_verification_email().await;
        match &result {
            Ok(()) => self.notifier.notify(Notification::info(
                "Verification email sent",
                "Please check your inbox and verify your email",
            )),
            Err(e) => {
                log::error!("error sending verification email: {}", e);
                self.notifier.notify(Notification::error(
                    "Error",
                    "Failed to send verification email. Please try again later.",
                ));
            }
        }
        result
    }

    /// Note user activity, postponing the inactivity sign-out
    pub fn record_activity(&self, now: DateTime<Utc>) {
        if self.state.borrow().identity.is_some() {
            self.lock_activity().touch(now);
        }
    }

    /// Sign out if the session has been idle for too long. Returns whether
    /// it did.
    pub async fn expire_if_idle(&self, now: DateTime<Utc>) -> bool {
        let idle = self.state.borrow().identity.is_some() && self.lock_activity().is_idle(now);
        if !idle {
            return false;
        }

        log::info!("session idle, signing out");
        let _ = self.sign_out().await;
        self.notifier.notify(Notification::info(
            "Session expired",
            "You've been logged out due to inactivity",
        ));
        true
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_limiter(&self) -> MutexGuard<'_, SignInLimiter> {
        self.limiter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_activity(&self) -> MutexGuard<'_, InactivityTimer> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
