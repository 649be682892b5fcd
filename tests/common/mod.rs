#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

use campus_vibe::auth::{Credentials, Identity, IdentityProvider};
use campus_vibe::error::Error;
use campus_vibe::gate::{Navigator, Redirect};
use campus_vibe::notify::{Notification, Notifier};
use campus_vibe::onboarding::{Gender, HasPets, InterestedIn, OnboardingDraft, RelationshipGoal};
use campus_vibe::store::{MemoryProfileStore, ProfileRecord, ProfileStore};

pub fn identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(format!("{}@campus.edu", uid)),
        display_name: Some("Asha".to_string()),
        email_verified: true,
    }
}

/// A draft that passes every step
pub fn fill(draft: &mut OnboardingDraft) {
    draft.name = "Asha".to_string();
    draft.gender = Some(Gender::Female);
    draft.interested_in = Some(InterestedIn::Everyone);
    draft.relationship_goal = Some(RelationshipGoal::LongTerm);
    draft.interests = ["travel", "music"].iter().map(|s| s.to_string()).collect();
    draft.languages = ["english"].iter().map(|s| s.to_string()).collect();
    draft.bio = "Loves hiking and old films.".to_string();
    draft.height = Some(170);
    draft.has_pets = Some(HasPets::No);
    draft.favorites.songs = Some(String::new());
    draft.favorites.movies = Some("Inception".to_string());
}

/// Memory store with call counting and injectable failures
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryProfileStore,
    pub upserts: AtomicUsize,
    pub gets: AtomicUsize,
    pub fail_upserts: AtomicBool,
    pub fail_gets: AtomicBool,
    pub upsert_delay: Mutex<Option<Duration>>,
    /// When set, `get_profile` signals `get_started` and waits for `release`
    pub hold_gets: AtomicBool,
    pub get_started: Notify,
    pub release: Notify,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for CountingStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.hold_gets.load(Ordering::SeqCst) {
            self.get_started.notify_one();
            self.release.notified().await;
        }
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Error::transient("connection reset"));
        }
        self.inner.get_profile(uid).await
    }

    async fn upsert_profile(&self, uid: &str, record: &ProfileRecord) -> Result<(), Error> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.upsert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Error::transient("network unreachable"));
        }
        self.inner.upsert_profile(uid, record).await
    }

    async fn touch_last_login(&self, uid: &str) -> Result<(), Error> {
        self.inner.touch_last_login(uid).await
    }
}

/// Identity provider driven by the test
pub struct ScriptedProvider {
    pub identity: Mutex<Option<Identity>>,
    pub next_sign_in: Mutex<Option<Identity>>,
    pub fail_sign_out: AtomicBool,
    pub sign_outs: AtomicUsize,
    pub fail_verification: AtomicBool,
    pub verification_emails: AtomicUsize,
    changes: broadcast::Sender<Option<Identity>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            identity: Mutex::new(None),
            next_sign_in: Mutex::new(None),
            fail_sign_out: AtomicBool::new(false),
            sign_outs: AtomicUsize::new(0),
            fail_verification: AtomicBool::new(false),
            verification_emails: AtomicUsize::new(0),
            changes,
        }
    }

    /// Simulate the provider reporting a change
    pub fn emit(&self, identity: Option<Identity>) {
        *self.identity.lock().unwrap() = identity.clone();
        let _ = self.changes.send(identity);
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<Identity, Error> {
        let next = self.next_sign_in.lock().unwrap().clone();
        match next {
            Some(identity) => {
                self.emit(Some(identity.clone()));
                Ok(identity)
            }
            None => Err(Error::auth("invalid login credentials")),
        }
    }

    async fn sign_out(&self) -> Result<(), Error> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(Error::transient("offline"));
        }
        self.emit(None);
        Ok(())
    }

    async fn send_verification_email(&self) -> Result<(), Error> {
        self.verification_emails.fetch_add(1, Ordering::SeqCst);
        if self.fail_verification.load(Ordering::SeqCst) {
            return Err(Error::transient("mailer unavailable"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.title.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub redirects: Mutex<Vec<Redirect>>,
}

impl Navigator for RecordingNavigator {
    fn redirect_to(&self, redirect: &Redirect) {
        self.redirects.lock().unwrap().push(redirect.clone());
    }
}
