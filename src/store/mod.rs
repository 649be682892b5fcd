//! Profile persistence
//!
//! The profile store is external. [`ProfileStore`] is the contract the
//! session and onboarding logic rely on; [`RestProfileStore`] speaks to a
//! PostgREST-style endpoint and [`MemoryProfileStore`] keeps everything in
//! process.

mod types;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::auth::{access_token, SharedSession};
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

pub use types::*;

/// Contract for the remote profile document store
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for `uid`, `None` if it has never been written
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, Error>;

    /// Replace the profile for `uid` atomically. Either the whole record
    /// lands or nothing does.
    async fn upsert_profile(&self, uid: &str, record: &ProfileRecord) -> Result<(), Error>;

    /// Stamp the last sign-in time on an existing profile
    async fn touch_last_login(&self, uid: &str) -> Result<(), Error>;
}

/// Profile store backed by a PostgREST table
pub struct RestProfileStore {
    url: String,
    key: String,
    table: String,
    client: Client,
    session: Option<SharedSession>,
}

impl RestProfileStore {
    pub fn new(url: &str, key: &str, table: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            table: table.to_string(),
            client,
            session: None,
        }
    }

    /// Authorize requests with the signed-in user's token when there is one
    pub fn with_session(mut self, session: SharedSession) -> Self {
        self.session = Some(session);
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn authorize<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = self
            .session
            .as_ref()
            .and_then(access_token)
            .unwrap_or_else(|| self.key.clone());

        builder.header("apikey", &self.key).bearer_auth(&token)
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, Error> {
        let url = self.table_url();
        let rows = self
            .authorize(Fetch::get(&self.client, &url))
            .query("select", "*")
            .query("uid", &format!("eq.{}", uid))
            .query("limit", "1")
            .execute::<Vec<ProfileRecord>>()
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, uid: &str, record: &ProfileRecord) -> Result<(), Error> {
        if record.uid != uid {
            return Err(Error::database(format!(
                "record uid {} does not match key {}",
                record.uid, uid
            )));
        }

        let url = self.table_url();
        self.authorize(Fetch::post(&self.client, &url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query("on_conflict", "uid")
            .json(record)?
            .execute_empty()
            .await
    }

    async fn touch_last_login(&self, uid: &str) -> Result<(), Error> {
        let url = self.table_url();
        let body = serde_json::json!({ "lastLogin": Utc::now() });

        self.authorize(Fetch::patch(&self.client, &url))
            .header("Prefer", "return=minimal")
            .query("uid", &format!("eq.{}", uid))
            .json(&body)?
            .execute_empty()
            .await
    }
}

/// In-process profile store
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, ProfileRecord>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored record
    pub fn get(&self, uid: &str) -> Option<ProfileRecord> {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, Error> {
        Ok(self.get(uid))
    }

    async fn upsert_profile(&self, uid: &str, record: &ProfileRecord) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = record.clone();
        record.uid = uid.to_string();
        // an existing row keeps its creation time
        let existing = profiles.get(uid).and_then(|p| p.created_at);
        record.created_at = existing.or(record.created_at).or_else(|| Some(Utc::now()));

        profiles.insert(uid.to_string(), record);
        Ok(())
    }

    async fn touch_last_login(&self, uid: &str) -> Result<(), Error> {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(profile) = profiles.get_mut(uid) {
            profile.last_login = Some(Utc::now());
        }
        Ok(())
    }
}
