//! Types for authentication

use serde::{Deserialize, Serialize};

/// The identity provider's handle for a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable key, also used to address the user's profile
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// Email and password sign-in
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

/// Token session issued by the hosted auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: User,
}

/// User as returned by the hosted auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,

    #[serde(default)]
    pub user_metadata: serde_json::Value,

    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        let display_name = ["full_name", "name"]
            .iter()
            .find_map(|key| user.user_metadata.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string);

        Identity {
            uid: user.id.clone(),
            email: user.email.clone(),
            display_name,
            email_verified: user.email_confirmed_at.is_some(),
        }
    }
}
