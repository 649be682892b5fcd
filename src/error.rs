//! Error handling for the CampusVibe client core

use std::fmt;
use thiserror::Error;

use crate::onboarding::ValidationErrors;

/// Unified error type for the CampusVibe client core
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Authentication errors reported by the identity provider
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-retryable profile store errors
    #[error("Database error: {0}")]
    Database(String),

    /// One or more fields of the current step failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// An operation needed a signed-in identity and there was none
    #[error("User not authenticated.")]
    Unauthenticated,

    /// Network or store failure that the user may retry
    #[error("Store unavailable: {0}")]
    TransientStore(String),

    /// A session resolution finished after the identity it was started for changed
    #[error("Session resolution superseded by a newer identity change")]
    StaleIdentity,

    /// Too many sign-in attempts in the current window
    #[error("Too many attempts, try again in {minutes_left} minutes")]
    RateLimited {
        /// Whole minutes until the lockout ends
        minutes_left: i64,
    },

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new retryable store error
    pub fn transient<T: fmt::Display>(msg: T) -> Self {
        Error::TransientStore(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Whether re-running the same operation unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TransientStore(_) => true,
            Error::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}
