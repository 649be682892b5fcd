//! Configuration options for the CampusVibe client

use std::time::Duration;

use crate::auth::RateLimit;
use crate::gate::RouteTable;

/// Configuration options for the CampusVibe client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Table (collection) holding one profile per identity
    pub profiles_table: String,

    /// Destinations the route guard knows about
    pub routes: RouteTable,

    /// Sign-in attempt limiting
    pub sign_in_rate_limit: RateLimit,

    /// Sign out after this long without user activity
    pub inactivity_timeout: Duration,

    /// How long a notification stays visible
    pub toast_duration: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            profiles_table: "users".to_string(),
            routes: RouteTable::default(),
            sign_in_rate_limit: RateLimit::default(),
            inactivity_timeout: Duration::from_secs(2 * 60 * 60),
            toast_duration: Duration::from_secs(5),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the profiles table
    pub fn with_profiles_table(mut self, value: &str) -> Self {
        self.profiles_table = value.to_string();
        self
    }

    /// Set the route table
    pub fn with_routes(mut self, value: RouteTable) -> Self {
        self.routes = value;
        self
    }

    /// Set the sign-in rate limit
    pub fn with_sign_in_rate_limit(mut self, value: RateLimit) -> Self {
        self.sign_in_rate_limit = value;
        self
    }

    /// Set the inactivity timeout
    pub fn with_inactivity_timeout(mut self, value: Duration) -> Self {
        self.inactivity_timeout = value;
        self
    }

    /// Set how long notifications stay visible
    pub fn with_toast_duration(mut self, value: Duration) -> Self {
        self.toast_duration = value;
        self
    }
}
