//! Persisted profile shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::onboarding::{Gender, HasPets, InterestedIn, OnboardingDraft, RelationshipGoal};

/// One user's profile document, keyed by the identity's uid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub uid: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub gender: Option<Gender>,

    #[serde(default)]
    pub interested_in: Option<InterestedIn>,

    /// Assigned by the store when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(default)]
    pub needs_onboarding: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_details: Option<ProfileDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub relationship_goal: RelationshipGoal,
    pub interests: Vec<String>,
    pub bio: String,
    pub height: u16,
    pub languages: Vec<String>,
    pub has_pets: HasPets,
    pub favorites: StoredFavorites,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFavorites {
    pub songs: String,
    pub movies: String,
}

impl ProfileRecord {
    /// Placeholder written at first sign-in so the user is routed to onboarding
    pub fn stub(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            name: identity.display_name.clone().unwrap_or_default(),
            gender: None,
            interested_in: None,
            created_at: None,
            last_login: None,
            needs_onboarding: true,
            profile_details: None,
        }
    }

    /// Full record for a completed draft. `None` if a required choice is unset.
    pub fn from_draft(identity: &Identity, draft: &OnboardingDraft) -> Option<Self> {
        let details = ProfileDetails {
            relationship_goal: draft.relationship_goal?,
            interests: draft.interests.iter().cloned().collect(),
            bio: draft.bio.clone(),
            height: draft.height?,
            languages: draft.languages.iter().cloned().collect(),
            has_pets: draft.has_pets?,
            favorites: StoredFavorites {
                songs: draft.favorites.songs.clone().unwrap_or_default(),
                movies: draft.favorites.movies.clone().unwrap_or_default(),
            },
        };

        Some(Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            name: draft.name.clone(),
            gender: Some(draft.gender?),
            interested_in: Some(draft.interested_in?),
            created_at: None,
            last_login: None,
            needs_onboarding: false,
            profile_details: Some(details),
        })
    }

    /// Whether onboarding has been finished for this profile
    pub fn is_complete(&self) -> bool {
        !self.needs_onboarding
    }
}
