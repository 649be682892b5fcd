//! The in-progress onboarding form

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::general(format!(
                        "unknown {} value: {}", stringify!($name), other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice!(
    /// The user's own gender
    Gender { Male => "male", Female => "female", Other => "other" }
);

choice!(
    /// Who the user wants to be matched with
    InterestedIn { Male => "male", Female => "female", Everyone => "everyone" }
);

choice!(
    RelationshipGoal { Casual => "casual", LongTerm => "long-term", Friendship => "friendship" }
);

choice!(
    HasPets { Yes => "yes", No => "no" }
);

/// Interest tags offered by the preferences step, as (value, label)
pub const INTEREST_OPTIONS: &[(&str, &str)] = &[
    ("anime", "Anime"),
    ("harry-potter", "Harry Potter"),
    ("travel", "Travel"),
    ("kpop", "K-pop"),
    ("gaming", "Gaming"),
    ("cooking", "Cooking"),
    ("reading", "Reading"),
    ("fitness", "Fitness"),
    ("music", "Music"),
    ("movies", "Movies"),
    ("art", "Art"),
    ("photography", "Photography"),
];

/// Language tags offered by the preferences step, as (value, label)
pub const LANGUAGE_OPTIONS: &[(&str, &str)] = &[
    ("oriya", "Oriya"),
    ("hindi", "Hindi"),
    ("french", "French"),
    ("english", "English"),
    ("spanish", "Spanish"),
    ("german", "German"),
    ("japanese", "Japanese"),
    ("korean", "Korean"),
    ("chinese", "Chinese"),
];

/// Display label for a catalog tag, if the tag is known
pub fn tag_label(options: &[(&str, &'static str)], value: &str) -> Option<&'static str> {
    options.iter().find(|(v, _)| *v == value).map(|(_, label)| *label)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    pub songs: Option<String>,
    pub movies: Option<String>,
}

/// Form data collected across the wizard steps, not yet persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingDraft {
    pub name: String,
    pub gender: Option<Gender>,
    pub interested_in: Option<InterestedIn>,
    pub relationship_goal: Option<RelationshipGoal>,
    pub interests: BTreeSet<String>,
    pub bio: String,
    /// Centimetres
    pub height: Option<u16>,
    pub languages: BTreeSet<String>,
    pub has_pets: Option<HasPets>,
    pub favorites: Favorites,
}

impl OnboardingDraft {
    pub const DEFAULT_HEIGHT: u16 = 170;

    /// A fresh draft for a wizard mounted on behalf of a signed-in user
    pub fn seeded(display_name: Option<&str>) -> Self {
        Self {
            name: display_name.unwrap_or_default().to_string(),
            height: Some(Self::DEFAULT_HEIGHT),
            ..Default::default()
        }
    }

    pub(crate) fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Name => FieldValue::Text(&self.name),
            Field::Gender => FieldValue::Choice(self.gender.map(|v| v.as_str())),
            Field::InterestedIn => FieldValue::Choice(self.interested_in.map(|v| v.as_str())),
            Field::RelationshipGoal => FieldValue::Choice(self.relationship_goal.map(|v| v.as_str())),
            Field::Interests => FieldValue::Tags(&self.interests),
            Field::Languages => FieldValue::Tags(&self.languages),
            Field::Bio => FieldValue::Text(&self.bio),
            Field::Height => FieldValue::Number(self.height),
            Field::HasPets => FieldValue::Choice(self.has_pets.map(|v| v.as_str())),
            Field::FavoriteSongs => FieldValue::OptionalText(self.favorites.songs.as_deref()),
            Field::FavoriteMovies => FieldValue::OptionalText(self.favorites.movies.as_deref()),
        }
    }
}

/// Addressable draft field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Gender,
    InterestedIn,
    RelationshipGoal,
    Interests,
    Languages,
    Bio,
    Height,
    HasPets,
    FavoriteSongs,
    FavoriteMovies,
}

impl Field {
    /// Form path of the field, as a UI would bind it
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Gender => "gender",
            Field::InterestedIn => "interestedIn",
            Field::RelationshipGoal => "relationshipGoal",
            Field::Interests => "interests",
            Field::Languages => "languages",
            Field::Bio => "bio",
            Field::Height => "height",
            Field::HasPets => "hasPets",
            Field::FavoriteSongs => "favorites.songs",
            Field::FavoriteMovies => "favorites.movies",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldValue<'a> {
    Text(&'a str),
    OptionalText(Option<&'a str>),
    Choice(Option<&'static str>),
    Tags(&'a BTreeSet<String>),
    Number(Option<u16>),
}
