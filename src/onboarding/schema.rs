//! Per-step validation schemas
//!
//! Each wizard step owns a [`StepSchema`]: an ordered list of field rules,
//! each rule pairing a constraint with the message shown when it is
//! violated. [`validate`] checks every field of the step and reports at
//! most one violation per field (the first rule that field breaks), so a
//! step with three bad fields yields three messages at once.

use std::collections::BTreeSet;
use std::fmt;

use super::draft::{Field, FieldValue, OnboardingDraft};

/// A single check applied to a field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Choice or number must be set
    Required,
    /// Text length in characters, inclusive
    MinChars(usize),
    MaxChars(usize),
    /// Tag set must contain at least one entry
    NonEmpty,
    /// Numeric value, inclusive
    Min(u16),
    Max(u16),
    /// Free text, may be absent
    Optional,
}

impl Constraint {
    fn holds(&self, value: FieldValue<'_>) -> bool {
        match (self, value) {
            (Constraint::Optional, _) => true,
            (Constraint::Required, FieldValue::Choice(c)) => c.is_some(),
            (Constraint::Required, FieldValue::Number(n)) => n.is_some(),
            (Constraint::Required, FieldValue::Text(t)) => !t.is_empty(),
            (Constraint::MinChars(min), FieldValue::Text(t)) => t.chars().count() >= *min,
            (Constraint::MaxChars(max), FieldValue::Text(t)) => t.chars().count() <= *max,
            (Constraint::MaxChars(max), FieldValue::OptionalText(t)) => {
                t.map_or(true, |t| t.chars().count() <= *max)
            }
            (Constraint::NonEmpty, FieldValue::Tags(tags)) => !tags.is_empty(),
            // an unset number is reported by Required
            (Constraint::Min(min), FieldValue::Number(n)) => n.map_or(true, |n| n >= *min),
            (Constraint::Max(max), FieldValue::Number(n)) => n.map_or(true, |n| n <= *max),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub constraint: Constraint,
    pub message: &'static str,
}

impl FieldRule {
    pub fn new(field: Field, constraint: Constraint, message: &'static str) -> Self {
        Self { field, constraint, message }
    }
}

/// Validation rules for one wizard step
#[derive(Debug, Clone)]
pub struct StepSchema {
    pub id: &'static str,
    pub title: &'static str,
    pub rules: Vec<FieldRule>,
}

impl StepSchema {
    /// Name, gender and who the user is interested in
    pub fn basic_info() -> Self {
        Self {
            id: "basic",
            title: "Basic Info",
            rules: vec![
                FieldRule::new(Field::Name, Constraint::MinChars(2), "Name must be at least 2 characters."),
                FieldRule::new(Field::Name, Constraint::MaxChars(50), "Name must be at most 50 characters."),
                FieldRule::new(Field::Gender, Constraint::Required, "Please select your gender."),
                FieldRule::new(
                    Field::InterestedIn,
                    Constraint::Required,
                    "Please select who you are interested in.",
                ),
            ],
        }
    }

    pub fn preferences() -> Self {
        Self {
            id: "preferences",
            title: "Preferences",
            rules: vec![
                FieldRule::new(
                    Field::RelationshipGoal,
                    Constraint::Required,
                    "Please select your relationship goal.",
                ),
                FieldRule::new(Field::Interests, Constraint::NonEmpty, "Please select at least one interest."),
                FieldRule::new(Field::Languages, Constraint::NonEmpty, "Please select at least one language."),
            ],
        }
    }

    pub fn personal_details() -> Self {
        Self {
            id: "personal",
            title: "Personal Details",
            rules: vec![
                FieldRule::new(Field::Bio, Constraint::MinChars(10), "Bio must be at least 10 characters."),
                FieldRule::new(Field::Height, Constraint::Required, "Please enter your height."),
                FieldRule::new(Field::Height, Constraint::Min(50), "Height must be at least 50 cm."),
                FieldRule::new(Field::Height, Constraint::Max(250), "Height must be less than 250 cm."),
                FieldRule::new(Field::HasPets, Constraint::Required, "Please specify if you have pets."),
                FieldRule::new(Field::FavoriteSongs, Constraint::Optional, ""),
                FieldRule::new(Field::FavoriteMovies, Constraint::Optional, ""),
            ],
        }
    }

    /// The three onboarding steps in order
    pub fn default_steps() -> Vec<StepSchema> {
        vec![Self::basic_info(), Self::preferences(), Self::personal_details()]
    }

    /// Fields this step owns, in rule order without repeats
    pub fn fields(&self) -> Vec<Field> {
        let mut seen = BTreeSet::new();
        self.rules
            .iter()
            .filter(|r| seen.insert(r.field))
            .map(|r| r.field)
            .collect()
    }
}

/// One field that failed its step schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: Field,
    pub message: &'static str,
}

/// Every violation found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a specific field, if it failed
    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|v| v.field == field).map(|v| v.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| format!("{}: {}", v.field, v.message)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Check one step's fields against the draft
pub fn validate(schema: &StepSchema, draft: &OnboardingDraft) -> Vec<Violation> {
    let mut failed = BTreeSet::new();
    let mut violations = Vec::new();

    for rule in &schema.rules {
        if failed.contains(&rule.field) {
            continue;
        }
        if !rule.constraint.holds(draft.value(rule.field)) {
            failed.insert(rule.field);
            violations.push(Violation {
                field: rule.field,
                message: rule.message,
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::{Gender, HasPets, InterestedIn};

    #[test]
    fn test_empty_name_reports_min_length() {
        let draft = OnboardingDraft::default();
        let violations = validate(&StepSchema::basic_info(), &draft);

        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0].field, Field::Name);
        assert!(violations[0].message.contains("must be at least 2 characters"));
    }

    #[test]
    fn test_name_length_counts_chars() {
        let mut draft = OnboardingDraft::default();
        draft.gender = Some(Gender::Other);
        draft.interested_in = Some(InterestedIn::Everyone);

        draft.name = "Zo".to_string();
        assert!(validate(&StepSchema::basic_info(), &draft).is_empty());

        draft.name = "é".repeat(50);
        assert!(validate(&StepSchema::basic_info(), &draft).is_empty());

        draft.name = "x".repeat(51);
        let violations = validate(&StepSchema::basic_info(), &draft);
        assert_eq!(violations, vec![Violation {
            field: Field::Name,
            message: "Name must be at most 50 characters.",
        }]);
    }

    #[test]
    fn test_height_bounds() {
        let mut draft = OnboardingDraft::seeded(None);
        draft.bio = "I like long walks.".to_string();
        draft.has_pets = Some(HasPets::No);
        let schema = StepSchema::personal_details();

        for ok in [50, 170, 250] {
            draft.height = Some(ok);
            assert!(validate(&schema, &draft).is_empty(), "height {}", ok);
        }

        draft.height = Some(49);
        assert_eq!(validate(&schema, &draft)[0].message, "Height must be at least 50 cm.");
        draft.height = Some(251);
        assert_eq!(validate(&schema, &draft)[0].message, "Height must be less than 250 cm.");
        draft.height = None;
        assert_eq!(validate(&schema, &draft)[0].message, "Please enter your height.");
    }

    #[test]
    fn test_one_violation_per_field() {
        let schema = StepSchema::personal_details();
        let mut draft = OnboardingDraft::default();
        draft.height = None;

        let violations = validate(&schema, &draft);
        let fields: Vec<Field> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec![Field::Bio, Field::Height, Field::HasPets]);
    }

    #[test]
    fn test_step_fields_are_disjoint() {
        let mut all = BTreeSet::new();
        for step in StepSchema::default_steps() {
            for field in step.fields() {
                assert!(all.insert(field), "{} owned by two steps", field);
            }
        }
        assert_eq!(all.len(), 11);
    }
}
