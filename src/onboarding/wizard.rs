//! Multi-step onboarding wizard

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::draft::OnboardingDraft;
use super::schema::{validate, StepSchema, ValidationErrors};
use crate::auth::Identity;
use crate::error::Error;
use crate::notify::{Notification, Notifier};
use crate::store::{ProfileRecord, ProfileStore};

const SAVE_FAILED: &str = "Failed to save profile. Please try again.";
const NOT_AUTHENTICATED: &str = "User not authenticated.";

/// Where the wizard is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    Submitting,
    /// Profile written; the draft is gone
    Completed,
}

/// Observable wizard state
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSnapshot {
    pub phase: WizardPhase,
    pub current_step: usize,
    pub step_count: usize,
    pub is_submitting: bool,
    pub last_error: Option<String>,
    pub field_errors: ValidationErrors,
}

/// Result of [`OnboardingWizard::advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Moved on to the given step
    Advanced(usize),
    /// The last step validated and the profile was written
    Submitted(ProfileRecord),
    /// Ignored because a submission is running or already finished
    Busy,
}

/// Result of [`OnboardingWizard::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(ProfileRecord),
    /// Another submission is in flight; nothing was written
    AlreadySubmitting,
    /// The wizard finished earlier; nothing was written
    AlreadyCompleted,
}

#[derive(Debug)]
struct WizardState {
    current_step: usize,
    is_submitting: bool,
    last_error: Option<String>,
    field_errors: ValidationErrors,
    draft: Option<OnboardingDraft>,
}

/// Drives one user through the onboarding steps and writes their profile
pub struct OnboardingWizard {
    identity: Option<Identity>,
    steps: Vec<StepSchema>,
    store: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<WizardState>,
}

impl OnboardingWizard {
    /// Wizard with the standard three steps
    pub fn new(identity: Option<Identity>, store: Arc<dyn ProfileStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::build(identity, StepSchema::default_steps(), store, notifier)
    }

    /// Wizard with custom steps. Steps must be non-empty and must not share
    /// fields.
    pub fn with_steps(
        identity: Option<Identity>,
        steps: Vec<StepSchema>,
        store: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, Error> {
        if steps.is_empty() {
            return Err(Error::general("onboarding needs at least one step"));
        }

        let mut owned = BTreeSet::new();
        for step in &steps {
            for field in step.fields() {
                if !owned.insert(field) {
                    return Err(Error::general(format!(
                        "field {} appears in more than one step",
                        field
                    )));
                }
            }
        }

        Ok(Self::build(identity, steps, store, notifier))
    }

    fn build(
        identity: Option<Identity>,
        steps: Vec<StepSchema>,
        store: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let draft = OnboardingDraft::seeded(identity.as_ref().and_then(|i| i.display_name.as_deref()));
        Self {
            identity,
            steps,
            store,
            notifier,
            state: Mutex::new(WizardState {
                current_step: 0,
                is_submitting: false,
                last_error: None,
                field_errors: ValidationErrors::default(),
                draft: Some(draft),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WizardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn steps(&self) -> &[StepSchema] {
        &self.steps
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let state = self.lock();
        let phase = if state.draft.is_none() {
            WizardPhase::Completed
        } else if state.is_submitting {
            WizardPhase::Submitting
        } else {
            WizardPhase::Editing
        };

        WizardSnapshot {
            phase,
            current_step: state.current_step,
            step_count: self.steps.len(),
            is_submitting: state.is_submitting,
            last_error: state.last_error.clone(),
            field_errors: state.field_errors.clone(),
        }
    }

    pub fn current_step(&self) -> usize {
        self.lock().current_step
    }

    /// Copy of the draft, `None` once the profile has been written
    pub fn draft(&self) -> Option<OnboardingDraft> {
        self.lock().draft.clone()
    }

    /// Fraction of the progress bar filled, 0.0 on the first step
    pub fn progress(&self) -> f32 {
        if self.steps.len() < 2 {
            return 1.0;
        }
        self.lock().current_step as f32 / (self.steps.len() - 1) as f32
    }

    /// Apply user input to the draft. Refused while submitting or after
    /// completion.
    pub fn edit<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut OnboardingDraft),
    {
        let mut state = self.lock();
        if state.is_submitting {
            return false;
        }
        match state.draft.as_mut() {
            Some(draft) => {
                f(draft);
                true
            }
            None => false,
        }
    }

    /// Clear the last submission error
    pub fn dismiss_error(&self) {
        self.lock().last_error = None;
    }

    /// Validate the current step and move forward, submitting after the
    /// last one.
    pub async fn advance(&self) -> Result<StepOutcome, Error> {
        {
            let mut state = self.lock();
            let draft = match (&state.draft, state.is_submitting) {
                (Some(draft), false) => draft,
                _ => return Ok(StepOutcome::Busy),
            };

            let step = state.current_step;
            let violations = validate(&self.steps[step], draft);
            if !violations.is_empty() {
                let errors = ValidationErrors(violations);
                log::debug!("step {} rejected: {}", self.steps[step].id, errors);
                state.field_errors = errors.clone();
                return Err(Error::Validation(errors));
            }

            state.field_errors = ValidationErrors::default();
            if step + 1 < self.steps.len() {
                state.current_step = step + 1;
                log::debug!("advanced to step {}", self.steps[step + 1].id);
                return Ok(StepOutcome::Advanced(step + 1));
            }
        }

        match self.submit().await? {
            SubmitOutcome::Completed(record) => Ok(StepOutcome::Submitted(record)),
            SubmitOutcome::AlreadySubmitting | SubmitOutcome::AlreadyCompleted => Ok(StepOutcome::Busy),
        }
    }

    /// Go back one step without validating
    pub fn retreat(&self) -> bool {
        let mut state = self.lock();
        if state.is_submitting || state.draft.is_none() || state.current_step == 0 {
            return false;
        }
        state.current_step -= 1;
        true
    }

    /// Write the whole draft as the user's profile
    pub async fn submit(&self) -> Result<SubmitOutcome, Error> {
        let (identity, record) = {
            let mut state = self.lock();
            if state.is_submitting {
                return Ok(SubmitOutcome::AlreadySubmitting);
            }
            let draft = match &state.draft {
                Some(draft) => draft.clone(),
                None => return Ok(SubmitOutcome::AlreadyCompleted),
            };

            let identity = match &self.identity {
                Some(identity) => identity.clone(),
                None => {
                    state.last_error = Some(NOT_AUTHENTICATED.to_string());
                    drop(state);
                    self.notifier.notify(Notification::error("Error", NOT_AUTHENTICATED));
                    return Err(Error::Unauthenticated);
                }
            };

            for (index, step) in self.steps.iter().enumerate() {
                let violations = validate(step, &draft);
                if !violations.is_empty() {
                    let errors = ValidationErrors(violations);
                    state.current_step = index;
                    state.field_errors = errors.clone();
                    return Err(Error::Validation(errors));
                }
            }

            let record = ProfileRecord::from_draft(&identity, &draft)
                .ok_or_else(|| Error::general("draft is missing a required choice"))?;

            state.is_submitting = true;
            state.last_error = None;
            (identity, record)
        };

        let result = self.store.upsert_profile(&identity.uid, &record).await;

        let mut state = self.lock();
        state.is_submitting = false;
        match result {
            Ok(()) => {
                log::info!("onboarding complete for {}", identity.uid);
                state.draft = None;
                state.field_errors = ValidationErrors::default();
                Ok(SubmitOutcome::Completed(record))
            }
            Err(e) => {
                log::error!("error saving profile for {}: {}", identity.uid, e);
                state.last_error = Some(SAVE_FAILED.to_string());
                drop(state);
                self.notifier.notify(Notification::error("Error", SAVE_FAILED));
                Err(match e {
                    Error::TransientStore(_) => e,
                    other => Error::transient(other),
                })
            }
        }
    }
}
