// wizard/mod.rs - Client-side enrollment wizard
//
// The wizard sequences the four enrollment actions. `WizardState` is the
// finite-state cursor; `WizardController` drives it against an
// `EnrollmentClient` and remembers the rider id per session key in a
// `SessionStore`.

pub mod client;
pub mod controller;
pub mod session;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::RiderId;
use crate::validation::Issue;

pub use client::{EnrollmentClient, HttpEnrollmentClient};
pub use controller::WizardController;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Personal,
    Security,
    Documents,
    Finance,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Personal, Step::Security, Step::Documents, Step::Finance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Personal => "personal",
            Step::Security => "security",
            Step::Documents => "documents",
            Step::Finance => "finance",
        }
    }

    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Personal => Some(Step::Security),
            Step::Security => Some(Step::Documents),
            Step::Documents => Some(Step::Finance),
            Step::Finance => None,
        }
    }

    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::Personal => None,
            Step::Security => Some(Step::Personal),
            Step::Documents => Some(Step::Security),
            Step::Finance => Some(Step::Documents),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown wizard step '{}'", s))
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("step '{0}' is locked until the previous step is completed")]
    StepLocked(Step),

    #[error("no rider in this session; complete the personal step first")]
    MissingRider,

    #[error("{error}")]
    Rejected { error: String, issues: Vec<Issue> },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("session store: {0}")]
    Session(String),

    #[error("rider {rider_id} was created but could not be loaded: {reason}")]
    RiderFetch { rider_id: RiderId, reason: String },
}

impl From<reqwest::Error> for WizardError {
    fn from(err: reqwest::Error) -> Self {
        WizardError::Transport(err.to_string())
    }
}

/// Cursor plus completion flags for one enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    current_step: Step,
    completed_steps: BTreeSet<Step>,
    rider_id: Option<RiderId>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_step: Step::Personal,
            completed_steps: BTreeSet::new(),
            rider_id: None,
        }
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn completed_steps(&self) -> &BTreeSet<Step> {
        &self.completed_steps
    }

    pub fn rider_id(&self) -> Option<RiderId> {
        self.rider_id
    }

    pub fn set_rider_id(&mut self, rider_id: Option<RiderId>) {
        self.rider_id = rider_id;
    }

    pub fn is_finished(&self) -> bool {
        Step::ALL.iter().all(|step| self.completed_steps.contains(step))
    }

    /// Personal is always open, earlier steps may be revisited, a later
    /// step opens once the step before it is completed.
    pub fn can_enter(&self, step: Step) -> bool {
        if step == Step::Personal || step <= self.current_step {
            return true;
        }
        step.previous()
            .map(|previous| self.completed_steps.contains(&previous))
            .unwrap_or(true)
    }

    pub fn go_to(&mut self, step: Step) -> Result<(), WizardError> {
        if !self.can_enter(step) {
            return Err(WizardError::StepLocked(step));
        }
        self.current_step = step;
        Ok(())
    }

    pub fn can_continue(&self, step: Step) -> bool {
        self.completed_steps.contains(&step)
    }

    pub fn complete(&mut self, step: Step) {
        self.completed_steps.insert(step);
        if self.current_step == step {
            if let Some(next) = step.next() {
                self.current_step = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_only_opens_personal() {
        let state = WizardState::new();
        assert_eq!(state.current_step(), Step::Personal);
        assert!(state.can_enter(Step::Personal));
        assert!(!state.can_enter(Step::Security));
        assert!(!state.can_enter(Step::Finance));
        assert!(!state.can_continue(Step::Personal));
    }

    #[test]
    fn completing_the_current_step_advances() {
        let mut state = WizardState::new();
        state.complete(Step::Personal);
        assert_eq!(state.current_step(), Step::Security);
        assert!(state.can_continue(Step::Personal));
        assert!(state.can_enter(Step::Security));
        assert!(!state.can_enter(Step::Documents));
    }

    #[test]
    fn go_to_refuses_locked_steps_and_allows_revisits() {
        let mut state = WizardState::new();
        assert!(matches!(state.go_to(Step::Documents), Err(WizardError::StepLocked(Step::Documents))));

        state.complete(Step::Personal);
        state.complete(Step::Security);
        assert_eq!(state.current_step(), Step::Documents);

        state.go_to(Step::Personal).unwrap();
        assert_eq!(state.current_step(), Step::Personal);
        // Re-completing an earlier step moves forward again
        state.complete(Step::Personal);
        assert_eq!(state.current_step(), Step::Security);
        // Documents stays reachable because security is completed
        state.go_to(Step::Documents).unwrap();
    }

    #[test]
    fn completing_another_step_leaves_the_cursor() {
        let mut state = WizardState::new();
        state.complete(Step::Personal);
        state.complete(Step::Security);
        state.go_to(Step::Personal).unwrap();
        state.complete(Step::Security);
        assert_eq!(state.current_step(), Step::Personal);
    }

    #[test]
    fn finance_is_terminal() {
        let mut state = WizardState::new();
        for step in Step::ALL {
            state.complete(step);
        }
        assert_eq!(state.current_step(), Step::Finance);
        assert!(state.is_finished());
    }

    #[test]
    fn steps_parse_from_their_names() {
        for step in Step::ALL {
            assert_eq!(step.as_str().parse::<Step>().unwrap(), step);
        }
        assert!("payout".parse::<Step>().is_err());
    }
}
