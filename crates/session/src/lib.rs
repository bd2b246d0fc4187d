#![deny(warnings)]

//! Caller-owned submission workflow around the projection engine.
//!
//! A session holds the working configuration and its lock state. Nothing
//! here is process-global: the caller owns the session value and may persist
//! it with serde between runs.

use policy_core::{clamp_configuration, PolicyConfiguration};
use policy_engine::{evaluate_with_profile, FormulaProfile, ProjectionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Lifecycle of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    /// Editable, never submitted.
    Draft,
    /// Submitted; configuration changes are rejected.
    Locked,
    /// Reopened for editing after an authorized unlock.
    Unlocked,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("configuration is locked after submission")]
    Locked,
    #[error("configuration cannot be submitted (over budget: {over_budget}, ideal ratio: {ideal_ratio})")]
    NotSubmittable { over_budget: bool, ideal_ratio: bool },
    #[error("configuration is not locked")]
    NotLocked,
    #[error("unlock credential rejected")]
    Unauthorized,
}

/// Opaque credential presented to unlock a submission.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Decides whether a credential may unlock a submitted configuration.
pub trait Authorizer {
    fn authorize(&self, credential: &Credential) -> bool;
}

/// Single shared passphrase, kept for compatibility with the existing
/// unlock flow. Not a security boundary.
pub struct SharedPassphrase {
    passphrase: Vec<u8>,
}

impl SharedPassphrase {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into().into_bytes(),
        }
    }
}

impl Authorizer for SharedPassphrase {
    fn authorize(&self, credential: &Credential) -> bool {
        constant_time_eq(&self.passphrase, credential.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Working configuration plus its submission state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSession {
    config: PolicyConfiguration,
    state: SubmissionState,
    /// Set on the first successful submit and never cleared.
    has_submitted: bool,
    #[serde(default)]
    profile: FormulaProfile,
}

impl Default for SubmissionSession {
    fn default() -> Self {
        Self::new(PolicyConfiguration::default())
    }
}

impl SubmissionSession {
    pub fn new(config: PolicyConfiguration) -> Self {
        Self::with_profile(config, FormulaProfile::canonical())
    }

    pub fn with_profile(config: PolicyConfiguration, profile: FormulaProfile) -> Self {
        Self {
            config: clamp_configuration(config),
            state: SubmissionState::Draft,
            has_submitted: false,
            profile,
        }
    }

    pub fn configuration(&self) -> &PolicyConfiguration {
        &self.config
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn has_submitted(&self) -> bool {
        self.has_submitted
    }

    /// Fresh projection of the current configuration.
    pub fn projection(&self) -> ProjectionResult {
        evaluate_with_profile(&self.config, &self.profile)
    }

    /// Apply an edit and return the new projection. Rejected while locked.
    pub fn update<F>(&mut self, edit: F) -> Result<ProjectionResult, SessionError>
    where
        F: FnOnce(&mut PolicyConfiguration),
    {
        if self.state == SubmissionState::Locked {
            warn!("rejected configuration change on locked session");
            return Err(SessionError::Locked);
        }
        let mut next = self.config.clone();
        edit(&mut next);
        self.config = clamp_configuration(next);
        Ok(self.projection())
    }

    /// Lock the configuration in. Requires it to be within budget and at the
    /// ideal BEV to charger ratio.
    pub fn submit(&mut self) -> Result<ProjectionResult, SessionError> {
        if self.state == SubmissionState::Locked {
            return Err(SessionError::Locked);
        }
        let result = self.projection();
        if !result.is_submittable() {
            return Err(SessionError::NotSubmittable {
                over_budget: result.is_over_budget,
                ideal_ratio: result.is_ideal_ratio,
            });
        }
        self.state = SubmissionState::Locked;
        self.has_submitted = true;
        info!(
            total_cost = %result.total_cost,
            projected_emissions = result.projected_emissions,
            "configuration submitted"
        );
        Ok(result)
    }

    /// Reopen a locked submission for editing.
    pub fn unlock(
        &mut self,
        credential: &Credential,
        authorizer: &dyn Authorizer,
    ) -> Result<(), SessionError> {
        if self.state != SubmissionState::Locked {
            return Err(SessionError::NotLocked);
        }
        if !authorizer.authorize(credential) {
            warn!("unlock attempt rejected");
            return Err(SessionError::Unauthorized);
        }
        self.state = SubmissionState::Unlocked;
        info!("submission unlocked");
        Ok(())
    }
}
