use serde::{Deserialize, Serialize};

use crate::error::TradegymResult;

pub mod action;
pub mod config;
pub mod cursor;
pub mod env;
pub mod execution;
pub mod history;
pub mod observation;
pub mod portfolio;
pub mod reward;

use self::{action::ActionVector, observation::Observation};

/// The Gym-style contract a training loop drives.
pub trait Env {
    /// Starts a fresh episode at day 0 and returns the initial observation.
    fn reset(&mut self) -> TradegymResult<(Observation, StepInfo)>;

    /// Applies one trade-intensity vector and advances one trading day.
    fn step(&mut self, action: &ActionVector) -> TradegymResult<Transition>;
}

/// Everything a `step` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub observation: Observation,
    pub reward: f64,
    /// The day range is exhausted; repeat `step` calls are no-ops.
    pub terminal: bool,
    /// Reserved for external time-limit wrappers; the environment itself
    /// never truncates.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Auxiliary step metadata. Intentionally empty: everything an agent may
/// condition on lives in the observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {}
