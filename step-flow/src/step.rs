use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// Result of running a step once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Message to surface to the user (inline validation hint, confirmation,
    /// transient error).
    pub message: Option<String>,
    /// What the step wants to happen next.
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn new(message: Option<String>, outcome: StepOutcome) -> Self {
        Self { message, outcome }
    }

    pub fn stay(message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), StepOutcome::Stay)
    }
}

/// What should happen after a step's `run` returns.
///
/// The wizard owns the cursor; a step can only request movement, and an
/// `AdvanceRequested` still goes through the step's validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Remain on the current step and wait for further user action.
    Stay,
    /// Ask the wizard to advance to the next step (validator permitting).
    AdvanceRequested,
    /// The wizard run is complete; the session can be discarded.
    End,
}

/// One step of a wizard. Implementations read and write the shared
/// [`Context`] and perform the step's remote side effects in `run`.
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique identifier for this step.
    fn id(&self) -> &str;

    /// Validator gating forward navigation out of this step. Steps with no
    /// completion requirement keep the default.
    fn is_complete(&self, _ctx: &Context) -> bool {
        true
    }

    /// Execute the step against the shared context.
    async fn run(&self, ctx: Context) -> Result<StepResult>;
}
