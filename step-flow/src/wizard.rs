use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{FlowError, Result},
    step::{Step, StepOutcome, StepResult},
    storage::Session,
};

/// A linear wizard: an ordered list of steps and a validator-gated cursor.
///
/// The cursor lives in the [`Session`] (`current_step_id`); the wizard is the
/// only mutator of it. Forward navigation is gated on the current step's
/// validator and clamped at the last step; backward navigation is clamped at
/// the first step and never touches the context, so re-entering a later step
/// resumes from previously collected data.
pub struct Wizard {
    pub id: String,
    steps: Vec<Arc<dyn Step>>,
}

impl Wizard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step to the end of the flow.
    pub fn add_step(&mut self, step: Arc<dyn Step>) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn first_step_id(&self) -> Option<&str> {
        self.steps.first().map(|s| s.id())
    }

    pub fn step(&self, step_id: &str) -> Option<Arc<dyn Step>> {
        self.steps.iter().find(|s| s.id() == step_id).cloned()
    }

    fn index_of(&self, step_id: &str) -> Result<usize> {
        self.steps
            .iter()
            .position(|s| s.id() == step_id)
            .ok_or_else(|| FlowError::StepNotFound(step_id.to_string()))
    }

    /// Execute the current step once and apply its requested outcome.
    pub async fn run_current(&self, session: &mut Session) -> Result<RunResult> {
        let step = self
            .step(&session.current_step_id)
            .ok_or_else(|| FlowError::StepNotFound(session.current_step_id.clone()))?;

        let StepResult { message, outcome } = step.run(session.context.clone()).await?;
        session.status_message = message.clone();

        match outcome {
            StepOutcome::Stay => Ok(RunResult {
                message,
                status: WizardStatus::WaitingForInput,
            }),
            StepOutcome::AdvanceRequested => {
                // Entering a step fires its entry side effects, so run the
                // newly entered step too (the entered step decides whether
                // to cascade further).
                if self.advance(session)? {
                    return Box::pin(self.run_current(session)).await;
                }
                Ok(RunResult {
                    message,
                    status: WizardStatus::WaitingForInput,
                })
            }
            StepOutcome::End => Ok(RunResult {
                message,
                status: WizardStatus::Completed,
            }),
        }
    }

    /// Move the cursor forward by one, clamped at the last step.
    ///
    /// Returns false (cursor unchanged) when the current step's validator
    /// rejects, or when the cursor is already on the last step.
    pub fn advance(&self, session: &mut Session) -> Result<bool> {
        let idx = self.index_of(&session.current_step_id)?;
        let step = &self.steps[idx];

        if !step.is_complete(&session.context) {
            debug!(wizard = %self.id, step = %step.id(), "advance blocked by validator");
            return Ok(false);
        }
        if idx + 1 >= self.steps.len() {
            return Ok(false);
        }

        session.current_step_id = self.steps[idx + 1].id().to_string();
        debug!(wizard = %self.id, step = %session.current_step_id, "advanced");
        Ok(true)
    }

    /// Move the cursor back by one, clamped at the first step. Collected
    /// data is preserved.
    pub fn back(&self, session: &mut Session) -> Result<bool> {
        let idx = self.index_of(&session.current_step_id)?;
        if idx == 0 {
            return Ok(false);
        }

        session.current_step_id = self.steps[idx - 1].id().to_string();
        debug!(wizard = %self.id, step = %session.current_step_id, "went back");
        Ok(true)
    }

    /// Whether the current step's validator permits leaving it.
    pub fn current_is_complete(&self, session: &Session) -> Result<bool> {
        let idx = self.index_of(&session.current_step_id)?;
        Ok(self.steps[idx].is_complete(&session.context))
    }
}

/// Builder mirroring the construction order of the flow.
pub struct WizardBuilder {
    wizard: Wizard,
}

impl WizardBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            wizard: Wizard::new(id),
        }
    }

    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        self.wizard.add_step(step);
        self
    }

    pub fn build(self) -> Wizard {
        self.wizard
    }
}

/// Result of one `run_current` roundtrip.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub message: Option<String>,
    pub status: WizardStatus,
}

#[derive(Debug, Clone)]
pub enum WizardStatus {
    /// Waiting for user input to continue
    WaitingForInput,
    /// Wizard completed successfully
    Completed,
}
