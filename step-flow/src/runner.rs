//! WizardRunner – convenience wrapper that loads a session, applies exactly
//! **one** wizard command, and persists the updated session back to storage.
//!
//! Interactive services usually want to process one command per HTTP request,
//! send the step's message back to the client, and have the session saved for
//! the next roundtrip. `WizardRunner` makes that a one-liner; callers that
//! need custom persistence (batching, optimistic locking) can drive
//! [`Wizard`] and [`SessionStorage`] directly.

use std::sync::Arc;

use crate::{
    error::{FlowError, Result},
    storage::SessionStorage,
    wizard::{RunResult, Wizard, WizardStatus},
};

/// A navigation or execution command applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardCommand {
    /// Run the current step (entry side effects, user input handling).
    Run,
    /// Advance the cursor if the current step's validator permits, then run
    /// the newly entered step so its entry side effects fire.
    Next,
    /// Step back, clamped at the first step; collected data is preserved and
    /// the re-entered step is not re-run.
    Prev,
}

/// High-level helper orchestrating the _load → apply → save_ pattern.
#[derive(Clone)]
pub struct WizardRunner {
    wizard: Arc<Wizard>,
    storage: Arc<dyn SessionStorage>,
}

impl WizardRunner {
    pub fn new(wizard: Arc<Wizard>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { wizard, storage }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    /// Apply one command to the given session and persist the result.
    ///
    /// A completed run ([`WizardStatus::Completed`]) deletes the session:
    /// the consultation and selection set exist only for one wizard run.
    pub async fn apply(&self, session_id: &str, command: WizardCommand) -> Result<AppliedResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let result = match command {
            WizardCommand::Run => self.wizard.run_current(&mut session).await?,
            WizardCommand::Next => {
                if self.wizard.advance(&mut session)? {
                    self.wizard.run_current(&mut session).await?
                } else {
                    RunResult {
                        message: session.status_message.clone(),
                        status: WizardStatus::WaitingForInput,
                    }
                }
            }
            WizardCommand::Prev => {
                self.wizard.back(&mut session)?;
                RunResult {
                    message: session.status_message.clone(),
                    status: WizardStatus::WaitingForInput,
                }
            }
        };

        let current_step_id = session.current_step_id.clone();

        match result.status {
            WizardStatus::Completed => {
                self.storage.delete(&session.id).await?;
            }
            WizardStatus::WaitingForInput => {
                self.storage.save(session).await?;
            }
        }

        Ok(AppliedResult {
            current_step_id,
            message: result.message,
            status: result.status,
        })
    }
}

/// Outcome of [`WizardRunner::apply`], with the cursor position after the
/// command.
#[derive(Debug, Clone)]
pub struct AppliedResult {
    pub current_step_id: String,
    pub message: Option<String>,
    pub status: WizardStatus,
}
