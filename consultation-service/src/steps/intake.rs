use async_trait::async_trait;
use step_flow::{Context, Result, Step, StepOutcome, StepResult};
use tracing::info;
use uuid::Uuid;

use crate::models::session_keys;

pub const STEP_ID: &str = "intake";

/// Symptom intake (S0). Records the symptom description and mints the
/// consultation id the suggestion backend is keyed by.
pub struct IntakeStep;

#[async_trait]
impl Step for IntakeStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn run(&self, ctx: Context) -> Result<StepResult> {
        let symptoms: Option<String> = ctx.get(session_keys::USER_INPUT).await;

        let symptoms = match symptoms.filter(|s| !s.trim().is_empty()) {
            Some(s) => s,
            None => {
                return Ok(StepResult::stay(
                    "Describe your symptoms to start the consultation",
                ));
            }
        };

        ctx.set(session_keys::SYMPTOMS, symptoms.clone()).await;

        // One consultation per wizard run; re-running intake keeps the id
        if ctx.get::<String>(session_keys::CONSULTATION_ID).await.is_none() {
            let consultation_id = Uuid::new_v4().to_string();
            info!(consultation_id = %consultation_id, "consultation created");
            ctx.set(session_keys::CONSULTATION_ID, consultation_id).await;
        }

        Ok(StepResult::new(
            Some("Symptoms recorded".to_string()),
            StepOutcome::AdvanceRequested,
        ))
    }
}
