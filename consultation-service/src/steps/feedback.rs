use async_trait::async_trait;
use step_flow::{Context, Result, Step, StepOutcome, StepResult};
use tracing::info;

use crate::models::session_keys;

pub const STEP_ID: &str = "feedback";

/// Feedback (S5), the terminal step. Recording feedback ends the wizard
/// run; the session (consultation and selection set) is discarded by the
/// runner afterwards.
pub struct FeedbackStep;

#[async_trait]
impl Step for FeedbackStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn run(&self, ctx: Context) -> Result<StepResult> {
        let feedback: Option<String> = ctx.get(session_keys::USER_INPUT).await;

        match feedback.filter(|f| !f.trim().is_empty()) {
            Some(feedback) => {
                info!(length = feedback.len(), "feedback recorded");
                ctx.set(session_keys::FEEDBACK, feedback).await;
                Ok(StepResult::new(
                    Some("Thank you for your feedback".to_string()),
                    StepOutcome::End,
                ))
            }
            None => Ok(StepResult::stay(
                "Your order is on its way. Leave feedback to finish, or go back to review it",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feedback_ends_the_wizard() {
        let ctx = Context::new();
        ctx.set(session_keys::USER_INPUT, "quick and helpful").await;

        let result = FeedbackStep.run(ctx.clone()).await.unwrap();
        assert!(matches!(result.outcome, StepOutcome::End));
        assert_eq!(
            ctx.get::<String>(session_keys::FEEDBACK).await,
            Some("quick and helpful".into())
        );
    }

    #[tokio::test]
    async fn no_feedback_keeps_waiting() {
        let ctx = Context::new();
        let result = FeedbackStep.run(ctx.clone()).await.unwrap();
        assert!(matches!(result.outcome, StepOutcome::Stay));
    }
}
