use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use step_flow::{Context, Result, Step, StepOutcome, StepResult};
use tracing::{info, warn};

use crate::api::DiagnosisApi;
use crate::models::{ConsultationSession, Medicine, session_keys};
use crate::selection::toggle_membership;

pub const STEP_ID: &str = "suggestion";

#[derive(Debug, Deserialize)]
struct SuggestionInput {
    /// Medicine id whose selection membership to flip.
    toggle: String,
}

/// AI diagnosis and medicine suggestion (S1).
///
/// Entering the step fetches the suggestion keyed by the consultation id —
/// once; re-entry after back navigation reuses the stored result. The user
/// then toggles medicines in and out of the selection set; at least one
/// selection is required to leave the step.
pub struct SuggestionStep {
    diagnosis: Arc<dyn DiagnosisApi>,
}

impl SuggestionStep {
    pub fn new(diagnosis: Arc<dyn DiagnosisApi>) -> Self {
        Self { diagnosis }
    }

    async fn ensure_suggestion(&self, ctx: &Context) -> Result<Option<String>> {
        if ctx
            .get::<ConsultationSession>(session_keys::CONSULTATION)
            .await
            .is_some()
        {
            return Ok(None);
        }

        let consultation_id: String = match ctx.get(session_keys::CONSULTATION_ID).await {
            Some(id) => id,
            None => return Ok(Some("Complete the symptom intake first".to_string())),
        };

        match self.diagnosis.get_suggestion(&consultation_id).await {
            Ok(suggestion) => {
                info!(
                    consultation_id = %consultation_id,
                    diagnosis = %suggestion.primary_diagnosis.name,
                    medicines = suggestion.recommended_medicines.len(),
                    "suggestion fetched"
                );
                ctx.set(
                    session_keys::CONSULTATION,
                    ConsultationSession {
                        id: consultation_id,
                        primary_diagnosis: suggestion.primary_diagnosis,
                        severity_level: suggestion.severity_level,
                    },
                )
                .await;
                ctx.set(
                    session_keys::RECOMMENDED_MEDICINES,
                    suggestion.recommended_medicines,
                )
                .await;
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "suggestion fetch failed");
                Ok(Some(format!(
                    "Could not fetch the diagnosis suggestion, please retry: {e}"
                )))
            }
        }
    }
}

#[async_trait]
impl Step for SuggestionStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    /// S1 is complete once at least one medicine is selected.
    fn is_complete(&self, ctx: &Context) -> bool {
        ctx.get_sync::<Vec<String>>(session_keys::SELECTED_MEDICINES)
            .map(|selected| !selected.is_empty())
            .unwrap_or(false)
    }

    async fn run(&self, ctx: Context) -> Result<StepResult> {
        if let Some(transient) = self.ensure_suggestion(&ctx).await? {
            return Ok(StepResult::stay(transient));
        }

        let recommended: Vec<Medicine> = ctx
            .get(session_keys::RECOMMENDED_MEDICINES)
            .await
            .unwrap_or_default();

        if let Some(SuggestionInput { toggle }) = ctx.get(session_keys::USER_INPUT).await {
            if !recommended.iter().any(|m| m.id == toggle) {
                return Ok(StepResult::stay(format!(
                    "{toggle} is not one of the recommended medicines"
                )));
            }

            let mut selected: Vec<String> = ctx
                .get(session_keys::SELECTED_MEDICINES)
                .await
                .unwrap_or_default();
            toggle_membership(&mut selected, toggle);
            ctx.set(session_keys::SELECTED_MEDICINES, &selected).await;
        }

        let selected: Vec<String> = ctx
            .get(session_keys::SELECTED_MEDICINES)
            .await
            .unwrap_or_default();
        let consultation: ConsultationSession =
            ctx.get(session_keys::CONSULTATION).await.ok_or_else(|| {
                step_flow::FlowError::ContextError("consultation missing after fetch".to_string())
            })?;

        Ok(StepResult::stay(format!(
            "Diagnosis: {} (severity {}). {} of {} recommended medicines selected",
            consultation.primary_diagnosis.name,
            consultation.severity_level,
            selected.len(),
            recommended.len(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{StubDiagnosisApi, sample_medicine};
    use std::sync::atomic::Ordering;

    fn step_with_stub() -> (SuggestionStep, Arc<StubDiagnosisApi>) {
        let stub = Arc::new(StubDiagnosisApi::new(vec![
            sample_medicine("med_1", 150_000),
            sample_medicine("med_2", 80_000),
        ]));
        (SuggestionStep::new(stub.clone()), stub)
    }

    async fn seeded_context() -> Context {
        let ctx = Context::new();
        ctx.set(session_keys::CONSULTATION_ID, "consult_1").await;
        ctx
    }

    #[tokio::test]
    async fn fetch_happens_once_across_reentry() {
        let (step, stub) = step_with_stub();
        let ctx = seeded_context().await;

        step.run(ctx.clone()).await.unwrap();
        step.run(ctx.clone()).await.unwrap();
        step.run(ctx.clone()).await.unwrap();

        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        let consultation: ConsultationSession =
            ctx.get(session_keys::CONSULTATION).await.unwrap();
        assert_eq!(consultation.id, "consult_1");
    }

    #[tokio::test]
    async fn toggle_selects_and_deselects() {
        let (step, _stub) = step_with_stub();
        let ctx = seeded_context().await;

        ctx.set(session_keys::USER_INPUT, serde_json::json!({"toggle": "med_1"}))
            .await;
        step.run(ctx.clone()).await.unwrap();
        assert!(step.is_complete(&ctx));

        step.run(ctx.clone()).await.unwrap();
        let selected: Vec<String> = ctx.get(session_keys::SELECTED_MEDICINES).await.unwrap();
        assert!(selected.is_empty());
        assert!(!step.is_complete(&ctx));
    }

    #[tokio::test]
    async fn unknown_medicine_is_rejected() {
        let (step, _stub) = step_with_stub();
        let ctx = seeded_context().await;

        ctx.set(
            session_keys::USER_INPUT,
            serde_json::json!({"toggle": "med_999"}),
        )
        .await;
        step.run(ctx.clone()).await.unwrap();

        let selected: Vec<String> = ctx
            .get(session_keys::SELECTED_MEDICINES)
            .await
            .unwrap_or_default();
        assert!(selected.is_empty());
    }

    #[tokio::test]
    async fn incomplete_without_selection() {
        let (step, _stub) = step_with_stub();
        let ctx = seeded_context().await;
        step.run(ctx.clone()).await.unwrap();
        assert!(!step.is_complete(&ctx));
    }
}
