use std::sync::Arc;

use step_flow::{Session, SessionStorage, Wizard, WizardBuilder, WizardRunner};

use crate::api::{AddressApi, CartApi, DiagnosisApi, InvoiceApi, OrderApi};
use crate::steps::{
    CartSyncStep, FeedbackStep, IntakeStep, InvoiceStep, OrderInfoStep, SuggestionStep,
};

/// The five backend collaborators the wizard steps call out to.
#[derive(Clone)]
pub struct BackendClients {
    pub diagnosis: Arc<dyn DiagnosisApi>,
    pub addresses: Arc<dyn AddressApi>,
    pub cart: Arc<dyn CartApi>,
    pub orders: Arc<dyn OrderApi>,
    pub invoices: Arc<dyn InvoiceApi>,
}

/// Intake → Suggestion → OrderInfo → CartSync → Invoice → Feedback.
pub fn build_consultation_wizard(clients: &BackendClients) -> Wizard {
    WizardBuilder::new("pharmacy_consultation")
        .add_step(Arc::new(IntakeStep))
        .add_step(Arc::new(SuggestionStep::new(clients.diagnosis.clone())))
        .add_step(Arc::new(OrderInfoStep::new(clients.addresses.clone())))
        .add_step(Arc::new(CartSyncStep::new(
            clients.cart.clone(),
            clients.orders.clone(),
        )))
        .add_step(Arc::new(InvoiceStep::new(clients.invoices.clone())))
        .add_step(Arc::new(FeedbackStep))
        .build()
}

/// Fresh session positioned on the intake step.
pub fn create_consultation_session(session_id: String) -> Session {
    Session::new_from_step(session_id, crate::steps::intake::STEP_ID)
}

pub fn create_runner(clients: &BackendClients, storage: Arc<dyn SessionStorage>) -> WizardRunner {
    WizardRunner::new(Arc::new(build_consultation_wizard(clients)), storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{
        CountingOrderApi, StubAddressApi, StubCartApi, StubDiagnosisApi, StubInvoiceApi,
        sample_medicine,
    };
    use crate::models::session_keys;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use step_flow::{InMemorySessionStorage, WizardCommand, WizardStatus};

    struct Harness {
        runner: WizardRunner,
        storage: Arc<dyn SessionStorage>,
        diagnosis: Arc<StubDiagnosisApi>,
        orders: Arc<CountingOrderApi>,
    }

    impl Harness {
        fn new() -> Self {
            let diagnosis = Arc::new(StubDiagnosisApi::new(vec![
                sample_medicine("med_1", 150_000),
                sample_medicine("med_2", 80_000),
            ]));
            let orders = Arc::new(CountingOrderApi::default());
            let clients = BackendClients {
                diagnosis: diagnosis.clone(),
                addresses: Arc::new(StubAddressApi::with_one_address()),
                cart: Arc::new(StubCartApi::default()),
                orders: orders.clone(),
                invoices: Arc::new(StubInvoiceApi),
            };
            let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
            Self {
                runner: create_runner(&clients, storage.clone()),
                storage,
                diagnosis,
                orders,
            }
        }

        async fn start(&self) -> String {
            let session = create_consultation_session("session_1".to_string());
            let id = session.id.clone();
            self.storage.save(session).await.unwrap();
            id
        }

        async fn send(&self, session_id: &str, input: serde_json::Value) {
            let session = self.storage.get(session_id).await.unwrap().unwrap();
            session.context.set(session_keys::USER_INPUT, input).await;
            self.storage.save(session).await.unwrap();
        }

        async fn clear_input(&self, session_id: &str) {
            let session = self.storage.get(session_id).await.unwrap().unwrap();
            session.context.remove(session_keys::USER_INPUT).await;
            self.storage.save(session).await.unwrap();
        }
    }

    #[tokio::test]
    async fn full_happy_path() {
        let h = Harness::new();
        let sid = h.start().await;

        // S0: symptoms advance straight into the suggestion fetch
        h.send(&sid, json!("sneezing and itchy eyes")).await;
        let applied = h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        assert_eq!(applied.current_step_id, "suggestion");
        assert_eq!(h.diagnosis.calls.load(Ordering::SeqCst), 1);

        // S1: blocked until a medicine is selected
        h.clear_input(&sid).await;
        let applied = h.runner.apply(&sid, WizardCommand::Next).await.unwrap();
        assert_eq!(applied.current_step_id, "suggestion");

        h.send(&sid, json!({"toggle": "med_1"})).await;
        h.runner.apply(&sid, WizardCommand::Run).await.unwrap();

        h.clear_input(&sid).await;
        let applied = h.runner.apply(&sid, WizardCommand::Next).await.unwrap();
        assert_eq!(applied.current_step_id, "order_info");

        // S2: address and payment
        h.send(&sid, json!({"select_address": {"address_id": "addr_1"}}))
            .await;
        h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        h.send(&sid, json!({"select_payment": {"method": "COD"}}))
            .await;
        h.runner.apply(&sid, WizardCommand::Run).await.unwrap();

        h.clear_input(&sid).await;
        let applied = h.runner.apply(&sid, WizardCommand::Next).await.unwrap();
        assert_eq!(applied.current_step_id, "cart_sync");

        // S3: one submit, which rolls forward into the invoice fetch
        h.send(&sid, json!("place_order")).await;
        let applied = h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        assert_eq!(applied.current_step_id, "invoice");
        assert_eq!(h.orders.place_order_calls.load(Ordering::SeqCst), 1);

        h.clear_input(&sid).await;
        let applied = h.runner.apply(&sid, WizardCommand::Next).await.unwrap();
        assert_eq!(applied.current_step_id, "feedback");

        // S5: feedback completes the run and discards the session
        h.send(&sid, json!("quick and helpful")).await;
        let applied = h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        assert!(matches!(applied.status, WizardStatus::Completed));
        assert!(h.storage.get(&sid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn back_navigation_resumes_previous_selections() {
        let h = Harness::new();
        let sid = h.start().await;

        h.send(&sid, json!("headache")).await;
        h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        h.send(&sid, json!({"toggle": "med_2"})).await;
        h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        h.clear_input(&sid).await;
        h.runner.apply(&sid, WizardCommand::Next).await.unwrap();

        // back to the suggestion step and forward again
        let applied = h.runner.apply(&sid, WizardCommand::Prev).await.unwrap();
        assert_eq!(applied.current_step_id, "suggestion");

        let session = h.storage.get(&sid).await.unwrap().unwrap();
        let selected: Vec<String> = session
            .context
            .get(session_keys::SELECTED_MEDICINES)
            .await
            .unwrap();
        assert_eq!(selected, vec!["med_2"]);

        // the suggestion is not re-fetched on re-entry
        h.runner.apply(&sid, WizardCommand::Run).await.unwrap();
        assert_eq!(h.diagnosis.calls.load(Ordering::SeqCst), 1);

        let applied = h.runner.apply(&sid, WizardCommand::Next).await.unwrap();
        assert_eq!(applied.current_step_id, "order_info");
    }

    #[tokio::test]
    async fn prev_clamps_at_intake() {
        let h = Harness::new();
        let sid = h.start().await;

        let applied = h.runner.apply(&sid, WizardCommand::Prev).await.unwrap();
        assert_eq!(applied.current_step_id, "intake");
    }
}
