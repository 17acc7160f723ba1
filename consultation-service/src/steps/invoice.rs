use async_trait::async_trait;
use std::sync::Arc;
use step_flow::{Context, Result, Step, StepResult};
use tracing::warn;

use crate::api::InvoiceApi;
use crate::models::{Invoice, Order, session_keys};

pub const STEP_ID: &str = "invoice";

/// Invoice confirmation (S4). Informational: fetches the invoice derived
/// from the placed order, once, and has no blocking validator.
pub struct InvoiceStep {
    invoices: Arc<dyn InvoiceApi>,
}

impl InvoiceStep {
    pub fn new(invoices: Arc<dyn InvoiceApi>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl Step for InvoiceStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn run(&self, ctx: Context) -> Result<StepResult> {
        let order: Order = match ctx.get(session_keys::ORDER).await {
            Some(order) => order,
            None => return Ok(StepResult::stay("No order has been placed yet")),
        };

        if ctx.get::<Invoice>(session_keys::INVOICE).await.is_none() {
            match self.invoices.get_by_order_id(&order.id).await {
                Ok(invoice) => ctx.set(session_keys::INVOICE, invoice).await,
                Err(e) => {
                    warn!(error = %e, order_id = %order.id, "invoice fetch failed");
                    return Ok(StepResult::stay(format!(
                        "Could not fetch the invoice, please retry: {e}"
                    )));
                }
            }
        }

        let invoice: Invoice = ctx.get(session_keys::INVOICE).await.ok_or_else(|| {
            step_flow::FlowError::ContextError("invoice missing after fetch".to_string())
        })?;

        Ok(StepResult::stay(format!(
            "Invoice {} for order {}: {:?}, total {}",
            invoice.id, invoice.order_id, invoice.status, invoice.grand_total,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{CountingOrderApi, StubInvoiceApi};
    use crate::api::OrderApi;
    use crate::models::PaymentMethod;

    #[tokio::test]
    async fn fetches_the_invoice_for_the_placed_order() {
        let ctx = Context::new();
        let order = CountingOrderApi::default()
            .place_order("addr_1", PaymentMethod::Cod, &[])
            .await
            .unwrap();
        ctx.set(session_keys::ORDER, order).await;

        let step = InvoiceStep::new(Arc::new(StubInvoiceApi));
        step.run(ctx.clone()).await.unwrap();

        let invoice: Invoice = ctx.get(session_keys::INVOICE).await.unwrap();
        assert_eq!(invoice.order_id, "order_1");
    }

    #[tokio::test]
    async fn without_an_order_it_only_reports() {
        let ctx = Context::new();
        let step = InvoiceStep::new(Arc::new(StubInvoiceApi));
        let result = step.run(ctx.clone()).await.unwrap();

        assert!(result.message.unwrap().contains("No order"));
        assert!(ctx.get::<Invoice>(session_keys::INVOICE).await.is_none());
    }
}
