use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use step_flow::{Context, Result, Step, StepOutcome, StepResult};
use tracing::warn;

use crate::api::AddressApi;
use crate::models::{NewAddress, PaymentMethod, ShippingAddress, session_keys};

pub const STEP_ID: &str = "order_info";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OrderInfoInput {
    SelectAddress { address_id: String },
    SelectPayment { method: PaymentMethod },
    AddAddress(NewAddress),
    DeleteAddress { address_id: String },
    SetDefaultAddress { address_id: String },
}

/// Order info collection (S2): shipping address and payment method. The
/// step owns the cached address list and both selection fields; leaving it
/// requires an address and a payment method.
pub struct OrderInfoStep {
    addresses: Arc<dyn AddressApi>,
}

impl OrderInfoStep {
    pub fn new(addresses: Arc<dyn AddressApi>) -> Self {
        Self { addresses }
    }

    /// Replace the cached list and drop a selected address that no longer
    /// exists remotely.
    async fn store_addresses(&self, ctx: &Context, addresses: Vec<ShippingAddress>) {
        if let Some(selected) = ctx.get_sync::<String>(session_keys::SELECTED_ADDRESS_ID) {
            if !addresses.iter().any(|a| a.id == selected) {
                ctx.remove(session_keys::SELECTED_ADDRESS_ID).await;
            }
        }
        ctx.set(session_keys::ADDRESSES, addresses).await;
    }
}

#[async_trait]
impl Step for OrderInfoStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    /// S2 is complete iff an address and a payment method are both selected.
    fn is_complete(&self, ctx: &Context) -> bool {
        ctx.get_sync::<String>(session_keys::SELECTED_ADDRESS_ID)
            .is_some()
            && ctx
                .get_sync::<PaymentMethod>(session_keys::PAYMENT_METHOD)
                .is_some()
    }

    async fn run(&self, ctx: Context) -> Result<StepResult> {
        // Cache-invalidation model: fetch once on entry, replace the cache
        // after every mutation from the list the backend returns.
        if ctx
            .get::<Vec<ShippingAddress>>(session_keys::ADDRESSES)
            .await
            .is_none()
        {
            match self.addresses.list().await {
                Ok(addresses) => self.store_addresses(&ctx, addresses).await,
                Err(e) => {
                    warn!(error = %e, "address list fetch failed");
                    return Ok(StepResult::stay(format!(
                        "Could not load your addresses, please retry: {e}"
                    )));
                }
            }
        }

        if let Some(input) = ctx.get::<OrderInfoInput>(session_keys::USER_INPUT).await {
            match input {
                OrderInfoInput::SelectAddress { address_id } => {
                    let known: Vec<ShippingAddress> =
                        ctx.get(session_keys::ADDRESSES).await.unwrap_or_default();
                    if !known.iter().any(|a| a.id == address_id) {
                        return Ok(StepResult::stay(format!("Unknown address {address_id}")));
                    }
                    ctx.set(session_keys::SELECTED_ADDRESS_ID, address_id).await;
                }
                OrderInfoInput::SelectPayment { method } => {
                    // exactly one active payment method; selecting replaces
                    ctx.set(session_keys::PAYMENT_METHOD, method).await;
                }
                OrderInfoInput::AddAddress(new_address) => {
                    match self.addresses.add(new_address).await {
                        Ok(addresses) => self.store_addresses(&ctx, addresses).await,
                        Err(e) => {
                            return Ok(StepResult::stay(format!(
                                "Could not save the address, please retry: {e}"
                            )));
                        }
                    }
                }
                OrderInfoInput::DeleteAddress { address_id } => {
                    match self.addresses.delete(&address_id).await {
                        Ok(addresses) => self.store_addresses(&ctx, addresses).await,
                        Err(e) => {
                            return Ok(StepResult::stay(format!(
                                "Could not delete the address, please retry: {e}"
                            )));
                        }
                    }
                }
                OrderInfoInput::SetDefaultAddress { address_id } => {
                    // at-most-one-default is the backend's invariant; we
                    // just reflect the list it returns
                    match self.addresses.set_default(&address_id).await {
                        Ok(addresses) => self.store_addresses(&ctx, addresses).await,
                        Err(e) => {
                            return Ok(StepResult::stay(format!(
                                "Could not update the default address, please retry: {e}"
                            )));
                        }
                    }
                }
            }
        }

        if self.is_complete(&ctx) {
            Ok(StepResult::new(
                Some("Shipping address and payment method selected".to_string()),
                StepOutcome::Stay,
            ))
        } else {
            Ok(StepResult::stay(
                "Select a shipping address and a payment method to continue",
            ))
        }
    }
}
