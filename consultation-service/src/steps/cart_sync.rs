use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use step_flow::{Context, Result, Step, StepOutcome, StepResult};
use tracing::{info, warn};

use crate::api::{CartApi, OrderApi};
use crate::cart::{compute_totals, validate_quantity};
use crate::models::{CartItem, Medicine, Order, PaymentMethod, session_keys};

pub const STEP_ID: &str = "cart_sync";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CartSyncInput {
    SetQuantities { quantities: HashMap<String, u32> },
    PlaceOrder,
}

/// Cart population and order placement (S3).
///
/// Entering the step previews the cart from the current selections; the
/// user then submits once. The place-order call resolves fully, success or
/// failure, before the wizard can leave the step: the `is_submitting` flag
/// blocks both a second call and forward navigation while a submission is
/// in flight.
pub struct CartSyncStep {
    cart: Arc<dyn CartApi>,
    orders: Arc<dyn OrderApi>,
}

impl CartSyncStep {
    pub fn new(cart: Arc<dyn CartApi>, orders: Arc<dyn OrderApi>) -> Self {
        Self { cart, orders }
    }

    /// Rebuild the cart items from the selection set, quantities, and the
    /// recommended-medicine catalog. Totals are never cached; every call
    /// recomputes from scratch.
    async fn build_items(&self, ctx: &Context) -> std::result::Result<Vec<CartItem>, String> {
        let selected: Vec<String> = ctx
            .get(session_keys::SELECTED_MEDICINES)
            .await
            .unwrap_or_default();
        let catalog: Vec<Medicine> = ctx
            .get(session_keys::RECOMMENDED_MEDICINES)
            .await
            .unwrap_or_default();
        let quantities: HashMap<String, u32> =
            ctx.get(session_keys::QUANTITIES).await.unwrap_or_default();

        let mut items = Vec::with_capacity(selected.len());
        for medicine_id in &selected {
            let medicine = catalog
                .iter()
                .find(|m| m.id == *medicine_id)
                .ok_or_else(|| format!("{medicine_id} is not in the recommended catalog"))?;

            if !medicine.in_stock {
                return Err(format!("{} is out of stock", medicine.name));
            }

            let quantity = quantities.get(medicine_id).copied().unwrap_or(1);
            validate_quantity(medicine, quantity).map_err(|e| e.to_string())?;

            items.push(CartItem {
                medicine_id: medicine_id.clone(),
                quantity,
                price_snapshot: medicine.price,
            });
        }
        Ok(items)
    }

    async fn preview(&self, ctx: &Context) -> Result<StepResult> {
        match self.build_items(ctx).await {
            Ok(items) => {
                let totals = compute_totals(&items);
                ctx.set(session_keys::CART_ITEMS, &items).await;
                ctx.set(session_keys::CART_TOTALS, &totals).await;
                Ok(StepResult::stay(format!(
                    "Cart ready: {} items, subtotal {}, shipping {}, tax {}, total {}",
                    items.len(),
                    totals.sub_total,
                    totals.shipping_cost,
                    totals.tax,
                    totals.grand_total,
                )))
            }
            Err(message) => Ok(StepResult::stay(message)),
        }
    }

    async fn submit(&self, ctx: &Context) -> Result<StepResult> {
        // Duplicate submissions are prevented proactively, not handled
        // after the fact.
        if ctx
            .get::<bool>(session_keys::IS_SUBMITTING)
            .await
            .unwrap_or(false)
        {
            return Ok(StepResult::stay("Order submission already in progress"));
        }
        if ctx.get::<Order>(session_keys::ORDER).await.is_some() {
            return Ok(StepResult::new(
                Some("Order already placed".to_string()),
                StepOutcome::AdvanceRequested,
            ));
        }

        let address_id: String = match ctx.get(session_keys::SELECTED_ADDRESS_ID).await {
            Some(id) => id,
            None => return Ok(StepResult::stay("Select a shipping address first")),
        };
        let payment_method: PaymentMethod = match ctx.get(session_keys::PAYMENT_METHOD).await {
            Some(m) => m,
            None => return Ok(StepResult::stay("Select a payment method first")),
        };

        let items = match self.build_items(ctx).await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => return Ok(StepResult::stay("The cart is empty")),
            Err(message) => return Ok(StepResult::stay(message)),
        };

        ctx.set(session_keys::IS_SUBMITTING, true).await;

        for item in &items {
            if let Err(e) = self.cart.add_item(&item.medicine_id, item.quantity).await {
                warn!(error = %e, medicine_id = %item.medicine_id, "add-to-cart failed");
                ctx.set(session_keys::IS_SUBMITTING, false).await;
                return Ok(StepResult::stay(format!(
                    "Could not sync the cart, please retry: {e}"
                )));
            }
        }

        let totals = compute_totals(&items);
        ctx.set(session_keys::CART_ITEMS, &items).await;
        ctx.set(session_keys::CART_TOTALS, &totals).await;

        let placed = self
            .orders
            .place_order(&address_id, payment_method, &items)
            .await;
        ctx.set(session_keys::IS_SUBMITTING, false).await;

        match placed {
            Ok(order) => {
                info!(order_id = %order.id, grand_total = order.grand_total, "order placed");
                ctx.set(session_keys::ORDER, &order).await;
                Ok(StepResult::new(
                    Some(format!("Order {} placed", order.id)),
                    StepOutcome::AdvanceRequested,
                ))
            }
            Err(e) => {
                warn!(error = %e, "place-order failed");
                Ok(StepResult::stay(format!(
                    "Could not place the order, please retry: {e}"
                )))
            }
        }
    }
}

#[async_trait]
impl Step for CartSyncStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    /// S3 is complete iff the order was placed and no submission is
    /// pending.
    fn is_complete(&self, ctx: &Context) -> bool {
        let submitting = ctx
            .get_sync::<bool>(session_keys::IS_SUBMITTING)
            .unwrap_or(false);
        !submitting && ctx.get_sync::<Order>(session_keys::ORDER).is_some()
    }

    async fn run(&self, ctx: Context) -> Result<StepResult> {
        match ctx.get::<CartSyncInput>(session_keys::USER_INPUT).await {
            Some(CartSyncInput::SetQuantities { quantities }) => {
                ctx.set(session_keys::QUANTITIES, quantities).await;
                self.preview(&ctx).await
            }
            Some(CartSyncInput::PlaceOrder) => self.submit(&ctx).await,
            None => self.preview(&ctx).await,
        }
    }
}
