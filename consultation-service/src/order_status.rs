//! Allow-list over [`OrderStatus`] used to pre-filter which admin actions
//! are offered. The server stays authoritative for the actual transition;
//! this is advisory visibility only.

use serde::{Deserialize, Serialize};

use crate::models::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// PENDING -> PROCESSING
    Confirm,
    /// PROCESSING or SHIPPED -> COMPLETED
    Complete,
    /// any non-terminal state -> CANCELLED
    Cancel,
}

impl OrderAction {
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Confirm => OrderStatus::Processing,
            OrderAction::Complete => OrderStatus::Completed,
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

pub fn can_confirm(status: OrderStatus) -> bool {
    status == OrderStatus::Pending
}

pub fn can_complete(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Processing | OrderStatus::Shipped)
}

pub fn can_cancel(status: OrderStatus) -> bool {
    !matches!(
        status,
        OrderStatus::Cancelled | OrderStatus::Delivered | OrderStatus::Completed
    )
}

/// The actions an admin surface should offer for an order in this status.
pub fn available_actions(status: OrderStatus) -> Vec<OrderAction> {
    let mut actions = Vec::new();
    if can_confirm(status) {
        actions.push(OrderAction::Confirm);
    }
    if can_complete(status) {
        actions.push(OrderAction::Complete);
    }
    if can_cancel(status) {
        actions.push(OrderAction::Cancel);
    }
    actions
}
