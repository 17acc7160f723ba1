use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currency amounts are integer units; this domain has no fractional
/// subunits.
pub type Money = i64;

/// Diagnosis produced by the suggestion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub name: String,
    pub confidence: f64,
    pub description: String,
}

/// One consultation run. Created when the intake step completes and
/// read-only afterward; lives only in the wizard context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationSession {
    pub id: String,
    pub primary_diagnosis: Diagnosis,
    pub severity_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub in_stock: bool,
    /// Per-order quantity cap; None means unbounded.
    pub limit_quantity: Option<u32>,
    pub thumbnail: Option<String>,
}

/// Payload returned by the diagnosis/suggestion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub primary_diagnosis: Diagnosis,
    pub severity_level: String,
    pub recommended_medicines: Vec<Medicine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    /// At most one default per user, enforced by the remote address
    /// service, not locally.
    pub is_default: bool,
}

/// Fields needed to register a new address; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
    CreditCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub medicine_id: String,
    pub quantity: u32,
    /// Price captured at add time; totals are computed from this, not the
    /// live catalog price.
    pub price_snapshot: Money,
}

/// Cart as returned by the cart backend after a mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub address_id: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<CartItem>,
    pub grand_total: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

/// Derived 1:1 from an order; immutable once issued except for the
/// admin-editable status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub order_id: String,
    pub status: InvoiceStatus,
    pub grand_total: Money,
    pub issued_at: DateTime<Utc>,
}

// Context keys shared by the wizard steps. Each key has a single writer
// step.
pub mod session_keys {
    pub const USER_INPUT: &str = "user_input";
    pub const SYMPTOMS: &str = "symptoms";
    pub const CONSULTATION_ID: &str = "consultation_id";
    pub const CONSULTATION: &str = "consultation";
    pub const RECOMMENDED_MEDICINES: &str = "recommended_medicines";
    pub const SELECTED_MEDICINES: &str = "selected_medicines";
    pub const ADDRESSES: &str = "addresses";
    pub const SELECTED_ADDRESS_ID: &str = "selected_address_id";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const QUANTITIES: &str = "quantities";
    pub const CART_ITEMS: &str = "cart_items";
    pub const CART_TOTALS: &str = "cart_totals";
    pub const IS_SUBMITTING: &str = "is_submitting";
    pub const ORDER: &str = "order";
    pub const INVOICE: &str = "invoice";
    pub const FEEDBACK: &str = "feedback";
}
