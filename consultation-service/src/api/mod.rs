//! Client seam for the backend services. The wire format is owned by the
//! backend; these traits only describe the calls the wizard makes.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CartItem, CartSnapshot, Invoice, NewAddress, Order, OrderStatus, PaymentMethod,
    ShippingAddress, Suggestion,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned unexpected status {status} for {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Diagnosis/suggestion backend of the AI-assisted consultation.
#[async_trait]
pub trait DiagnosisApi: Send + Sync {
    async fn get_suggestion(&self, consultation_id: &str) -> ApiResult<Suggestion>;
}

/// Address book backend. Mutations return the updated list so the client
/// cache can be replaced wholesale.
#[async_trait]
pub trait AddressApi: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<ShippingAddress>>;
    async fn add(&self, address: NewAddress) -> ApiResult<Vec<ShippingAddress>>;
    async fn delete(&self, address_id: &str) -> ApiResult<Vec<ShippingAddress>>;
    async fn set_default(&self, address_id: &str) -> ApiResult<Vec<ShippingAddress>>;
}

#[async_trait]
pub trait CartApi: Send + Sync {
    async fn add_item(&self, medicine_id: &str, quantity: u32) -> ApiResult<CartSnapshot>;
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn place_order(
        &self,
        address_id: &str,
        payment_method: PaymentMethod,
        items: &[CartItem],
    ) -> ApiResult<Order>;

    async fn get_status(&self, order_id: &str) -> ApiResult<OrderStatus>;

    /// Request a transition; the server decides and the returned status is
    /// what the client reflects.
    async fn change_status(&self, order_id: &str, new_status: OrderStatus)
    -> ApiResult<OrderStatus>;
}

#[async_trait]
pub trait InvoiceApi: Send + Sync {
    async fn get_by_order_id(&self, order_id: &str) -> ApiResult<Invoice>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::{Diagnosis, Medicine};

    pub fn sample_medicine(id: &str, price: i64) -> Medicine {
        Medicine {
            id: id.to_string(),
            name: format!("Medicine {id}"),
            price,
            in_stock: true,
            limit_quantity: Some(10),
            thumbnail: None,
        }
    }

    pub struct StubDiagnosisApi {
        pub calls: AtomicUsize,
        pub medicines: Vec<Medicine>,
    }

    impl StubDiagnosisApi {
        pub fn new(medicines: Vec<Medicine>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                medicines,
            }
        }
    }

    #[async_trait]
    impl DiagnosisApi for StubDiagnosisApi {
        async fn get_suggestion(&self, _consultation_id: &str) -> ApiResult<Suggestion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Suggestion {
                primary_diagnosis: Diagnosis {
                    name: "Seasonal allergic rhinitis".into(),
                    confidence: 0.87,
                    description: "Histamine response to airborne allergens".into(),
                },
                severity_level: "mild".into(),
                recommended_medicines: self.medicines.clone(),
            })
        }
    }

    pub struct StubAddressApi {
        pub addresses: Mutex<Vec<ShippingAddress>>,
    }

    impl StubAddressApi {
        pub fn with_one_address() -> Self {
            Self {
                addresses: Mutex::new(vec![ShippingAddress {
                    id: "addr_1".into(),
                    name: "Test User".into(),
                    phone: "0800000000".into(),
                    address_line1: "1 Main St".into(),
                    address_line2: None,
                    city: "Springfield".into(),
                    state: "IL".into(),
                    country: "US".into(),
                    postal_code: "62701".into(),
                    is_default: true,
                }]),
            }
        }
    }

    #[async_trait]
    impl AddressApi for StubAddressApi {
        async fn list(&self) -> ApiResult<Vec<ShippingAddress>> {
            Ok(self.addresses.lock().unwrap().clone())
        }

        async fn add(&self, address: NewAddress) -> ApiResult<Vec<ShippingAddress>> {
            let mut addresses = self.addresses.lock().unwrap();
            let id = format!("addr_{}", addresses.len() + 1);
            addresses.push(ShippingAddress {
                id,
                name: address.name,
                phone: address.phone,
                address_line1: address.address_line1,
                address_line2: address.address_line2,
                city: address.city,
                state: address.state,
                country: address.country,
                postal_code: address.postal_code,
                is_default: false,
            });
            Ok(addresses.clone())
        }

        async fn delete(&self, address_id: &str) -> ApiResult<Vec<ShippingAddress>> {
            let mut addresses = self.addresses.lock().unwrap();
            addresses.retain(|a| a.id != address_id);
            Ok(addresses.clone())
        }

        async fn set_default(&self, address_id: &str) -> ApiResult<Vec<ShippingAddress>> {
            let mut addresses = self.addresses.lock().unwrap();
            for address in addresses.iter_mut() {
                address.is_default = address.id == address_id;
            }
            Ok(addresses.clone())
        }
    }

    #[derive(Default)]
    pub struct StubCartApi {
        pub items: Mutex<Vec<CartItem>>,
    }

    #[async_trait]
    impl CartApi for StubCartApi {
        async fn add_item(&self, medicine_id: &str, quantity: u32) -> ApiResult<CartSnapshot> {
            let mut items = self.items.lock().unwrap();
            items.push(CartItem {
                medicine_id: medicine_id.to_string(),
                quantity,
                price_snapshot: 0,
            });
            Ok(CartSnapshot {
                items: items.clone(),
            })
        }
    }

    /// Order backend double that counts place-order calls, for the
    /// duplicate-submission guard tests.
    #[derive(Default)]
    pub struct CountingOrderApi {
        pub place_order_calls: AtomicUsize,
    }

    #[async_trait]
    impl OrderApi for CountingOrderApi {
        async fn place_order(
            &self,
            address_id: &str,
            payment_method: PaymentMethod,
            items: &[CartItem],
        ) -> ApiResult<Order> {
            self.place_order_calls.fetch_add(1, Ordering::SeqCst);
            let grand_total = crate::cart::compute_totals(items).grand_total;
            Ok(Order {
                id: "order_1".into(),
                status: OrderStatus::Pending,
                address_id: address_id.to_string(),
                payment_method,
                items: items.to_vec(),
                grand_total,
                created_at: Utc::now(),
            })
        }

        async fn get_status(&self, _order_id: &str) -> ApiResult<OrderStatus> {
            Ok(OrderStatus::Pending)
        }

        async fn change_status(
            &self,
            _order_id: &str,
            new_status: OrderStatus,
        ) -> ApiResult<OrderStatus> {
            Ok(new_status)
        }
    }

    pub struct StubInvoiceApi;

    #[async_trait]
    impl InvoiceApi for StubInvoiceApi {
        async fn get_by_order_id(&self, order_id: &str) -> ApiResult<Invoice> {
            Ok(Invoice {
                id: "inv_1".into(),
                order_id: order_id.to_string(),
                status: crate::models::InvoiceStatus::Pending,
                grand_total: 0,
                issued_at: Utc::now(),
            })
        }
    }
}
