//! reqwest-backed implementation of the backend client traits. One client
//! serves all five collaborators; they share a base URL and connection pool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    AddressApi, ApiError, ApiResult, CartApi, DiagnosisApi, InvoiceApi, OrderApi,
};
use crate::models::{
    CartItem, CartSnapshot, Invoice, NewAddress, Order, OrderStatus, PaymentMethod,
    ShippingAddress, Suggestion,
};

#[derive(Clone)]
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        if !response.status().is_success() {
            return Err(ApiError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DiagnosisApi for HttpBackendClient {
    async fn get_suggestion(&self, consultation_id: &str) -> ApiResult<Suggestion> {
        let endpoint = format!("/consultations/{consultation_id}/suggestion");
        let response = self.http.get(self.url(&endpoint)).send().await?;
        self.decode(&endpoint, response).await
    }
}

#[async_trait]
impl AddressApi for HttpBackendClient {
    async fn list(&self) -> ApiResult<Vec<ShippingAddress>> {
        let response = self.http.get(self.url("/addresses")).send().await?;
        self.decode("/addresses", response).await
    }

    async fn add(&self, address: NewAddress) -> ApiResult<Vec<ShippingAddress>> {
        let response = self
            .http
            .post(self.url("/addresses"))
            .json(&address)
            .send()
            .await?;
        self.decode("/addresses", response).await
    }

    async fn delete(&self, address_id: &str) -> ApiResult<Vec<ShippingAddress>> {
        let endpoint = format!("/addresses/{address_id}");
        let response = self.http.delete(self.url(&endpoint)).send().await?;
        self.decode(&endpoint, response).await
    }

    async fn set_default(&self, address_id: &str) -> ApiResult<Vec<ShippingAddress>> {
        let endpoint = format!("/addresses/{address_id}/default");
        let response = self.http.post(self.url(&endpoint)).send().await?;
        self.decode(&endpoint, response).await
    }
}

#[async_trait]
impl CartApi for HttpBackendClient {
    async fn add_item(&self, medicine_id: &str, quantity: u32) -> ApiResult<CartSnapshot> {
        let response = self
            .http
            .post(self.url("/cart/items"))
            .json(&json!({
                "medicine_id": medicine_id,
                "quantity": quantity,
            }))
            .send()
            .await?;
        self.decode("/cart/items", response).await
    }
}

#[async_trait]
impl OrderApi for HttpBackendClient {
    async fn place_order(
        &self,
        address_id: &str,
        payment_method: PaymentMethod,
        items: &[CartItem],
    ) -> ApiResult<Order> {
        let response = self
            .http
            .post(self.url("/orders"))
            .json(&json!({
                "address_id": address_id,
                "payment_method": payment_method,
                "items": items,
            }))
            .send()
            .await?;
        self.decode("/orders", response).await
    }

    async fn get_status(&self, order_id: &str) -> ApiResult<OrderStatus> {
        let endpoint = format!("/orders/{order_id}/status");
        let response = self.http.get(self.url(&endpoint)).send().await?;
        let body: StatusBody = self.decode(&endpoint, response).await?;
        Ok(body.status)
    }

    async fn change_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> ApiResult<OrderStatus> {
        let endpoint = format!("/orders/{order_id}/status");
        let response = self
            .http
            .post(self.url(&endpoint))
            .json(&StatusBody { status: new_status })
            .send()
            .await?;
        let body: StatusBody = self.decode(&endpoint, response).await?;
        Ok(body.status)
    }
}

#[async_trait]
impl InvoiceApi for HttpBackendClient {
    async fn get_by_order_id(&self, order_id: &str) -> ApiResult<Invoice> {
        let endpoint = format!("/invoices/by-order/{order_id}");
        let response = self.http.get(self.url(&endpoint)).send().await?;
        self.decode(&endpoint, response).await
    }
}
