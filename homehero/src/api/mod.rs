//! Typed calls to the HomeHero backend.
//!
//! Browsing, listing edits and booking requests go through the public
//! client. Everything tied to the signed-in user goes through the secure
//! client, so a rejected token tears the session down.

pub mod normalize;

use crate::filters::ServiceFilters;
use crate::models::{
    Booking, BookingRequest, BookingStatus, NewReview, NewService, Service, ServiceUpdate,
    UserStats,
};
use homehero_http::client::RetryConfig;
use homehero_http::{ApiClient, ApiRequest, Result};
use serde_json::{json, Value};

pub use normalize::{decode_list, ensure_ids, extract_list};

/// Extra attempts the listing makes on transient failures.
const LISTING_RETRIES: u32 = 2;

/// Unwrap `{data: {...}}` envelopes around a single record.
fn unwrap_record(body: Value) -> Value {
    match body {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[derive(Clone, Debug)]
pub struct HomeHeroApi {
    public: ApiClient,
    secure: ApiClient,
}

impl HomeHeroApi {
    pub fn new(public: ApiClient, secure: ApiClient) -> Self {
        Self { public, secure }
    }

    /// Public client derived from `secure`, sharing its transport.
    pub fn from_secure(secure: ApiClient) -> Self {
        Self {
            public: secure.as_public(),
            secure,
        }
    }

    pub fn public(&self) -> &ApiClient {
        &self.public
    }

    pub fn secure(&self) -> &ApiClient {
        &self.secure
    }

    async fn list<T: serde::de::DeserializeOwned>(
        client: &ApiClient,
        request: ApiRequest,
    ) -> Result<Vec<T>> {
        let body: Value = client.fetch_json(request).await?;
        Ok(decode_list(body))
    }

    // ---- services ----

    pub async fn list_services(&self, filters: &ServiceFilters) -> Result<Vec<Service>> {
        let request = ApiRequest::get("/services")
            .with_query_pairs(filters.to_query())
            .with_retry(RetryConfig::new().with_max_retries(LISTING_RETRIES));
        Self::list(&self.public, request).await
    }

    pub async fn featured_services(&self, limit: u32) -> Result<Vec<Service>> {
        let request = ApiRequest::get("/services/featured").with_query("limit", limit.to_string());
        Self::list(&self.public, request).await
    }

    pub async fn top_rated_services(&self, limit: u32) -> Result<Vec<Service>> {
        let request = ApiRequest::get("/services/top-rated").with_query("limit", limit.to_string());
        Self::list(&self.public, request).await
    }

    pub async fn service(&self, id: &str) -> Result<Service> {
        let body: Value = self.public.get(&format!("/services/{}", id)).await?;
        Ok(serde_json::from_value(unwrap_record(body))?)
    }

    pub async fn provider_services(&self, email: &str) -> Result<Vec<Service>> {
        Self::list(&self.public, ApiRequest::get(format!("/services/provider/{}", email))).await
    }

    pub async fn add_service(&self, service: &NewService) -> Result<Value> {
        self.secure.post("/services", service).await
    }

    pub async fn update_service(&self, id: &str, update: &ServiceUpdate) -> Result<Value> {
        self.public.put(&format!("/services/{}", id), update).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<Value> {
        self.public.delete(&format!("/services/{}", id)).await
    }

    // ---- bookings ----

    pub async fn create_booking(&self, booking: &BookingRequest) -> Result<Value> {
        self.public.post("/bookings", booking).await
    }

    pub async fn user_bookings(&self, email: &str) -> Result<Vec<Booking>> {
        Self::list(&self.secure, ApiRequest::get(format!("/bookings/user/{}", email))).await
    }

    pub async fn provider_bookings(&self, email: &str) -> Result<Vec<Booking>> {
        Self::list(&self.secure, ApiRequest::get(format!("/bookings/provider/{}", email))).await
    }

    pub async fn cancel_booking(&self, id: &str) -> Result<Value> {
        self.secure.delete(&format!("/bookings/{}", id)).await
    }

    pub async fn update_booking_status(&self, id: &str, status: BookingStatus) -> Result<Value> {
        self.secure
            .patch(&format!("/bookings/{}/status", id), &json!({ "status": status }))
            .await
    }

    // ---- reviews & stats ----

    pub async fn add_review(&self, service_id: &str, review: &NewReview) -> Result<Value> {
        self.secure
            .post(&format!("/services/{}/reviews", service_id), review)
            .await
    }

    pub async fn user_stats(&self, email: &str) -> Result<UserStats> {
        let body: Value = self.secure.get(&format!("/users/stats/{}", email)).await?;
        Ok(serde_json::from_value(unwrap_record(body))?)
    }
}
