use homehero_common::catalog::{category_default_image, category_info, CategoryInfo};
use homehero_common::format::{average_rating, is_valid_url};
use homehero_http::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum description length accepted for a new service.
pub const MIN_DESCRIPTION_LEN: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_name: Option<String>,
    pub user_photo: Option<String>,
    #[serde(default)]
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub provider_name: Option<String>,
    pub provider_email: Option<String>,
    pub provider_image: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub rating: Option<f64>,
    pub created_at: Option<String>,
}

impl Service {
    pub fn category_info(&self) -> CategoryInfo {
        category_info(&self.category)
    }

    /// Mean of the attached reviews, falling back to the stored rating.
    pub fn average_rating(&self) -> f64 {
        if self.reviews.is_empty() {
            return self.rating.unwrap_or(0.0);
        }
        average_rating(self.reviews.iter().map(|r| r.rating))
    }

    /// The uploaded image, or the category's stock photo.
    pub fn display_image(&self) -> &str {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => category_default_image(&self.category),
        }
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.provider_email.as_deref() == Some(email)
    }
}

/// Body of `POST /services`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub service_name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub provider_name: String,
    pub provider_email: String,
    pub provider_image: Option<String>,
    pub location: String,
    pub duration: Option<String>,
}

impl NewService {
    /// Listing offered by `provider`, pictured with the category's stock photo.
    pub fn for_provider(
        provider: &Identity,
        service_name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        description: impl Into<String>,
    ) -> Self {
        let category = category.into();
        NewService {
            service_name: service_name.into().trim().to_string(),
            image_url: category_default_image(&category).to_string(),
            category,
            price,
            description: description.into().trim().to_string(),
            provider_name: provider
                .display_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            provider_email: provider.email.clone(),
            provider_image: provider.photo_url.clone(),
            location: "Not specified".to_string(),
            duration: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        if !location.trim().is_empty() {
            self.location = location.trim().to_string();
        }
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        let duration = duration.into();
        self.duration = Some(duration.trim().to_string()).filter(|d| !d.is_empty());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service_name.trim().is_empty() {
            anyhow::bail!("Please enter service name");
        }
        if self.category.is_empty() {
            anyhow::bail!("Please select a category");
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            anyhow::bail!("Please enter a valid price");
        }
        if self.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
            anyhow::bail!(
                "Description should be at least {} characters",
                MIN_DESCRIPTION_LEN
            );
        }
        if !is_valid_url(&self.image_url) {
            anyhow::bail!("Image URL is not valid: {}", self.image_url);
        }
        Ok(())
    }
}

/// Body of `PUT /services/{id}`; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl ServiceUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ServiceUpdate::default()
    }
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: String,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub booking_date: String,
    pub special_instructions: String,
    pub price: Option<f64>,
}

impl BookingRequest {
    /// Booking of `service` by `customer` on `booking_date`.
    pub fn new(service: &Service, customer: &Identity, booking_date: impl Into<String>) -> Self {
        BookingRequest {
            service_id: service.id.clone(),
            user_email: customer.email.clone(),
            user_name: customer.name().to_string(),
            user_photo: customer.photo_url.clone(),
            booking_date: booking_date.into(),
            special_instructions: String::new(),
            price: service.price,
        }
    }

    pub fn with_instructions(mut self, text: impl Into<String>) -> Self {
        self.special_instructions = text.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub service_image: Option<String>,
    pub provider_name: Option<String>,
    pub provider_email: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub booking_date: Option<String>,
    pub special_instructions: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub has_reviewed: bool,
}

impl Booking {
    /// Parsed status; anything unrecognized reads as pending.
    pub fn status(&self) -> BookingStatus {
        self.status.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }

    /// Statuses a provider may move a booking to from here.
    pub fn next_actions(self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Cancelled],
            BookingStatus::Confirmed => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::InProgress => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.next_actions().contains(&next)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in-progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Body of `POST /services/{id}/reviews`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    pub fn new(rating: u8, comment: impl Into<String>) -> anyhow::Result<Self> {
        if !(1..=5).contains(&rating) {
            anyhow::bail!("Rating must be between 1 and 5");
        }
        Ok(NewReview {
            rating,
            comment: comment.into().trim().to_string(),
        })
    }
}

/// `GET /users/stats/{email}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_services: u64,
    pub total_bookings_received: u64,
    pub completed_bookings: u64,
    pub total_revenue: f64,
    pub average_rating: f64,
}

impl UserStats {
    /// Completed share of received bookings, in percent.
    pub fn completion_rate(&self) -> f64 {
        if self.total_bookings_received == 0 {
            return 0.0;
        }
        self.completed_bookings as f64 / self.total_bookings_received as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(value: serde_json::Value) -> Service {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn service_display_helpers() {
        let s = service(json!({
            "_id": "s1",
            "serviceName": "Deep Clean",
            "category": "cleaning",
            "price": 40,
            "providerEmail": "pro@x.com",
            "reviews": [{"rating": 5}, {"rating": 4}]
        }));
        assert_eq!(s.average_rating(), 4.5);
        assert_eq!(s.category_info().label, "Cleaning");
        assert!(s.display_image().contains("unsplash"));
        assert!(s.is_owned_by("pro@x.com"));
        assert!(!s.is_owned_by("other@x.com"));

        let bare = service(json!({"_id": "s2", "rating": 3.5}));
        assert_eq!(bare.average_rating(), 3.5);
    }

    #[test]
    fn new_service_validation() {
        let provider = Identity::new("pro@x.com");
        let ok = NewService::for_provider(
            &provider,
            "  Deep Clean ",
            "cleaning",
            45.0,
            "Whole-home cleaning, all rooms included.",
        );
        assert_eq!(ok.service_name, "Deep Clean");
        assert_eq!(ok.provider_name, "Anonymous");
        assert_eq!(ok.location, "Not specified");
        ok.validate().unwrap();

        let cheap = NewService { price: 0.0, ..ok.clone() };
        assert!(cheap.validate().is_err());
        let terse = NewService { description: "short".into(), ..ok.clone() };
        assert!(terse.validate().is_err());
        let nameless = NewService { service_name: " ".into(), ..ok };
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn service_update_sends_only_set_fields() {
        let update = ServiceUpdate {
            price: Some(60.0),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"price": 60.0}));
        assert!(ServiceUpdate::default().is_empty());
    }

    #[test]
    fn booking_request_body() {
        let s = service(json!({"_id": "s1", "price": 40}));
        let customer = Identity::new("c@x.com").with_display_name("Cam");
        let body = BookingRequest::new(&s, &customer, "2025-07-01").with_instructions("Ring twice");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "serviceId": "s1",
                "userEmail": "c@x.com",
                "userName": "Cam",
                "userPhoto": null,
                "bookingDate": "2025-07-01",
                "specialInstructions": "Ring twice",
                "price": 40.0
            })
        );
    }

    #[test]
    fn booking_status_rules() {
        let b: Booking = serde_json::from_value(json!({"_id": "b1", "status": "weird"})).unwrap();
        assert_eq!(b.status(), BookingStatus::Pending);
        assert_eq!("In-Progress".parse::<BookingStatus>().unwrap(), BookingStatus::InProgress);
        assert!("done".parse::<BookingStatus>().is_err());

        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Completed));
        assert!(BookingStatus::Completed.next_actions().is_empty());
        assert_eq!(
            serde_json::to_value(BookingStatus::InProgress).unwrap(),
            json!("in-progress")
        );
    }

    #[test]
    fn review_and_stats() {
        assert!(NewReview::new(0, "x").is_err());
        assert!(NewReview::new(6, "x").is_err());
        assert_eq!(NewReview::new(5, " great ").unwrap().comment, "great");

        let stats: UserStats =
            serde_json::from_value(json!({"totalBookingsReceived": 4, "completedBookings": 1}))
                .unwrap();
        assert_eq!(stats.completion_rate(), 25.0);
        assert_eq!(UserStats::default().completion_rate(), 0.0);
    }
}
