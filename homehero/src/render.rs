//! Plain-text rendering for the command line.

use crate::models::{Booking, Service, UserStats};
use chrono::Utc;
use homehero_common::format::{
    format_date, format_number, format_price, initials, relative_time, star_rating, status_badge,
    truncate_text,
};
use homehero_http::{Identity, Redirect};

const SUMMARY_LEN: usize = 100;

pub fn service_line(service: &Service) -> String {
    let category = service.category_info();
    format!(
        "{}  {} {}  {}  {} ({:.1})  [{}]",
        service.id,
        category.icon,
        service.service_name,
        format_price(service.price),
        star_rating(service.average_rating()),
        service.average_rating(),
        category.label
    )
}

pub fn service_details(service: &Service) -> String {
    let category = service.category_info();
    let mut out = vec![
        format!("{} {}", category.icon, service.service_name),
        format!("  id:        {}", service.id),
        format!("  category:  {}", category.label),
        format!("  price:     {}", format_price(service.price)),
        format!(
            "  rating:    {} ({} reviews)",
            star_rating(service.average_rating()),
            service.reviews.len()
        ),
        format!("  provider:  {}", service.provider_name.as_deref().unwrap_or("Anonymous")),
        format!("  location:  {}", service.location.as_deref().unwrap_or("Not specified")),
        format!("  image:     {}", service.display_image()),
    ];
    if let Some(created) = &service.created_at {
        out.push(format!("  listed:    {}", relative_time(created, Utc::now())));
    }
    if let Some(description) = &service.description {
        out.push(format!("  {}", truncate_text(description, SUMMARY_LEN)));
    }
    for review in &service.reviews {
        out.push(format!(
            "    {} {}: {}",
            star_rating(review.rating),
            review.user_name.as_deref().unwrap_or("Anonymous"),
            review.comment.as_deref().unwrap_or("")
        ));
    }
    out.join("\n")
}

pub fn booking_line(booking: &Booking) -> String {
    let badge = status_badge(&booking.status);
    format!(
        "{}  {} {}  {}  {}  {}",
        booking.id,
        badge.icon,
        badge.label,
        booking.service_name.as_deref().unwrap_or("(service)"),
        booking
            .booking_date
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "N/A".to_string()),
        format_price(booking.price)
    )
}

pub fn stats(stats: &UserStats) -> String {
    [
        format!("Services:          {}", format_number(Some(stats.total_services as f64))),
        format!(
            "Bookings received: {}",
            format_number(Some(stats.total_bookings_received as f64))
        ),
        format!("Completed:         {:.0}%", stats.completion_rate()),
        format!("Revenue:           {}", format_price(Some(stats.total_revenue))),
        format!("Average rating:    {:.1} / 5.0", stats.average_rating),
    ]
    .join("\n")
}

pub fn identity(identity: &Identity) -> String {
    [
        format!("[{}] {}", initials(identity.display_name.as_deref()), identity.name()),
        format!("  email:        {}", identity.email),
        format!("  verified:     {}", identity.email_verified),
        format!("  member since: {}", identity.creation_display()),
        format!("  last sign-in: {}", identity.last_sign_in_display()),
    ]
    .join("\n")
}

pub fn redirect(redirect: &Redirect) -> String {
    let mut line = format!("-> {}", redirect.route);
    if let Some(from) = &redirect.return_to {
        line.push_str(&format!(" (from {})", from));
    }
    match &redirect.message {
        Some(message) => format!("{}\n{}", message, line),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_and_booking_lines() {
        let service: Service = serde_json::from_value(json!({
            "_id": "s1",
            "serviceName": "Pipe Fix",
            "category": "plumbing",
            "price": 80,
            "reviews": [{"rating": 4}]
        }))
        .unwrap();
        assert_eq!(service_line(&service), "s1  🔧 Pipe Fix  $80  ★★★★☆ (4.0)  [Plumbing]");

        let booking: Booking = serde_json::from_value(json!({
            "_id": "b1",
            "serviceName": "Pipe Fix",
            "bookingDate": "2025-07-01",
            "status": "in-progress",
            "price": 80
        }))
        .unwrap();
        assert_eq!(booking_line(&booking), "b1  🔄 In Progress  Pipe Fix  July 1, 2025  $80");
    }

    #[test]
    fn redirect_shows_message_first() {
        let text = redirect(&Redirect::session_expired(Some("/my-bookings")));
        assert_eq!(
            text,
            "Session expired. Please login again.\n-> /login (from /my-bookings)"
        );
    }

    #[test]
    fn identity_card() {
        let card = identity(&Identity::new("jo@x.com").with_display_name("Jo Ann"));
        assert!(card.starts_with("[JA] Jo Ann"));
        assert!(card.contains("member since: N/A"));
    }
}
