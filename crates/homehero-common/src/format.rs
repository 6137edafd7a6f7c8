//! Display formatting and input validation helpers.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s\-+()]{10,}$").unwrap());
static SLUG_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap());
static SLUG_SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").unwrap());

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

/// US-dollar price with up to two fraction digits, e.g. `$1,234.5`.
/// Missing or non-finite prices render as `$0.00`.
pub fn format_price(price: Option<f64>) -> String {
    let price = match price {
        Some(p) if p.is_finite() => p,
        _ => return "$0.00".to_string(),
    };

    let cents = (price.abs() * 100.0).round() as u64;
    let (int, frac) = (cents / 100, cents % 100);
    let frac = match frac {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{:02}", f),
    };
    let sign = if price < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}{frac}", group_thousands(int))
}

/// Number with thousands separators and up to three fraction digits.
pub fn format_number(num: Option<f64>) -> String {
    let num = match num {
        Some(n) if n.is_finite() => n,
        _ => return "0".to_string(),
    };

    let milli = (num.abs() * 1000.0).round() as u64;
    let (int, frac) = (milli / 1000, milli % 1000);
    let frac = if frac == 0 {
        String::new()
    } else {
        format!(".{}", format!("{:03}", frac).trim_end_matches('0'))
    };
    let sign = if num < 0.0 && milli > 0 { "-" } else { "" };
    format!("{sign}{}{frac}", group_thousands(int))
}

pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let head: String = text.chars().take(max_len).collect();
    format!("{}...", head.trim())
}

pub fn capitalize_words(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL-friendly slug: lowercase, punctuation dropped, separators collapsed to `-`.
pub fn generate_slug(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(lower.trim(), "");
    let dashed = SLUG_SEP_RE.replace_all(&stripped, "-");
    dashed.trim_matches('-').to_string()
}

/// Up to two uppercase initials; `U` for an unnamed user.
pub fn initials(name: Option<&str>) -> String {
    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => return "U".to_string(),
    };
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Long date like `January 5, 2025`.
pub fn format_date(date: &str) -> String {
    if date.is_empty() {
        return "N/A".to_string();
    }
    match parse_date(date) {
        Some(dt) => dt.format("%B %-d, %Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Coarse "time ago" text relative to `now`.
pub fn relative_time(date: &str, now: DateTime<Utc>) -> String {
    if date.is_empty() {
        return "N/A".to_string();
    }
    let Some(then) = parse_date(date) else {
        return "Invalid Date".to_string();
    };

    let secs = (now - then).num_seconds();
    match secs {
        s if s < 60 => "Just now".to_string(),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s if s < 604_800 => format!("{} days ago", s / 86_400),
        s if s < 2_592_000 => format!("{} weeks ago", s / 604_800),
        s if s < 31_536_000 => format!("{} months ago", s / 2_592_000),
        s => format!("{} years ago", s / 31_536_000),
    }
}

/// Mean rating rounded to one decimal; 0 for no reviews.
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0, 0u32), |(sum, n), r| (sum + r, n + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / f64::from(count) * 10.0).round() / 10.0
}

/// Five-slot star string, e.g. `★★★½☆` for 3.5.
pub fn star_rating(rating: f64) -> String {
    let rating = if rating.is_finite() { rating.clamp(0.0, 5.0) } else { 0.0 };
    let full = rating.floor() as usize;
    let half = rating.fract() >= 0.5;
    let empty = 5 - full - usize::from(half);
    format!(
        "{}{}{}",
        "★".repeat(full),
        if half { "½" } else { "" },
        "☆".repeat(empty)
    )
}

/// Booking status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub color: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

const PENDING: StatusBadge = StatusBadge { color: "yellow", icon: "⏳", label: "Pending" };

/// Badge for a booking status; unknown statuses read as pending.
pub fn status_badge(status: &str) -> StatusBadge {
    match status.to_lowercase().as_str() {
        "confirmed" => StatusBadge { color: "blue", icon: "✓", label: "Confirmed" },
        "in-progress" => StatusBadge { color: "purple", icon: "🔄", label: "In Progress" },
        "completed" => StatusBadge { color: "green", icon: "✅", label: "Completed" },
        "cancelled" => StatusBadge { color: "red", icon: "✕", label: "Cancelled" },
        "rejected" => StatusBadge { color: "red", icon: "❌", label: "Rejected" },
        _ => PENDING,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_url(input: &str) -> bool {
    url::Url::parse(input).is_ok()
}
