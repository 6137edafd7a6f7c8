//! Service category catalog.

use serde::Serialize;

const FALLBACK_ICON: &str = "🔧";
const FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1521791136064-7986c2920216?w=800&auto=format&fit=crop&q=60";

/// A known service category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub default_image: &'static str,
}

macro_rules! category {
    ($value:literal, $label:literal, $icon:literal, $photo:literal) => {
        Category {
            value: $value,
            label: $label,
            icon: $icon,
            default_image: concat!(
                "https://images.unsplash.com/photo-",
                $photo,
                "?w=800&auto=format&fit=crop&q=60"
            ),
        }
    };
}

pub static SERVICE_CATEGORIES: &[Category] = &[
    category!("cleaning", "Cleaning", "🧹", "1581578731548-c64695cc6952"),
    category!("plumbing", "Plumbing", "🔧", "1585704032915-c3400ca199e7"),
    category!("electrical", "Electrical", "⚡", "1621905251189-08b45d6a269e"),
    category!("painting", "Painting", "🎨", "1562259949-e8e7689d7828"),
    category!("carpentry", "Carpentry", "🔨", "1504148455328-c376907d081c"),
    category!("gardening", "Gardening", "🌿", "1416879595882-3373a0480b5b"),
    category!("moving", "Moving & Shifting", "📦", "1600518464441-9154a4dea21b"),
    category!("appliance", "Appliance Repair", "🔌", "1558618666-fcd25c85cd64"),
    category!("pest-control", "Pest Control", "🐛", "1632935191446-60ef0e857a4e"),
    category!("ac-service", "AC Service", "❄️", "1631545308218-f29cead4c6ce"),
    category!("beauty", "Beauty & Spa", "💅", "1560750588-73207b1ef5b8"),
    category!("tutoring", "Tutoring", "📚", "1523240795612-9a054b0db644"),
    category!("catering", "Catering", "🍽️", "1555244162-803834f70033"),
    category!("photography", "Photography", "📷", "1554048612-b6a482bc67e5"),
    category!("security", "Security", "🔒", "1558002038-1055907df827"),
    category!("laundry", "Laundry", "👕", "1545173168-9f1947eebb7f"),
    category!("other", "Other", "🔧", "1521791136064-7986c2920216"),
];

/// Category display info; unknown categories get a synthesized entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub value: String,
    pub label: String,
    pub icon: &'static str,
    pub default_image: &'static str,
}

impl From<&Category> for CategoryInfo {
    fn from(c: &Category) -> Self {
        Self {
            value: c.value.to_string(),
            label: c.label.to_string(),
            icon: c.icon,
            default_image: c.default_image,
        }
    }
}

/// Look up a category by value or (case-insensitive) label.
pub fn find_category(value: &str) -> Option<&'static Category> {
    SERVICE_CATEGORIES
        .iter()
        .find(|c| c.value == value || c.label.eq_ignore_ascii_case(value))
}

pub fn category_info(value: &str) -> CategoryInfo {
    if let Some(c) = find_category(value) {
        return c.into();
    }

    if value.is_empty() {
        return CategoryInfo {
            value: "other".to_string(),
            label: "Other".to_string(),
            icon: FALLBACK_ICON,
            default_image: FALLBACK_IMAGE,
        };
    }

    let mut chars = value.chars();
    let label = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    CategoryInfo {
        value: value.to_string(),
        label,
        icon: FALLBACK_ICON,
        default_image: FALLBACK_IMAGE,
    }
}

pub fn category_label(value: &str) -> String {
    category_info(value).label
}

pub fn category_icon(value: &str) -> &'static str {
    category_info(value).icon
}

pub fn category_default_image(value: &str) -> &'static str {
    category_info(value).default_image
}
