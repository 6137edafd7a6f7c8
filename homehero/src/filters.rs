//! Service listing filters, kept in step with URL query parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// Placeholder category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All Categories";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    Rating,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::Newest,
        SortOrder::Oldest,
        SortOrder::PriceLow,
        SortOrder::PriceHigh,
        SortOrder::Rating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::PriceLow => "price-low",
            SortOrder::PriceHigh => "price-high",
            SortOrder::Rating => "rating",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest First",
            SortOrder::Oldest => "Oldest First",
            SortOrder::PriceLow => "Price: Low to High",
            SortOrder::PriceHigh => "Price: High to Low",
            SortOrder::Rating => "Highest Rated",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| format!("unknown sort order: {}", s))
    }
}

/// Filter state of the service listing. Prices stay as typed so that a
/// half-entered value round-trips through the URL unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilters {
    pub search: String,
    pub category: String,
    pub min_price: String,
    pub max_price: String,
    pub sort_by: SortOrder,
}

fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

impl ServiceFilters {
    /// Parse from a URL query string (leading `?` allowed). Unknown keys and
    /// unknown sort orders are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut filters = ServiceFilters::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "search" => filters.search = value.into_owned(),
                "category" => filters.category = value.into_owned(),
                "minPrice" => filters.min_price = value.into_owned(),
                "maxPrice" => filters.max_price = value.into_owned(),
                "sortBy" => filters.sort_by = value.parse().unwrap_or_default(),
                _ => {}
            }
        }
        filters
    }

    fn category_filter(&self) -> Option<&str> {
        let category = self.category.trim();
        (!category.is_empty() && category != ALL_CATEGORIES).then_some(category)
    }

    /// Parameters sent to `GET /services`: only filters that narrow the
    /// listing, with the default sort left implicit.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search".to_string(), search.to_string()));
        }
        if let Some(category) = self.category_filter() {
            params.push(("category".to_string(), category.to_string()));
        }
        if is_numeric(&self.min_price) {
            params.push(("minPrice".to_string(), self.min_price.trim().to_string()));
        }
        if is_numeric(&self.max_price) {
            params.push(("maxPrice".to_string(), self.max_price.trim().to_string()));
        }
        if self.sort_by != SortOrder::Newest {
            params.push(("sortBy".to_string(), self.sort_by.to_string()));
        }
        params
    }

    /// Encoded form of [`to_query`](Self::to_query), empty when no filter applies.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query())
            .finish()
    }

    /// Parameters mirrored into the page location: every non-empty value,
    /// including the sort order.
    pub fn to_location_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in [
            ("search", self.search.as_str()),
            ("category", self.category.as_str()),
            ("minPrice", self.min_price.as_str()),
            ("maxPrice", self.max_price.as_str()),
        ] {
            if !value.is_empty() && value != ALL_CATEGORIES {
                serializer.append_pair(key, value);
            }
        }
        serializer.append_pair("sortBy", self.sort_by.as_str());
        serializer.finish()
    }

    /// Whether anything narrows the listing. Sorting alone does not count.
    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty()
            || self.category_filter().is_some()
            || !self.min_price.is_empty()
            || !self.max_price.is_empty()
    }

    pub fn clear(&mut self) {
        *self = ServiceFilters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_query_defaults_sort_to_newest() {
        let f = ServiceFilters::from_query("?search=deep+clean&category=cleaning&minPrice=10");
        assert_eq!(f.search, "deep clean");
        assert_eq!(f.category, "cleaning");
        assert_eq!(f.min_price, "10");
        assert_eq!(f.sort_by, SortOrder::Newest);

        let f = ServiceFilters::from_query("sortBy=price-high&bogus=1");
        assert_eq!(f.sort_by, SortOrder::PriceHigh);
        assert_eq!(ServiceFilters::from_query("sortBy=sideways").sort_by, SortOrder::Newest);
    }

    #[test]
    fn to_query_emits_only_active_filters() {
        let f = ServiceFilters {
            search: "  plumber ".into(),
            category: ALL_CATEGORIES.into(),
            min_price: "abc".into(),
            max_price: "200".into(),
            sort_by: SortOrder::Newest,
        };
        assert_eq!(
            f.to_query(),
            vec![
                ("search".to_string(), "plumber".to_string()),
                ("maxPrice".to_string(), "200".to_string()),
            ]
        );
        assert_eq!(f.query_string(), "search=plumber&maxPrice=200");
        assert_eq!(ServiceFilters::default().query_string(), "");

        let sorted = ServiceFilters {
            sort_by: SortOrder::Rating,
            ..Default::default()
        };
        assert_eq!(sorted.query_string(), "sortBy=rating");
        assert!(!sorted.has_active_filters());
    }

    #[test]
    fn location_query_round_trips() {
        let f = ServiceFilters {
            search: "ac repair".into(),
            category: "ac-service".into(),
            ..Default::default()
        };
        let location = f.to_location_query();
        assert_eq!(location, "search=ac+repair&category=ac-service&sortBy=newest");
        assert_eq!(ServiceFilters::from_query(&location), f);
    }

    #[test]
    fn active_and_clear() {
        let mut f = ServiceFilters::from_query("category=plumbing");
        assert!(f.has_active_filters());
        f.clear();
        assert!(!f.has_active_filters());
        assert_eq!(f, ServiceFilters::default());

        assert!(!ServiceFilters::from_query("category=All+Categories").has_active_filters());
    }

    #[test]
    fn sort_labels() {
        assert_eq!(SortOrder::PriceLow.label(), "Price: Low to High");
        assert_eq!("oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
    }
}
