//! HomeHero marketplace client: typed backend API, listing filters and the
//! session wiring behind the `homehero` binary.

pub mod api;
pub mod app;
pub mod filters;
pub mod models;
pub mod render;

pub use api::HomeHeroApi;
pub use app::{HomeHero, Settings};
pub use filters::{ServiceFilters, SortOrder};
