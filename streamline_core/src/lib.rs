#![forbid(unsafe_code)]

//! Core domain model and business logic for StreamLine menu costing.
//!
//! This crate provides:
//! - Domain types (ingredients, drinks, ice types, menus)
//! - The recipe text format
//! - The drink cost calculator, profit and cost-of-goods figures
//! - Per-user persistence behind the `Repository` trait
//! - Menu reports and CSV export
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod recipe;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod pricing;
pub mod store;
pub mod report;
pub mod service;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use recipe::{format_recipe, parse_recipe, RecipeError, RecipeLine};
pub use catalog::IngredientCatalog;
pub use config::{Config, Settings};
pub use pricing::{legacy_cost, price_drink, price_recipe, DrinkPricing, PricingError};
pub use store::{JsonStore, MemoryStore, Record, Repository};
pub use report::{write_csv, DrinkReport, MenuReport};
pub use service::Backoffice;
