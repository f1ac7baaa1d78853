//! Core domain types for StreamLine.
//!
//! This module defines the entities a bar manager works with:
//! - Units of measure and their millilitre factors
//! - Ingredients (bottled or house-made) and how they are priced
//! - Drinks, ice types and menus
//! - The user id every persisted record is scoped to

use crate::recipe::{format_recipe, RecipeLine};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Millilitres in one US fluid ounce.
pub const ML_PER_OZ: f64 = 29.5735;

/// Millilitres in one centilitre.
pub const ML_PER_CL: f64 = 10.0;

// ============================================================================
// Units
// ============================================================================

/// Unit an amount or a container is measured in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Ml,
    Cl,
    Oz,
    Piece,
    Dash,
}

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::Ml, Unit::Cl, Unit::Oz, Unit::Piece, Unit::Dash];

    /// Parse a unit name, ignoring case and accepting plural counted units
    pub fn parse(s: &str) -> Option<Unit> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ml" => Some(Unit::Ml),
            "cl" => Some(Unit::Cl),
            "oz" => Some(Unit::Oz),
            "piece" | "pieces" => Some(Unit::Piece),
            "dash" | "dashes" => Some(Unit::Dash),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Ml => "ml",
            Unit::Cl => "cl",
            Unit::Oz => "oz",
            Unit::Piece => "piece",
            Unit::Dash => "dash",
        }
    }

    /// Millilitres per one of this unit; `None` for counted units
    pub fn ml_factor(self) -> Option<f64> {
        match self {
            Unit::Ml => Some(1.0),
            Unit::Cl => Some(ML_PER_CL),
            Unit::Oz => Some(ML_PER_OZ),
            Unit::Piece | Unit::Dash => None,
        }
    }

    /// Counted units are priced per item and never volume-converted
    pub fn is_counted(self) -> bool {
        self.ml_factor().is_none()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ingredients
// ============================================================================

/// One component of a house-made ingredient, with its absolute cost
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubIngredient {
    pub name: String,
    pub total_cost: f64,
}

/// How an ingredient's cost per unit is derived
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngredientPricing {
    /// Bought by the bottle/box: price of one container and its volume
    Container {
        cost_per_container: f64,
        container_volume: f64,
    },
    /// Made in-house from parts; the batch yields roughly `estimated_yield`
    Complex {
        parts: Vec<SubIngredient>,
        estimated_yield: f64,
    },
}

impl IngredientPricing {
    /// Total money spent on one container or batch
    pub fn total_cost(&self) -> f64 {
        match self {
            IngredientPricing::Container {
                cost_per_container, ..
            } => *cost_per_container,
            IngredientPricing::Complex { parts, .. } => parts.iter().map(|p| p.total_cost).sum(),
        }
    }

    /// Units obtained from one container or batch
    pub fn volume(&self) -> f64 {
        match self {
            IngredientPricing::Container {
                container_volume, ..
            } => *container_volume,
            IngredientPricing::Complex {
                estimated_yield, ..
            } => *estimated_yield,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, IngredientPricing::Complex { .. })
    }
}

/// An ingredient in the user's stock
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub unit: Unit,
    pub pricing: IngredientPricing,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, unit: Unit, pricing: IngredientPricing) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: String::new(),
            unit,
            pricing,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shorthand for a bottled ingredient
    pub fn container(name: impl Into<String>, unit: Unit, cost: f64, volume: f64) -> Self {
        Self::new(
            name,
            unit,
            IngredientPricing::Container {
                cost_per_container: cost,
                container_volume: volume,
            },
        )
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Cost per ml (volume units) or per item (counted units); `None` when
    /// the volume is not positive
    pub fn cost_per_unit(&self) -> Option<f64> {
        let volume = self.pricing.volume();
        let total = self.pricing.total_cost();
        if volume > 0.0 && volume.is_finite() && total.is_finite() {
            Some(total / volume)
        } else {
            None
        }
    }

    /// Cost of one millilitre; `None` for counted units or unpriceable stock
    pub fn cost_per_ml(&self) -> Option<f64> {
        if self.unit.is_counted() {
            return None;
        }
        self.cost_per_unit()
    }

    /// Case-insensitive name comparison used for every lookup
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Drinks, ice and menus
// ============================================================================

/// A flat surcharge added to every drink served with this ice
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IceType {
    pub name: String,
    pub cost: f64,
}

impl IceType {
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

/// A drink on the list, priced tax-inclusive
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Drink {
    pub id: Uuid,
    pub name: String,
    pub recipe: Vec<RecipeLine>,
    #[serde(default)]
    pub ice_type: String,
    pub price: f64,
    #[serde(default)]
    pub style: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Drink {
    pub fn new(
        name: impl Into<String>,
        recipe: Vec<RecipeLine>,
        ice_type: impl Into<String>,
        price: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            recipe,
            ice_type: ice_type.into(),
            price,
            style: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The recipe in its comma-separated text form
    pub fn recipe_text(&self) -> String {
        format_recipe(&self.recipe)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A named, ordered selection of drinks
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Menu {
    pub id: Uuid,
    pub name: String,
    pub drinks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            drinks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a drink unless it is already listed; returns whether it was added
    pub fn add_drink(&mut self, id: Uuid) -> bool {
        if self.drinks.contains(&id) {
            return false;
        }
        self.drinks.push(id);
        self.updated_at = Utc::now();
        true
    }

    pub fn remove_drink(&mut self, id: Uuid) -> bool {
        let before = self.drinks.len();
        self.drinks.retain(|d| *d != id);
        let removed = self.drinks.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

// ============================================================================
// Users
// ============================================================================

/// Owner of a set of records. Doubles as a directory name on disk.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    const MAX_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Unauthorized("no user id given".into()));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(Error::Unauthorized(format!(
                "user id longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Unauthorized(format!(
                "user id '{}' may only contain letters, digits, '-' and '_'",
                raw
            )));
        }
        Ok(UserId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        UserId::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
