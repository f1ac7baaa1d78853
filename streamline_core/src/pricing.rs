//! Drink costing.
//!
//! Two entry points share the same arithmetic:
//!
//! - [`legacy_cost`] takes recipe text and never fails. Anything it cannot
//!   price (unknown ingredient, bad amount, zero volume) counts as zero.
//!   It exists for importing and checking old recipe strings.
//! - [`price_recipe`] / [`price_drink`] work on typed recipe lines and return
//!   a [`PricingError`] instead of guessing, plus a per-line breakdown.
//!
//! Recipe amounts are normalised to millilitres (`cl` ×10, `oz` ×29.5735)
//! and multiplied by the cost per ml, where container volumes and yields are
//! always in ml. Counted ingredients (`piece`, `dash`) are priced per item and
//! never converted.
//! The ice surcharge is looked up by exact, case-sensitive name.

use crate::catalog::IngredientCatalog;
use crate::config::Settings;
use crate::recipe::RecipeLine;
use crate::types::{Drink, IceType, Ingredient, Unit};

// ============================================================================
// Legacy text calculator
// ============================================================================

/// Total cost of a recipe string plus its ice surcharge. Never fails.
pub fn legacy_cost(
    recipe: &str,
    ice_type_name: &str,
    ingredients: &[Ingredient],
    ice_types: &[IceType],
) -> f64 {
    let catalog = IngredientCatalog::new(ingredients);

    let ingredient_cost: f64 = if recipe.is_empty() {
        0.0
    } else {
        recipe
            .split(", ")
            .map(|token| legacy_token_cost(token, &catalog))
            .sum()
    };

    ingredient_cost + ice_cost(ice_type_name, ice_types).unwrap_or(0.0)
}

fn legacy_token_cost(token: &str, catalog: &IngredientCatalog<'_>) -> f64 {
    let mut parts = token.split(' ');
    let (Some(amount), Some(unit)) = (parts.next(), parts.next()) else {
        tracing::trace!("Recipe token '{}' has too few parts", token);
        return 0.0;
    };
    let name = parts.collect::<Vec<_>>().join(" ");

    let amount = match amount.parse::<f64>() {
        Ok(a) if a.is_finite() => a,
        _ => {
            tracing::trace!("Recipe token '{}' has a non-numeric amount", token);
            return 0.0;
        }
    };

    let Some(ingredient) = catalog.find(&name) else {
        tracing::trace!("Recipe ingredient '{}' not in stock", name);
        return 0.0;
    };

    let volume = ingredient.pricing.volume();
    let divisor = if volume > 0.0 && volume.is_finite() {
        volume
    } else {
        1.0
    };
    let per_unit = ingredient.pricing.total_cost() / divisor;

    let cost = if ingredient.unit.is_counted() {
        amount * per_unit
    } else {
        let token_factor = Unit::parse(unit)
            .and_then(Unit::ml_factor)
            .unwrap_or(1.0);
        amount * token_factor * per_unit
    };

    if cost.is_finite() {
        cost
    } else {
        0.0
    }
}

/// Flat surcharge for the named ice type, if configured
pub fn ice_cost(name: &str, ice_types: &[IceType]) -> Option<f64> {
    ice_types
        .iter()
        .find(|ice| ice.name == name)
        .map(|ice| ice.cost)
        .filter(|cost| cost.is_finite())
}

// ============================================================================
// Typed calculator
// ============================================================================

/// Why a drink could not be priced
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("ingredient '{0}' is not in stock")]
    UnknownIngredient(String),

    #[error("ingredient '{0}' has no usable volume or yield")]
    ZeroVolume(String),

    #[error("negative amount {amount} of '{ingredient}'")]
    NegativeAmount { ingredient: String, amount: f64 },

    #[error("'{ingredient}' is measured by volume and cannot be used by the {unit}")]
    IncompatibleUnit { ingredient: String, unit: Unit },

    #[error("ice type '{0}' is not configured")]
    UnknownIceType(String),
}

/// Cost of one recipe line
#[derive(Clone, Debug, PartialEq)]
pub struct LineCost {
    pub line: RecipeLine,
    pub cost: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CostBreakdown {
    pub lines: Vec<LineCost>,
    pub ice_cost: f64,
    pub total: f64,
}

/// Price a single line against the stock
pub fn line_cost(
    line: &RecipeLine,
    catalog: &IngredientCatalog<'_>,
) -> Result<f64, PricingError> {
    if line.amount < 0.0 || !line.amount.is_finite() {
        return Err(PricingError::NegativeAmount {
            ingredient: line.ingredient.clone(),
            amount: line.amount,
        });
    }

    let ingredient = catalog
        .find(&line.ingredient)
        .ok_or_else(|| PricingError::UnknownIngredient(line.ingredient.clone()))?;

    let per_unit = ingredient
        .cost_per_unit()
        .ok_or_else(|| PricingError::ZeroVolume(ingredient.name.clone()))?;

    match (ingredient.unit.ml_factor(), line.unit.ml_factor()) {
        (None, _) => Ok(line.amount * per_unit),
        (Some(_), Some(used)) => Ok(line.amount * used * per_unit),
        (Some(_), None) => Err(PricingError::IncompatibleUnit {
            ingredient: ingredient.name.clone(),
            unit: line.unit,
        }),
    }
}

/// Price recipe lines plus ice. An empty ice name means no ice.
pub fn price_recipe(
    lines: &[RecipeLine],
    ice_type_name: &str,
    catalog: &IngredientCatalog<'_>,
    ice_types: &[IceType],
) -> Result<CostBreakdown, PricingError> {
    let lines = lines
        .iter()
        .map(|line| {
            line_cost(line, catalog).map(|cost| LineCost {
                line: line.clone(),
                cost,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ice_cost = if ice_type_name.is_empty() {
        0.0
    } else {
        ice_cost(ice_type_name, ice_types)
            .ok_or_else(|| PricingError::UnknownIceType(ice_type_name.to_string()))?
    };

    let total = lines.iter().map(|l| l.cost).sum::<f64>() + ice_cost;
    Ok(CostBreakdown {
        lines,
        ice_cost,
        total,
    })
}

// ============================================================================
// Profit and cost of goods
// ============================================================================

/// Price with tax removed; prices are entered tax-inclusive
pub fn price_ex_tax(price: f64, tax_rate: f64) -> f64 {
    price / (1.0 + tax_rate)
}

pub fn profit(price: f64, tax_rate: f64, cost: f64) -> f64 {
    price_ex_tax(price, tax_rate) - cost
}

/// Cost as a percentage of the pre-tax price; `None` for free drinks
pub fn cog_percent(cost: f64, price: f64, tax_rate: f64) -> Option<f64> {
    let net = price_ex_tax(price, tax_rate);
    if net > 0.0 && net.is_finite() {
        Some(cost / net * 100.0)
    } else {
        None
    }
}

/// Cost, profit and CoG of a drink
#[derive(Clone, Debug, PartialEq)]
pub struct DrinkPricing {
    pub breakdown: CostBreakdown,
    pub cost: f64,
    pub price_ex_tax: f64,
    pub profit: f64,
    pub cog_percent: Option<f64>,
}

pub fn price_drink(
    drink: &Drink,
    catalog: &IngredientCatalog<'_>,
    settings: &Settings,
) -> Result<DrinkPricing, PricingError> {
    let breakdown = price_recipe(&drink.recipe, &drink.ice_type, catalog, &settings.ice_types)?;
    let cost = breakdown.total;
    tracing::debug!("Priced '{}' at {:.2}", drink.name, cost);

    Ok(DrinkPricing {
        breakdown,
        cost,
        price_ex_tax: price_ex_tax(drink.price, settings.tax_rate),
        profit: profit(drink.price, settings.tax_rate, cost),
        cog_percent: cog_percent(cost, drink.price, settings.tax_rate),
    })
}
