//! Recipe lines and the comma-separated recipe text format.
//!
//! A recipe is written as `"<amount> <unit> <ingredient name>"` entries
//! joined by commas, e.g. `"4 cl Vodka, 10 cl Soda Water"`. Everything after
//! the unit is the ingredient name, so names may contain spaces.

use crate::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One ingredient quantity in a drink
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecipeLine {
    pub amount: f64,
    pub unit: Unit,
    pub ingredient: String,
}

impl RecipeLine {
    pub fn new(amount: f64, unit: Unit, ingredient: impl Into<String>) -> Self {
        Self {
            amount,
            unit,
            ingredient: ingredient.into(),
        }
    }
}

impl fmt::Display for RecipeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            format_amount(self.amount),
            self.unit,
            self.ingredient
        )
    }
}

/// Why a recipe entry was rejected. `entry` is 1-based.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RecipeError {
    #[error("entry {entry} is empty")]
    EmptyEntry { entry: usize },

    #[error("entry {entry} '{text}' needs an amount, a unit and an ingredient name")]
    MissingParts { entry: usize, text: String },

    #[error("entry {entry}: '{amount}' is not a valid amount")]
    InvalidAmount { entry: usize, amount: String },

    #[error("entry {entry}: unknown unit '{unit}' (expected ml, cl, oz, piece or dash)")]
    UnknownUnit { entry: usize, unit: String },
}

/// Parse recipe text into typed lines, reporting the first bad entry.
///
/// Entries are separated by commas; surrounding whitespace is ignored.
/// Blank input is an empty recipe.
pub fn parse_recipe(text: &str) -> Result<Vec<RecipeLine>, RecipeError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    text.split(',')
        .enumerate()
        .map(|(idx, raw)| parse_entry(idx + 1, raw.trim()))
        .collect()
}

fn parse_entry(entry: usize, text: &str) -> Result<RecipeLine, RecipeError> {
    if text.is_empty() {
        return Err(RecipeError::EmptyEntry { entry });
    }

    let mut parts = text.split_whitespace();
    let (amount, unit) = match (parts.next(), parts.next()) {
        (Some(a), Some(u)) => (a, u),
        _ => {
            return Err(RecipeError::MissingParts {
                entry,
                text: text.to_string(),
            })
        }
    };
    let name = parts.collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(RecipeError::MissingParts {
            entry,
            text: text.to_string(),
        });
    }

    let amount_value = amount
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
        .ok_or_else(|| RecipeError::InvalidAmount {
            entry,
            amount: amount.to_string(),
        })?;

    let unit = Unit::parse(unit).ok_or_else(|| RecipeError::UnknownUnit {
        entry,
        unit: unit.to_string(),
    })?;

    Ok(RecipeLine::new(amount_value, unit, name))
}

/// Render lines back into recipe text
pub fn format_recipe(lines: &[RecipeLine]) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whole amounts print without a fractional part ("4", not "4.0")
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}
