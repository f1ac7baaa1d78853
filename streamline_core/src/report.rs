//! Cost, profit and cost-of-goods reports over a set of drinks.
//!
//! A drink that cannot be priced does not abort the report: its row carries
//! the pricing error instead of numbers, and it is left out of the totals.

use crate::catalog::IngredientCatalog;
use crate::config::Settings;
use crate::pricing::price_drink;
use crate::{Drink, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tempfile::NamedTempFile;

/// One row per drink
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrinkReport {
    pub name: String,
    pub price: f64,
    pub cost: Option<f64>,
    pub profit: Option<f64>,
    pub cog_percent: Option<f64>,
    pub meets_goal: Option<bool>,
    pub error: Option<String>,
}

impl DrinkReport {
    pub fn is_priced(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct MenuReport {
    pub title: String,
    pub currency: String,
    pub cog_goal_percent: f64,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<DrinkReport>,
    /// Sum of pre-tax prices of priced drinks
    pub total_revenue_ex_tax: f64,
    pub total_cost: f64,
    /// Cost of all priced drinks over their combined pre-tax price
    pub overall_cog_percent: Option<f64>,
}

impl MenuReport {
    pub fn build(
        title: impl Into<String>,
        drinks: &[Drink],
        catalog: &IngredientCatalog<'_>,
        settings: &Settings,
    ) -> Self {
        let mut rows = Vec::with_capacity(drinks.len());
        let mut total_revenue_ex_tax = 0.0;
        let mut total_cost = 0.0;

        for drink in drinks {
            let row = match price_drink(drink, catalog, settings) {
                Ok(pricing) => {
                    total_revenue_ex_tax += pricing.price_ex_tax;
                    total_cost += pricing.cost;
                    DrinkReport {
                        name: drink.name.clone(),
                        price: drink.price,
                        cost: Some(pricing.cost),
                        profit: Some(pricing.profit),
                        cog_percent: pricing.cog_percent,
                        meets_goal: pricing
                            .cog_percent
                            .map(|cog| cog <= settings.cog_goal_percent),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!("Cannot price '{}': {}", drink.name, e);
                    DrinkReport {
                        name: drink.name.clone(),
                        price: drink.price,
                        cost: None,
                        profit: None,
                        cog_percent: None,
                        meets_goal: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            rows.push(row);
        }

        let overall_cog_percent = if total_revenue_ex_tax > 0.0 {
            Some(total_cost / total_revenue_ex_tax * 100.0)
        } else {
            None
        };

        Self {
            title: title.into(),
            currency: settings.currency.clone(),
            cog_goal_percent: settings.cog_goal_percent,
            generated_at: Utc::now(),
            rows,
            total_revenue_ex_tax,
            total_cost,
            overall_cog_percent,
        }
    }

    pub fn unpriced(&self) -> impl Iterator<Item = &DrinkReport> {
        self.rows.iter().filter(|r| !r.is_priced())
    }

    /// Drinks whose CoG is above the goal
    pub fn over_goal(&self) -> impl Iterator<Item = &DrinkReport> {
        self.rows.iter().filter(|r| r.meets_goal == Some(false))
    }
}

/// CSV row with amounts rounded to cents
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    price: f64,
    cost: Option<f64>,
    profit: Option<f64>,
    cog_percent: Option<f64>,
    meets_goal: Option<bool>,
    error: Option<&'a str>,
}

impl<'a> From<&'a DrinkReport> for CsvRow<'a> {
    fn from(row: &'a DrinkReport) -> Self {
        CsvRow {
            name: &row.name,
            price: round2(row.price),
            cost: row.cost.map(round2),
            profit: row.profit.map(round2),
            cog_percent: row.cog_percent.map(round2),
            meets_goal: row.meets_goal,
            error: row.error.as_deref(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write the report rows as CSV, replacing `path` atomically
///
/// Returns the number of rows written.
pub fn write_csv(report: &MenuReport, path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp.as_file());

    for row in &report.rows {
        writer.serialize(CsvRow::from(row))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    file.sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::info!("Wrote {} report rows to {:?}", report.rows.len(), path);
    Ok(report.rows.len())
}
