//! Ingredient lookup and the built-in defaults for ice types and drink styles.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Ice types offered before the user configures their own
static DEFAULT_ICE_TYPES: Lazy<Vec<IceType>> = Lazy::new(|| {
    vec![
        IceType::new("None", 0.0),
        IceType::new("Cubes", 2.0),
        IceType::new("Crushed", 3.0),
    ]
});

static DEFAULT_DRINK_STYLES: Lazy<Vec<String>> = Lazy::new(|| {
    ["Highball", "Sour", "Stirred", "Shot"]
        .iter()
        .map(|s| s.to_string())
        .collect()
});

pub fn default_ice_types() -> &'static [IceType] {
    &DEFAULT_ICE_TYPES
}

pub fn default_drink_styles() -> &'static [String] {
    &DEFAULT_DRINK_STYLES
}

/// Case-insensitive index over a user's ingredients
#[derive(Clone, Debug)]
pub struct IngredientCatalog<'a> {
    ingredients: &'a [Ingredient],
    by_name: HashMap<String, usize>,
}

impl<'a> IngredientCatalog<'a> {
    /// Build the index. On duplicate names the first ingredient wins.
    pub fn new(ingredients: &'a [Ingredient]) -> Self {
        let mut by_name = HashMap::with_capacity(ingredients.len());
        for (idx, ingredient) in ingredients.iter().enumerate() {
            by_name.entry(ingredient.name.to_lowercase()).or_insert(idx);
        }
        Self {
            ingredients,
            by_name,
        }
    }

    pub fn find(&self, name: &str) -> Option<&'a Ingredient> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.ingredients[idx])
    }

    pub fn ingredients(&self) -> &'a [Ingredient] {
        self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Validate the stock and return a list of problems (empty when clean)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen: HashMap<String, &str> = HashMap::new();

        for ingredient in self.ingredients {
            let name = ingredient.name.trim();
            if name.is_empty() {
                errors.push(format!("Ingredient {} has an empty name", ingredient.id));
                continue;
            }

            match seen.get(&name.to_lowercase()) {
                Some(first) => errors.push(format!(
                    "Ingredient '{}' duplicates '{}' (names are case-insensitive)",
                    ingredient.name, first
                )),
                None => {
                    seen.insert(name.to_lowercase(), &ingredient.name);
                }
            }

            errors.extend(validate_ingredient(ingredient));
        }

        errors
    }
}

/// Problems with a single ingredient's pricing
pub fn validate_ingredient(ingredient: &Ingredient) -> Vec<String> {
    let mut errors = Vec::new();
    match &ingredient.pricing {
        IngredientPricing::Container {
            cost_per_container,
            container_volume,
        } => {
            if !(*container_volume > 0.0) {
                errors.push(format!(
                    "Ingredient '{}': container volume {} must be positive",
                    ingredient.name, container_volume
                ));
            }
            if !(*cost_per_container >= 0.0) {
                errors.push(format!(
                    "Ingredient '{}': container cost {} must not be negative",
                    ingredient.name, cost_per_container
                ));
            }
        }
        IngredientPricing::Complex {
            parts,
            estimated_yield,
        } => {
            if !(*estimated_yield > 0.0) {
                errors.push(format!(
                    "Ingredient '{}': estimated yield {} must be positive",
                    ingredient.name, estimated_yield
                ));
            }
            if parts.is_empty() {
                errors.push(format!(
                    "Ingredient '{}': house-made ingredient has no parts",
                    ingredient.name
                ));
            }
            for part in parts {
                if !(part.total_cost >= 0.0) {
                    errors.push(format!(
                        "Ingredient '{}': part '{}' cost {} must not be negative",
                        ingredient.name, part.name, part.total_cost
                    ));
                }
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> Vec<Ingredient> {
        vec![
            Ingredient::container("Vodka", Unit::Ml, 250.0, 700.0),
            Ingredient::container("Soda Water", Unit::Cl, 15.0, 100.0),
            Ingredient::container("Lime", Unit::Piece, 12.0, 4.0),
        ]
    }

    #[test]
    fn test_find_ignores_case() {
        let stock = stock();
        let catalog = IngredientCatalog::new(&stock);
        assert_eq!(catalog.find("vodka").unwrap().name, "Vodka");
        assert_eq!(catalog.find("SODA WATER").unwrap().name, "Soda Water");
        assert!(catalog.find("Gin").is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_default_stock_validates() {
        let stock = stock();
        let errors = IngredientCatalog::new(&stock).validate();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_validate_flags_duplicates_and_bad_volumes() {
        let mut stock = stock();
        stock.push(Ingredient::container("VODKA", Unit::Ml, 200.0, 700.0));
        stock.push(Ingredient::container("Tonic", Unit::Ml, 20.0, 0.0));
        stock.push(Ingredient::new(
            "Syrup",
            Unit::Ml,
            IngredientPricing::Complex {
                parts: vec![],
                estimated_yield: 0.0,
            },
        ));

        let errors = IngredientCatalog::new(&stock).validate();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("duplicates 'Vodka'")));
        assert!(errors.iter().any(|e| e.contains("container volume 0")));
        assert!(errors.iter().any(|e| e.contains("estimated yield 0")));
        assert!(errors.iter().any(|e| e.contains("no parts")));
    }

    #[test]
    fn test_first_duplicate_wins_lookup() {
        let stock = vec![
            Ingredient::container("Gin", Unit::Ml, 300.0, 700.0),
            Ingredient::container("gin", Unit::Ml, 100.0, 700.0),
        ];
        let catalog = IngredientCatalog::new(&stock);
        assert_eq!(catalog.find("GIN").unwrap().name, "Gin");
    }

    #[test]
    fn test_defaults() {
        assert!(default_ice_types().iter().any(|i| i.name == "Cubes"));
        assert_eq!(default_drink_styles().len(), 4);
    }
}
