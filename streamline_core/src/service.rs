//! Bar back-office operations over an injected [`Repository`].
//!
//! This is the layer front ends talk to. It enforces name uniqueness,
//! validates input before it is stored, maps missing records to
//! [`Error::NotFound`] and keeps menus consistent when drinks are removed.

use crate::catalog::{validate_ingredient, IngredientCatalog};
use crate::config::Settings;
use crate::pricing::{price_drink, DrinkPricing};
use crate::report::MenuReport;
use crate::store::{Record, Repository};
use crate::{Drink, Error, Ingredient, Menu, Result, UserId};
use uuid::Uuid;

/// Back-office operations for one repository and one set of settings
#[derive(Debug)]
pub struct Backoffice<S> {
    store: S,
    settings: Settings,
}

impl<S: Repository> Backoffice<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Find a record by id (if `key` is a UUID) or case-insensitive name
    fn lookup<R: Record>(&self, user: &UserId, key: &str) -> Result<R> {
        let found = match Uuid::parse_str(key.trim()) {
            Ok(id) => self.store.get::<R>(user, id)?,
            Err(_) => self.store.find_by_name::<R>(user, key.trim())?,
        };
        found.ok_or_else(|| Error::not_found(R::KIND, key.trim()))
    }

    /// Reject an empty name. Uniqueness is checked by the store when writing.
    fn check_name<R: Record>(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Validation(format!("{} name must not be empty", R::KIND)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ingredients
    // ------------------------------------------------------------------

    pub fn ingredients(&self, user: &UserId) -> Result<Vec<Ingredient>> {
        self.store.list(user)
    }

    pub fn ingredient(&self, user: &UserId, key: &str) -> Result<Ingredient> {
        self.lookup(user, key)
    }

    /// Store a new ingredient or save edits to an existing one
    pub fn save_ingredient(&self, user: &UserId, mut ingredient: Ingredient) -> Result<Ingredient> {
        ingredient.name = ingredient.name.trim().to_string();
        self.check_name::<Ingredient>(&ingredient.name)?;

        let errors = validate_ingredient(&ingredient);
        if !errors.is_empty() {
            return Err(Error::Validation(errors.join("; ")));
        }

        ingredient.touch();
        self.store.put_unique(user, &ingredient)?;
        Ok(ingredient)
    }

    /// Remove an ingredient. Drinks using it will no longer price.
    pub fn remove_ingredient(&self, user: &UserId, key: &str) -> Result<Ingredient> {
        let ingredient: Ingredient = self.lookup(user, key)?;
        self.store.delete::<Ingredient>(user, ingredient.id)?;

        let users: Vec<String> = self
            .drinks(user)?
            .into_iter()
            .filter(|d| d.recipe.iter().any(|l| ingredient.matches_name(&l.ingredient)))
            .map(|d| d.name)
            .collect();
        if !users.is_empty() {
            tracing::warn!(
                "Removed ingredient '{}' is still used by: {}",
                ingredient.name,
                users.join(", ")
            );
        }
        Ok(ingredient)
    }

    // ------------------------------------------------------------------
    // Drinks
    // ------------------------------------------------------------------

    pub fn drinks(&self, user: &UserId) -> Result<Vec<Drink>> {
        self.store.list(user)
    }

    pub fn drink(&self, user: &UserId, key: &str) -> Result<Drink> {
        self.lookup(user, key)
    }

    /// Store a new drink or save edits to an existing one
    pub fn save_drink(&self, user: &UserId, mut drink: Drink) -> Result<Drink> {
        drink.name = drink.name.trim().to_string();
        self.check_name::<Drink>(&drink.name)?;

        if !(drink.price >= 0.0 && drink.price.is_finite()) {
            return Err(Error::Validation(format!(
                "Drink '{}': price {} must be zero or positive",
                drink.name, drink.price
            )));
        }
        if !drink.ice_type.is_empty()
            && !self.settings.ice_types.iter().any(|i| i.name == drink.ice_type)
        {
            return Err(Error::Validation(format!(
                "Drink '{}': ice type '{}' is not configured",
                drink.name, drink.ice_type
            )));
        }
        if let Some(style) = &drink.style {
            if !self.settings.drink_styles.iter().any(|s| s == style) {
                return Err(Error::Validation(format!(
                    "Drink '{}': style '{}' is not configured",
                    drink.name, style
                )));
            }
        }

        drink.touch();
        self.store.put_unique(user, &drink)?;
        Ok(drink)
    }

    /// Remove a drink and take it off every menu
    pub fn remove_drink(&self, user: &UserId, key: &str) -> Result<Drink> {
        let drink: Drink = self.lookup(user, key)?;
        self.store.delete::<Drink>(user, drink.id)?;

        for mut menu in self.menus(user)? {
            if menu.remove_drink(drink.id) {
                self.store.put(user, &menu)?;
                tracing::debug!("Removed '{}' from menu '{}'", drink.name, menu.name);
            }
        }
        Ok(drink)
    }

    /// Cost, profit and CoG of a stored drink
    pub fn price(&self, user: &UserId, key: &str) -> Result<DrinkPricing> {
        let drink = self.drink(user, key)?;
        let stock = self.ingredients(user)?;
        let catalog = IngredientCatalog::new(&stock);
        Ok(price_drink(&drink, &catalog, &self.settings)?)
    }

    // ------------------------------------------------------------------
    // Menus
    // ------------------------------------------------------------------

    pub fn menus(&self, user: &UserId) -> Result<Vec<Menu>> {
        self.store.list(user)
    }

    pub fn menu(&self, user: &UserId, key: &str) -> Result<Menu> {
        self.lookup(user, key)
    }

    pub fn create_menu(&self, user: &UserId, name: &str) -> Result<Menu> {
        let menu = Menu::new(name.trim());
        self.check_name::<Menu>(&menu.name)?;
        self.store.put_unique(user, &menu)?;
        Ok(menu)
    }

    /// Add a drink to a menu; returns false if it was already there
    pub fn add_to_menu(&self, user: &UserId, menu_key: &str, drink_key: &str) -> Result<bool> {
        let mut menu: Menu = self.lookup(user, menu_key)?;
        let drink: Drink = self.lookup(user, drink_key)?;
        let added = menu.add_drink(drink.id);
        if added {
            self.store.put(user, &menu)?;
        }
        Ok(added)
    }

    pub fn remove_from_menu(&self, user: &UserId, menu_key: &str, drink_key: &str) -> Result<bool> {
        let mut menu: Menu = self.lookup(user, menu_key)?;
        let drink: Drink = self.lookup(user, drink_key)?;
        let removed = menu.remove_drink(drink.id);
        if removed {
            self.store.put(user, &menu)?;
        }
        Ok(removed)
    }

    pub fn remove_menu(&self, user: &UserId, key: &str) -> Result<Menu> {
        let menu: Menu = self.lookup(user, key)?;
        self.store.delete::<Menu>(user, menu.id)?;
        Ok(menu)
    }

    /// Drinks on a menu, in menu order. Dangling ids are skipped.
    pub fn menu_drinks(&self, user: &UserId, menu: &Menu) -> Result<Vec<Drink>> {
        let drinks = self.drinks(user)?;
        Ok(menu
            .drinks
            .iter()
            .filter_map(|id| drinks.iter().find(|d| d.id == *id).cloned())
            .collect())
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Report over one menu, or over every drink when `menu_key` is `None`
    pub fn report(&self, user: &UserId, menu_key: Option<&str>) -> Result<MenuReport> {
        let stock = self.ingredients(user)?;
        let catalog = IngredientCatalog::new(&stock);

        let (title, drinks) = match menu_key {
            Some(key) => {
                let menu = self.menu(user, key)?;
                let drinks = self.menu_drinks(user, &menu)?;
                (menu.name, drinks)
            }
            None => ("All drinks".to_string(), self.drinks(user)?),
        };

        Ok(MenuReport::build(title, &drinks, &catalog, &self.settings))
    }
}
