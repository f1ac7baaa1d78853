//! Integration tests for the streamline binary.
//!
//! These tests verify end-to-end behavior including:
//! - Ad-hoc recipe costing
//! - Ingredient, drink and menu management
//! - Reports and CSV export
//! - Settings persistence and per-user isolation

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI pointed at an isolated data dir and config file
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("streamline"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn add_vodka(dir: &Path) {
    cli(dir)
        .args(["ingredient", "add", "Vodka", "--cost", "250", "--volume", "700", "--unit", "ml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added ingredient 'Vodka'"));
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Drink menu costing for bars and restaurants",
        ));
}

#[test]
fn test_cost_vodka_with_cubes() {
    let temp_dir = setup_test_dir();
    add_vodka(temp_dir.path());

    cli(temp_dir.path())
        .args(["cost", "50 ml Vodka", "--ice", "Cubes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost: 19.86 SEK"));
}

#[test]
fn test_cost_with_price_shows_profit() {
    let temp_dir = setup_test_dir();
    add_vodka(temp_dir.path());

    // 125 inc. tax = 100 net; cost 19.857
    cli(temp_dir.path())
        .args(["cost", "50 ml Vodka", "--ice", "Cubes", "--price", "125"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profit: 80.14 SEK"))
        .stdout(predicate::str::contains("CoG: 19.9%"));
}

#[test]
fn test_cost_unknown_ingredient_is_zero_with_warning() {
    let temp_dir = setup_test_dir();
    add_vodka(temp_dir.path());

    cli(temp_dir.path())
        .args(["cost", "4 cl Mezcal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost: 0.00 SEK"))
        .stderr(predicate::str::contains("'Mezcal' is not in stock"));
}

#[test]
fn test_centilitre_ingredient_volume_is_millilitres() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["ingredient", "add", "Soda Water", "--unit", "cl", "--cost", "15", "--volume", "100"])
        .assert()
        .success();

    // 0.15 per ml, 10 cl = 100 ml
    cli(dir)
        .args(["cost", "10 cl Soda Water"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost: 15.00 SEK"));

    cli(dir)
        .args(["ingredient", "show", "soda water"])
        .assert()
        .success()
        .stdout(predicate::str::contains("for 100 ml"))
        .stdout(predicate::str::contains("Cost per ml: 0.15 SEK"));
}

#[test]
fn test_info_logs_hidden_by_default() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .env_remove("RUST_LOG")
        .args(["ingredient", "add", "Gin", "--cost", "300", "--volume", "700"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Stored Ingredient").not());

    cli(temp_dir.path())
        .env("RUST_LOG", "info")
        .args(["ingredient", "add", "Rum", "--cost", "250", "--volume", "700"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Stored Ingredient"));
}

#[test]
fn test_bad_recipe_is_rejected() {
    let temp_dir = setup_test_dir();
    add_vodka(temp_dir.path());

    cli(temp_dir.path())
        .args(["drink", "add", "Broken", "--recipe", "four cl Vodka", "--price", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Recipe error"))
        .stderr(predicate::str::contains("'four' is not a valid amount"));

    cli(temp_dir.path())
        .args(["drink", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No drinks yet."));
}

#[test]
fn test_duplicate_ingredient_rejected() {
    let temp_dir = setup_test_dir();
    add_vodka(temp_dir.path());

    cli(temp_dir.path())
        .args(["ingredient", "add", "vodka", "--cost", "199", "--volume", "700"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ingredient already exists: Vodka"));
}

#[test]
fn test_house_made_ingredient() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "ingredient", "add", "Simple Syrup", "--part", "Sugar=20", "--part", "Water=0",
            "--yield", "1000", "--category", "Syrup",
        ])
        .assert()
        .success();

    cli(temp_dir.path())
        .args(["ingredient", "show", "simple syrup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("House-made, yields ~1000 ml"))
        .stdout(predicate::str::contains("Cost per ml: 0.02 SEK"));

    cli(temp_dir.path())
        .args(["cost", "20 ml Simple Syrup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost: 0.40 SEK"));
}

#[test]
fn test_menu_report_and_csv() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    add_vodka(dir);

    cli(dir)
        .args(["ingredient", "add", "Lime", "--cost", "12", "--volume", "4", "--unit", "piece"])
        .assert()
        .success();

    cli(dir)
        .args([
            "drink", "add", "Vodka Lime", "--recipe", "5 cl Vodka, 1 piece Lime", "--price",
            "150", "--ice", "Cubes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added drink 'Vodka Lime'"));

    cli(dir)
        .args(["drink", "add", "Double", "--recipe", "8 cl Vodka", "--price", "100"])
        .assert()
        .success();

    cli(dir).args(["menu", "create", "Summer"]).assert().success();
    cli(dir)
        .args(["menu", "add-drink", "Summer", "vodka lime"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 'vodka lime' to 'Summer'"));

    let csv_path = dir.join("exports").join("summer.csv");
    cli(dir)
        .args(["report", "--menu", "summer", "--csv"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Summer"))
        .stdout(predicate::str::contains("Vodka Lime"))
        .stdout(predicate::str::contains("Double").not())
        .stdout(predicate::str::contains("Wrote 1 rows"));

    let csv_content = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert!(csv_content.starts_with("name,price,cost,profit,cog_percent,meets_goal,error"));
    // 50 ml vodka 17.86 + lime 3 + cubes 2
    assert!(csv_content.contains("Vodka Lime,150.0,22.86,97.14"));

    // Report over everything flags the expensive double
    cli(dir)
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 drink(s) over the CoG goal"));
}

#[test]
fn test_drink_show_breakdown() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    add_vodka(dir);

    cli(dir)
        .args(["drink", "add", "Vodka Rocks", "--recipe", "50 ml Vodka", "--price", "125", "--ice", "Cubes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost 19.86 SEK"));

    cli(dir)
        .args(["drink", "show", "VODKA ROCKS"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recipe: 50 ml Vodka"))
        .stdout(predicate::str::contains("17.86"))
        .stdout(predicate::str::contains("Profit: 80.14 SEK"));
}

#[test]
fn test_drink_edit_and_remove_updates_menu() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    add_vodka(dir);

    cli(dir)
        .args(["drink", "add", "Shot", "--recipe", "4 cl Vodka", "--price", "60"])
        .assert()
        .success();
    cli(dir)
        .args(["drink", "edit", "shot", "--price", "70", "--name", "Vodka Shot", "--style", "Shot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated drink 'Vodka Shot'"));

    cli(dir).args(["menu", "create", "Late"]).assert().success();
    cli(dir)
        .args(["menu", "add-drink", "Late", "Vodka Shot"])
        .assert()
        .success();
    cli(dir)
        .args(["menu", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 drinks"));

    cli(dir)
        .args(["drink", "remove", "vodka shot"])
        .assert()
        .success();
    cli(dir)
        .args(["menu", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 drinks"));
}

#[test]
fn test_missing_records_are_not_found() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["drink", "show", "Nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Drink not found: Nothing"));

    cli(temp_dir.path())
        .args(["report", "--menu", "Nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Menu not found"));
}

#[test]
fn test_invalid_user_is_unauthorized() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["--user", "../../etc", "ingredient", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized"));
}

#[test]
fn test_users_are_isolated() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "north", "ingredient", "add", "Gin", "--cost", "300", "--volume", "70", "--unit", "cl"])
        .assert()
        .success();

    cli(dir)
        .args(["--user", "south", "ingredient", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No ingredients yet."));

    cli(dir)
        .args(["--user", "north", "ingredient", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gin"));

    let stored = fs::read_to_string(dir.join("data/users/north/ingredients.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(value[0]["name"], "Gin");
    assert_eq!(value[0]["unit"], "cl");
    assert_eq!(value[0]["pricing"]["kind"], "container");
}

#[test]
fn test_settings_persist() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["settings", "set-tax", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved"));
    cli(dir)
        .args(["settings", "add-ice", "Sphere", "9"])
        .assert()
        .success();
    cli(dir)
        .args(["settings", "set-currency", "eur"])
        .assert()
        .success();

    cli(dir)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tax rate:  50%"))
        .stdout(predicate::str::contains("Currency:  EUR"))
        .stdout(predicate::str::contains("Sphere"));

    // 150 inc. 50% tax = 100 net
    add_vodka(dir);
    cli(dir)
        .args(["cost", "70 ml Vodka", "--ice", "Sphere", "--price", "150"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cost: 34.00 EUR"))
        .stdout(predicate::str::contains("Profit: 66.00 EUR"));
}

#[test]
fn test_invalid_setting_rejected() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["settings", "set-goal", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CoG goal"));

    assert!(!temp_dir.path().join("config.toml").exists());
}

#[test]
fn test_check_reports_unpriceable_drinks() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    add_vodka(dir);

    cli(dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No problems found"));

    cli(dir)
        .args(["drink", "add", "Mule", "--recipe", "5 cl Vodka, 10 cl Ginger Beer", "--price", "140"])
        .assert()
        .success()
        .stderr(predicate::str::contains("cannot price 'Mule'"));

    cli(dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Ginger Beer' is not in stock"));
}
