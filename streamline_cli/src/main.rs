use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use streamline_core::report::MenuReport;
use streamline_core::*;

#[derive(Parser)]
#[command(name = "streamline")]
#[command(about = "Drink menu costing for bars and restaurants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User whose records to work on
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cost an ad-hoc recipe such as "4 cl Vodka, 10 cl Soda Water"
    Cost {
        recipe: String,

        /// Ice type name (exact match)
        #[arg(long, default_value = "")]
        ice: String,

        /// Tax-inclusive price, to also show profit and CoG
        #[arg(long)]
        price: Option<f64>,
    },

    /// Manage ingredients
    #[command(subcommand)]
    Ingredient(IngredientCommand),

    /// Manage drinks
    #[command(subcommand)]
    Drink(DrinkCommand),

    /// Manage menus
    #[command(subcommand)]
    Menu(MenuCommand),

    /// Cost, profit and CoG for all drinks or one menu
    Report {
        /// Only drinks on this menu
        #[arg(long)]
        menu: Option<String>,

        /// Also write the rows to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show or change business settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Check stock and settings for problems
    Check,
}

#[derive(Subcommand)]
enum IngredientCommand {
    /// Add a bottled or house-made ingredient
    Add {
        name: String,
        #[command(flatten)]
        fields: IngredientFields,
    },
    /// Change an existing ingredient
    Edit {
        /// Name or id
        key: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: IngredientFields,
    },
    List,
    Show {
        key: String,
    },
    Remove {
        key: String,
    },
}

#[derive(Args)]
struct IngredientFields {
    /// Unit recipes use for it (ml, cl, oz, piece, dash)
    #[arg(long, value_parser = parse_unit)]
    unit: Option<Unit>,

    /// Price of one container
    #[arg(long)]
    cost: Option<f64>,

    /// Container volume in ml, or item count for piece/dash
    #[arg(long)]
    volume: Option<f64>,

    /// House-made part as NAME=COST (repeatable)
    #[arg(long = "part", value_parser = parse_part)]
    parts: Vec<SubIngredient>,

    /// Estimated yield of a house-made batch, in ml or items
    #[arg(long = "yield")]
    estimated_yield: Option<f64>,

    #[arg(long)]
    category: Option<String>,
}

#[derive(Subcommand)]
enum DrinkCommand {
    /// Add a drink with a recipe such as "4 cl Vodka, 10 cl Soda Water"
    Add {
        name: String,
        #[arg(long)]
        recipe: String,
        /// Tax-inclusive price
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        ice: String,
        #[arg(long)]
        style: Option<String>,
    },
    /// Change an existing drink
    Edit {
        key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        recipe: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        ice: Option<String>,
        #[arg(long)]
        style: Option<String>,
    },
    List,
    /// Show a drink with its cost breakdown
    Show {
        key: String,
    },
    Remove {
        key: String,
    },
}

#[derive(Subcommand)]
enum MenuCommand {
    Create { name: String },
    AddDrink { menu: String, drink: String },
    RemoveDrink { menu: String, drink: String },
    List,
    Show { key: String },
    Remove { key: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    /// Tax rate as a fraction, e.g. 0.25
    SetTax { rate: f64 },
    SetCurrency { code: String },
    /// Target cost of goods in percent
    SetGoal { percent: f64 },
    /// Add an ice type or change its cost
    AddIce { name: String, cost: f64 },
}

/// What container volumes and per-unit costs are counted in
fn measure(unit: Unit) -> &'static str {
    if unit.is_counted() {
        unit.as_str()
    } else {
        Unit::Ml.as_str()
    }
}

fn parse_unit(s: &str) -> std::result::Result<Unit, String> {
    Unit::parse(s).ok_or_else(|| {
        let known: Vec<_> = Unit::ALL.iter().map(|u| u.as_str()).collect();
        format!("unknown unit '{}' (expected one of {})", s, known.join(", "))
    })
}

fn parse_part(s: &str) -> std::result::Result<SubIngredient, String> {
    let (name, cost) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("'{}' should look like NAME=COST", s))?;
    let total_cost = cost
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a valid cost", cost))?;
    Ok(SubIngredient {
        name: name.trim().to_string(),
        total_cost,
    })
}

fn main() -> ExitCode {
    // Initialize logging
    streamline_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Resolved paths, user and settings for one invocation
struct Context {
    office: Backoffice<JsonStore>,
    user: UserId,
    config: Config,
    config_path: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        tracing::info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let user = UserId::parse(cli.user.as_deref().unwrap_or(&config.user.default_user))?;

    let ctx = Context {
        office: Backoffice::new(JsonStore::new(data_dir), config.settings.clone()),
        user,
        config,
        config_path,
    };

    match cli.command {
        Commands::Cost { recipe, ice, price } => cmd_cost(&ctx, &recipe, &ice, price),
        Commands::Ingredient(cmd) => cmd_ingredient(&ctx, cmd),
        Commands::Drink(cmd) => cmd_drink(&ctx, cmd),
        Commands::Menu(cmd) => cmd_menu(&ctx, cmd),
        Commands::Report { menu, csv } => cmd_report(&ctx, menu.as_deref(), csv),
        Commands::Settings(cmd) => cmd_settings(ctx, cmd),
        Commands::Check => cmd_check(&ctx),
    }
}

fn cmd_cost(ctx: &Context, recipe: &str, ice: &str, price: Option<f64>) -> Result<()> {
    let settings = ctx.office.settings();
    let stock = ctx.office.ingredients(&ctx.user)?;
    let cost = legacy_cost(recipe, ice, &stock, &settings.ice_types);

    println!("Cost: {:.2} {}", cost, settings.currency);
    if let Some(price) = price {
        println!(
            "Profit: {:.2} {}",
            pricing::profit(price, settings.tax_rate, cost),
            settings.currency
        );
        println!(
            "CoG: {}",
            format_percent(pricing::cog_percent(cost, price, settings.tax_rate))
        );
    }

    // Point out what the lenient calculator silently ignored
    if let Ok(lines) = parse_recipe(recipe) {
        let catalog = IngredientCatalog::new(&stock);
        for line in &lines {
            if let Err(e) = pricing::line_cost(line, &catalog) {
                eprintln!("warning: {}", e);
            }
        }
    }
    Ok(())
}

fn apply_fields(ingredient: &mut Ingredient, fields: IngredientFields) -> Result<()> {
    if let Some(unit) = fields.unit {
        ingredient.unit = unit;
    }
    if let Some(category) = fields.category {
        ingredient.category = category;
    }

    if !fields.parts.is_empty() || fields.estimated_yield.is_some() {
        if fields.cost.is_some() || fields.volume.is_some() {
            return Err(Error::Validation(
                "use either --cost/--volume or --part/--yield, not both".into(),
            ));
        }
        let (mut parts, mut estimated_yield) = match &ingredient.pricing {
            IngredientPricing::Complex {
                parts,
                estimated_yield,
            } => (parts.clone(), *estimated_yield),
            IngredientPricing::Container { .. } => (Vec::new(), 0.0),
        };
        if !fields.parts.is_empty() {
            parts = fields.parts;
        }
        if let Some(y) = fields.estimated_yield {
            estimated_yield = y;
        }
        ingredient.pricing = IngredientPricing::Complex {
            parts,
            estimated_yield,
        };
    } else if fields.cost.is_some() || fields.volume.is_some() {
        let (mut cost, mut volume) = match &ingredient.pricing {
            IngredientPricing::Container {
                cost_per_container,
                container_volume,
            } => (*cost_per_container, *container_volume),
            IngredientPricing::Complex { .. } => (0.0, 0.0),
        };
        if let Some(c) = fields.cost {
            cost = c;
        }
        if let Some(v) = fields.volume {
            volume = v;
        }
        ingredient.pricing = IngredientPricing::Container {
            cost_per_container: cost,
            container_volume: volume,
        };
    }
    Ok(())
}

fn cmd_ingredient(ctx: &Context, cmd: IngredientCommand) -> Result<()> {
    let office = &ctx.office;
    let currency = &office.settings().currency;

    match cmd {
        IngredientCommand::Add { name, fields } => {
            let mut ingredient = Ingredient::container(name, Unit::Ml, 0.0, 0.0);
            apply_fields(&mut ingredient, fields)?;
            let saved = office.save_ingredient(&ctx.user, ingredient)?;
            println!("✓ Added ingredient '{}'", saved.name);
        }
        IngredientCommand::Edit { key, name, fields } => {
            let mut ingredient = office.ingredient(&ctx.user, &key)?;
            if let Some(name) = name {
                ingredient.name = name;
            }
            apply_fields(&mut ingredient, fields)?;
            let saved = office.save_ingredient(&ctx.user, ingredient)?;
            println!("✓ Updated ingredient '{}'", saved.name);
        }
        IngredientCommand::List => {
            let stock = office.ingredients(&ctx.user)?;
            if stock.is_empty() {
                println!("No ingredients yet.");
            }
            for ingredient in &stock {
                println!(
                    "  {:<24} {:>10} / {:<5} {}",
                    ingredient.name,
                    format_money(ingredient.cost_per_unit()),
                    measure(ingredient.unit),
                    ingredient.category
                );
            }
        }
        IngredientCommand::Show { key } => {
            let ingredient = office.ingredient(&ctx.user, &key)?;
            println!("{}", ingredient.name);
            println!("  Id:       {}", ingredient.id);
            if !ingredient.category.is_empty() {
                println!("  Category: {}", ingredient.category);
            }
            match &ingredient.pricing {
                IngredientPricing::Container {
                    cost_per_container,
                    container_volume,
                } => {
                    println!(
                        "  Container: {:.2} {} for {} {}",
                        cost_per_container,
                        currency,
                        container_volume,
                        measure(ingredient.unit)
                    );
                }
                IngredientPricing::Complex {
                    parts,
                    estimated_yield,
                } => {
                    println!(
                        "  House-made, yields ~{} {}",
                        estimated_yield,
                        measure(ingredient.unit)
                    );
                    for part in parts {
                        println!("    → {:<20} {:.2} {}", part.name, part.total_cost, currency);
                    }
                }
            }
            println!(
                "  Cost per {}: {} {}",
                measure(ingredient.unit),
                format_money(ingredient.cost_per_unit()),
                currency
            );
        }
        IngredientCommand::Remove { key } => {
            let removed = office.remove_ingredient(&ctx.user, &key)?;
            println!("✓ Removed ingredient '{}'", removed.name);
        }
    }
    Ok(())
}

fn cmd_drink(ctx: &Context, cmd: DrinkCommand) -> Result<()> {
    let office = &ctx.office;
    let currency = &office.settings().currency;

    match cmd {
        DrinkCommand::Add {
            name,
            recipe,
            price,
            ice,
            style,
        } => {
            let mut drink = Drink::new(name, parse_recipe(&recipe)?, ice, price);
            drink.style = style;
            let saved = office.save_drink(&ctx.user, drink)?;
            println!("✓ Added drink '{}'", saved.name);
            report_pricing(ctx, &saved.name);
        }
        DrinkCommand::Edit {
            key,
            name,
            recipe,
            price,
            ice,
            style,
        } => {
            let mut drink = office.drink(&ctx.user, &key)?;
            if let Some(name) = name {
                drink.name = name;
            }
            if let Some(recipe) = recipe {
                drink.recipe = parse_recipe(&recipe)?;
            }
            if let Some(price) = price {
                drink.price = price;
            }
            if let Some(ice) = ice {
                drink.ice_type = ice;
            }
            if let Some(style) = style {
                drink.style = Some(style).filter(|s| !s.is_empty());
            }
            let saved = office.save_drink(&ctx.user, drink)?;
            println!("✓ Updated drink '{}'", saved.name);
            report_pricing(ctx, &saved.name);
        }
        DrinkCommand::List => {
            let report = office.report(&ctx.user, None)?;
            if report.rows.is_empty() {
                println!("No drinks yet.");
            }
            print_rows(&report);
        }
        DrinkCommand::Show { key } => {
            let drink = office.drink(&ctx.user, &key)?;
            println!("{}", drink.name);
            println!("  Id:     {}", drink.id);
            println!("  Recipe: {}", drink.recipe_text());
            if !drink.ice_type.is_empty() {
                println!("  Ice:    {}", drink.ice_type);
            }
            if let Some(style) = &drink.style {
                println!("  Style:  {}", style);
            }
            println!("  Price:  {:.2} {}", drink.price, currency);

            match office.price(&ctx.user, &key) {
                Ok(pricing) => {
                    println!();
                    for line in &pricing.breakdown.lines {
                        println!("    {:<30} {:>8.2}", line.line.to_string(), line.cost);
                    }
                    if pricing.breakdown.ice_cost > 0.0 {
                        println!("    {:<30} {:>8.2}", "ice", pricing.breakdown.ice_cost);
                    }
                    println!();
                    println!("  Cost:   {:.2} {}", pricing.cost, currency);
                    println!("  Profit: {:.2} {}", pricing.profit, currency);
                    println!("  CoG:    {}", format_percent(pricing.cog_percent));
                }
                Err(e) => println!("  Cannot price: {}", e),
            }
        }
        DrinkCommand::Remove { key } => {
            let removed = office.remove_drink(&ctx.user, &key)?;
            println!("✓ Removed drink '{}'", removed.name);
        }
    }
    Ok(())
}

/// Print cost and profit after a change, or why they can't be computed
fn report_pricing(ctx: &Context, drink: &str) {
    let currency = &ctx.office.settings().currency;
    match ctx.office.price(&ctx.user, drink) {
        Ok(pricing) => println!(
            "  Cost {:.2} {}, profit {:.2} {}, CoG {}",
            pricing.cost,
            currency,
            pricing.profit,
            currency,
            format_percent(pricing.cog_percent)
        ),
        Err(e) => eprintln!("warning: cannot price '{}': {}", drink, e),
    }
}

fn cmd_menu(ctx: &Context, cmd: MenuCommand) -> Result<()> {
    let office = &ctx.office;

    match cmd {
        MenuCommand::Create { name } => {
            let menu = office.create_menu(&ctx.user, &name)?;
            println!("✓ Created menu '{}'", menu.name);
        }
        MenuCommand::AddDrink { menu, drink } => {
            if office.add_to_menu(&ctx.user, &menu, &drink)? {
                println!("✓ Added '{}' to '{}'", drink, menu);
            } else {
                println!("'{}' is already on '{}'", drink, menu);
            }
        }
        MenuCommand::RemoveDrink { menu, drink } => {
            if office.remove_from_menu(&ctx.user, &menu, &drink)? {
                println!("✓ Removed '{}' from '{}'", drink, menu);
            } else {
                println!("'{}' is not on '{}'", drink, menu);
            }
        }
        MenuCommand::List => {
            let menus = office.menus(&ctx.user)?;
            if menus.is_empty() {
                println!("No menus yet.");
            }
            for menu in menus {
                println!("  {:<24} {} drinks", menu.name, menu.drinks.len());
            }
        }
        MenuCommand::Show { key } => {
            let report = office.report(&ctx.user, Some(&key))?;
            print_report(&report);
        }
        MenuCommand::Remove { key } => {
            let menu = office.remove_menu(&ctx.user, &key)?;
            println!("✓ Removed menu '{}'", menu.name);
        }
    }
    Ok(())
}

fn cmd_report(ctx: &Context, menu: Option<&str>, csv: Option<PathBuf>) -> Result<()> {
    let report = ctx.office.report(&ctx.user, menu)?;
    print_report(&report);

    if let Some(path) = csv {
        let count = write_csv(&report, &path)?;
        println!("✓ Wrote {} rows to {}", count, path.display());
    }
    Ok(())
}

fn cmd_settings(ctx: Context, cmd: SettingsCommand) -> Result<()> {
    let mut config = ctx.config;

    match cmd {
        SettingsCommand::Show => {
            let s = &config.settings;
            println!("Currency:  {}", s.currency);
            println!("Tax rate:  {}%", s.tax_rate * 100.0);
            println!("CoG goal:  {}%", s.cog_goal_percent);
            println!("Ice types:");
            for ice in &s.ice_types {
                println!("  {:<12} {:.2}", ice.name, ice.cost);
            }
            println!("Drink styles: {}", s.drink_styles.join(", "));
            return Ok(());
        }
        SettingsCommand::SetTax { rate } => config.settings.tax_rate = rate,
        SettingsCommand::SetCurrency { code } => config.settings.currency = code.trim().to_uppercase(),
        SettingsCommand::SetGoal { percent } => config.settings.cog_goal_percent = percent,
        SettingsCommand::AddIce { name, cost } => {
            config.settings.upsert_ice_type(IceType::new(name.trim(), cost))
        }
    }

    config.save_to(&ctx.config_path)?;
    println!("✓ Settings saved to {}", ctx.config_path.display());
    Ok(())
}

fn cmd_check(ctx: &Context) -> Result<()> {
    let stock = ctx.office.ingredients(&ctx.user)?;
    let mut problems = IngredientCatalog::new(&stock).validate();
    problems.extend(ctx.office.settings().validate());

    let report = ctx.office.report(&ctx.user, None)?;
    problems.extend(
        report
            .unpriced()
            .map(|r| format!("Drink '{}': {}", r.name, r.error.as_deref().unwrap_or(""))),
    );

    if problems.is_empty() {
        println!("✓ No problems found");
        return Ok(());
    }

    for problem in &problems {
        eprintln!("  - {}", problem);
    }
    Err(Error::Validation(format!("{} problem(s) found", problems.len())))
}

fn print_rows(report: &MenuReport) {
    for row in &report.rows {
        match (row.cost, row.profit) {
            (Some(cost), Some(profit)) => println!(
                "  {:<24} price {:>8.2}  cost {:>7.2}  profit {:>8.2}  CoG {:>7}{}",
                row.name,
                row.price,
                cost,
                profit,
                format_percent(row.cog_percent),
                if row.meets_goal == Some(false) { "  !" } else { "" }
            ),
            _ => println!(
                "  {:<24} price {:>8.2}  cannot price: {}",
                row.name,
                row.price,
                row.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

fn print_report(report: &MenuReport) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", report.title);
    println!("╰─────────────────────────────────────────╯");
    println!();
    print_rows(report);
    println!();
    println!(
        "  Revenue (ex. tax): {:.2} {}",
        report.total_revenue_ex_tax, report.currency
    );
    println!("  Cost:              {:.2} {}", report.total_cost, report.currency);
    println!(
        "  CoG:               {} (goal {}%)",
        format_percent(report.overall_cog_percent),
        report.cog_goal_percent
    );

    let over = report.over_goal().count();
    if over > 0 {
        println!("  {} drink(s) over the CoG goal", over);
    }
    let unpriced = report.unpriced().count();
    if unpriced > 0 {
        println!("  {} drink(s) could not be priced", unpriced);
    }
    println!();
}

fn format_money(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".into())
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "n/a".into())
}
