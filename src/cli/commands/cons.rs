//! `ldt cons` command - Consumable stock management
//!
//! The STATUS column is never read from disk: every listing recomputes it
//! from the current quantity, threshold, and expiry date against the
//! reference date (`--today`, defaulting to the local date).

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, format_short_id, load_record, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Lifecycle;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::consumable::{Consumable, ConsumableCategory, StockStatus};

#[derive(Subcommand, Debug)]
pub enum ConsCommands {
    /// List consumables with derived stock status
    List(ListArgs),

    /// Add a new consumable
    New(NewArgs),

    /// Show a consumable's details
    Show(ShowArgs),

    /// Edit a consumable in your editor
    Edit(EditArgs),

    /// Adjust quantity, expiry, or batch of a consumable
    Adjust(AdjustArgs),

    /// Soft-delete a consumable
    Delete(DeleteArgs),
}

/// Derived stock status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    InStock,
    LowStock,
    OutOfStock,
    Expired,
    ExpiringSoon,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Title,
    Quantity,
    Expiry,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by derived stock status
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Reference date for status computation (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub today: Option<chrono::NaiveDate>,

    /// Search in name, batch number, and supplier
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "created")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item name (required unless interactive)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Item category (consumable or accessory)
    #[arg(long, short = 'c', default_value = "consumable")]
    pub category: String,

    /// Quantity on hand
    #[arg(long, short = 'Q', default_value_t = 0)]
    pub quantity: u32,

    /// Low stock threshold
    #[arg(long, short = 'T', default_value_t = 0)]
    pub threshold: u32,

    /// Unit of measure (units, liters, kg, ...)
    #[arg(long)]
    pub unit: Option<String>,

    /// Batch or lot number
    #[arg(long)]
    pub batch: Option<String>,

    /// Expiry date of the current batch (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: Option<chrono::NaiveDate>,

    /// Supplier name
    #[arg(long)]
    pub supplier: Option<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Skip opening in editor
    #[arg(long)]
    pub no_edit: bool,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Consumable ID or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Consumable ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AdjustArgs {
    /// Consumable ID or short ID (@N)
    pub id: String,

    /// New quantity on hand
    #[arg(long, short = 'Q')]
    pub quantity: Option<u32>,

    /// New expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: Option<chrono::NaiveDate>,

    /// New batch or lot number
    #[arg(long)]
    pub batch: Option<String>,

    /// Reference date for the reported status (default: today)
    #[arg(long)]
    pub today: Option<chrono::NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Consumable ID or short ID (@N)
    pub id: String,
}

/// Run a consumable subcommand
pub fn run(cmd: ConsCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConsCommands::List(args) => run_list(args),
        ConsCommands::New(args) => run_new(args),
        ConsCommands::Show(args) => run_show(args),
        ConsCommands::Edit(args) => run_edit(args),
        ConsCommands::Adjust(args) => run_adjust(args),
        ConsCommands::Delete(args) => run_delete(args),
    }
}

fn style_status(status: StockStatus) -> console::StyledObject<String> {
    match status {
        StockStatus::InStock => style(status.to_string()).green(),
        StockStatus::LowStock | StockStatus::ExpiringSoon => style(status.to_string()).yellow(),
        StockStatus::OutOfStock | StockStatus::Expired => style(status.to_string()).red().bold(),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut items: Vec<Consumable> = loader::load_active(&project.entity_dir(EntityPrefix::Cons))?;

    let status_filter = match args.status {
        StatusFilter::InStock => Some(StockStatus::InStock),
        StatusFilter::LowStock => Some(StockStatus::LowStock),
        StatusFilter::OutOfStock => Some(StockStatus::OutOfStock),
        StatusFilter::Expired => Some(StockStatus::Expired),
        StatusFilter::ExpiringSoon => Some(StockStatus::ExpiringSoon),
        StatusFilter::All => None,
    };
    if let Some(want) = status_filter {
        items.retain(|c| c.stock_status(today) == want);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        items.retain(|c| {
            c.title.to_lowercase().contains(&needle)
                || c.batch_lot_number
                    .as_ref()
                    .is_some_and(|b| b.to_lowercase().contains(&needle))
                || c.supplier
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Title => items.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Quantity => items.sort_by_key(|c| c.quantity_available),
        SortField::Expiry => items.sort_by_key(|c| c.expiry_date),
        SortField::Created => items.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        items.reverse();
    }

    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    if items.is_empty() {
        println!("No consumables found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(items.iter().map(|c| c.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let mut rows = Vec::new();
            for c in &items {
                let mut row = serde_json::to_value(c).into_diagnostic()?;
                row["status"] = serde_json::Value::String(c.stock_status(today).to_string());
                rows.push(row);
            }
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&items).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,category,quantity,threshold,expiry,status");
            for c in &items {
                let short_id = short_ids.get_short_id(&c.id.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{}",
                    short_id,
                    c.id,
                    escape_csv(&c.title),
                    c.category,
                    c.quantity_available,
                    c.low_stock_threshold,
                    c.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
                    c.stock_status(today)
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<26} {:<12} {:>6} {:<12} {:<14}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("CATEGORY").bold(),
                style("QTY").bold(),
                style("EXPIRY").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(100));

            for c in &items {
                let short_id = short_ids.get_short_id(&c.id.to_string()).unwrap_or_default();
                println!(
                    "{:<8} {:<17} {:<26} {:<12} {:>6} {:<12} {:<14}",
                    style(short_id).cyan(),
                    format_short_id(&c.id),
                    truncate_str(&c.title, 24),
                    c.category,
                    c.quantity_available,
                    c.expiry_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    style_status(c.stock_status(today))
                );
            }

            println!();
            println!(
                "{} consumable(s) found. Use {} to reference by short ID.",
                style(items.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for c in &items {
                println!("{}", c.id);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let (title, category, quantity, threshold) = if args.interactive || args.title.is_none() {
        use dialoguer::{Input, Select};

        let title: String = Input::new()
            .with_prompt("Item name")
            .interact_text()
            .into_diagnostic()?;

        let category_options = ["consumable", "accessory"];
        let category_idx = Select::new()
            .with_prompt("Category")
            .items(&category_options)
            .default(0)
            .interact()
            .into_diagnostic()?;

        let quantity: u32 = Input::new()
            .with_prompt("Quantity on hand")
            .default(0)
            .interact_text()
            .into_diagnostic()?;

        let threshold: u32 = Input::new()
            .with_prompt("Low stock threshold")
            .default(0)
            .interact_text()
            .into_diagnostic()?;

        (
            title,
            category_options[category_idx].to_string(),
            quantity,
            threshold,
        )
    } else {
        let title = args
            .title
            .clone()
            .ok_or_else(|| miette::miette!("Item name is required (use --title or -t)"))?;
        (title, args.category.clone(), args.quantity, args.threshold)
    };

    let category: ConsumableCategory =
        category.parse().map_err(|e: String| miette::miette!("{}", e))?;

    let mut item = Consumable::new(title, quantity, threshold, config.author());
    item.category = category;
    item.unit = args.unit;
    item.batch_lot_number = args.batch;
    item.expiry_date = args.expiry;
    item.supplier = args.supplier;

    let path = project.entity_path(EntityPrefix::Cons, &item.id);
    loader::save_entity(&path, &item)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(item.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created consumable {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} | qty {} | threshold {}",
        style(&item.title).white(),
        style(item.quantity_available).cyan(),
        item.low_stock_threshold
    );

    if args.edit || (!args.no_edit && !args.interactive) {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, item) =
        load_record::<Consumable>(&project, EntityPrefix::Cons, &args.id, "consumable")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&item).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let content = std::fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (path, _) =
        load_record::<Consumable>(&project, EntityPrefix::Cons, &args.id, "consumable")?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );

    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}

fn run_adjust(args: AdjustArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    if args.quantity.is_none() && args.expiry.is_none() && args.batch.is_none() {
        return Err(miette::miette!(
            "Nothing to adjust: give --quantity, --expiry, or --batch"
        ));
    }

    let (path, mut item) =
        load_record::<Consumable>(&project, EntityPrefix::Cons, &args.id, "consumable")?;

    if let Some(quantity) = args.quantity {
        item.quantity_available = quantity;
    }
    if let Some(expiry) = args.expiry {
        item.expiry_date = Some(expiry);
    }
    if let Some(batch) = args.batch {
        item.batch_lot_number = Some(batch);
    }

    loader::save_entity(&path, &item)?;

    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    println!(
        "{} Adjusted {}: qty {} -> {}",
        style("✓").green(),
        style(&item.title).cyan(),
        item.quantity_available,
        style_status(item.stock_status(today))
    );

    Ok(())
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut item) =
        load_record::<Consumable>(&project, EntityPrefix::Cons, &args.id, "consumable")?;

    if item.lifecycle == Lifecycle::Deleted {
        println!(
            "{} Consumable {} is already deleted",
            style("!").yellow(),
            style(&item.title).cyan()
        );
        return Ok(());
    }

    item.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &item)?;

    println!(
        "{} Deleted consumable {} (record kept on disk)",
        style("✓").green(),
        style(&item.title).cyan()
    );

    Ok(())
}
