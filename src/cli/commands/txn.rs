//! `ldt txn` command - Stock movement journal
//!
//! Movements are a journal of stock activity. Recording one never adjusts
//! the linked consumable's quantity; use `ldt cons adjust` for that.

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, format_short_id, load_record, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Lifecycle;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::transaction::{MovementKind, StockMovement};

#[derive(Subcommand, Debug)]
pub enum TxnCommands {
    /// List stock movements with filtering
    List(ListArgs),

    /// Record a new stock movement
    New(NewArgs),

    /// Show a stock movement's details
    Show(ShowArgs),

    /// Soft-delete a stock movement
    Delete(DeleteArgs),
}

/// Movement kind filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindFilter {
    Usage,
    Addition,
    Wastage,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Date,
    Quantity,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by movement kind
    #[arg(long, default_value = "all")]
    pub kind: KindFilter,

    /// Search in purpose and handler
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "date")]
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
    /// Movement kind (usage, addition, or wastage)
    #[arg(long, short = 'k')]
    pub kind: String,

    /// Quantity moved
    #[arg(long, short = 'Q')]
    pub quantity: u32,

    /// Movement date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<chrono::NaiveDate>,

    /// Item moved (full ID or @N of a consumable or instrument)
    #[arg(long)]
    pub item: Option<String>,

    /// Person who used or handled the stock
    #[arg(long)]
    pub used_by: Option<String>,

    /// What the stock was used for
    #[arg(long)]
    pub purpose: Option<String>,

    /// Reference to a test execution
    #[arg(long)]
    pub linked_test: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Movement ID or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Movement ID or short ID (@N)
    pub id: String,
}

/// Run a stock movement subcommand
pub fn run(cmd: TxnCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        TxnCommands::List(args) => run_list(args),
        TxnCommands::New(args) => run_new(args),
        TxnCommands::Show(args) => run_show(args),
        TxnCommands::Delete(args) => run_delete(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut movements: Vec<StockMovement> =
        loader::load_active(&project.entity_dir(EntityPrefix::Txn))?;

    let kind_filter = match args.kind {
        KindFilter::Usage => Some(MovementKind::Usage),
        KindFilter::Addition => Some(MovementKind::Addition),
        KindFilter::Wastage => Some(MovementKind::Wastage),
        KindFilter::All => None,
    };
    if let Some(want) = kind_filter {
        movements.retain(|m| m.kind == want);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        movements.retain(|m| {
            m.purpose
                .as_ref()
                .is_some_and(|p| p.to_lowercase().contains(&needle))
                || m.used_by
                    .as_ref()
                    .is_some_and(|u| u.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Date => movements.sort_by_key(|m| m.date),
        SortField::Quantity => movements.sort_by_key(|m| m.quantity),
        SortField::Created => movements.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        movements.reverse();
    }

    if let Some(limit) = args.limit {
        movements.truncate(limit);
    }

    if args.count {
        println!("{}", movements.len());
        return Ok(());
    }

    if movements.is_empty() {
        println!("No stock movements found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(movements.iter().map(|m| m.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&movements).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&movements).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,date,kind,quantity,item,used_by,purpose");
            for m in &movements {
                let short_id = short_ids.get_short_id(&m.id.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{}",
                    short_id,
                    m.id,
                    m.date,
                    m.kind,
                    m.quantity,
                    m.item.as_ref().map(|i| i.to_string()).unwrap_or_default(),
                    escape_csv(m.used_by.as_deref().unwrap_or("")),
                    escape_csv(m.purpose.as_deref().unwrap_or(""))
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<12} {:<10} {:>6} {:<17} {:<20}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("DATE").bold(),
                style("KIND").bold(),
                style("QTY").bold(),
                style("ITEM").bold(),
                style("PURPOSE").bold()
            );
            println!("{}", "-".repeat(96));

            for m in &movements {
                let short_id = short_ids.get_short_id(&m.id.to_string()).unwrap_or_default();
                let kind_styled = match m.kind {
                    MovementKind::Addition => style(m.kind.to_string()).green(),
                    MovementKind::Usage => style(m.kind.to_string()).white(),
                    MovementKind::Wastage => style(m.kind.to_string()).red(),
                };

                println!(
                    "{:<8} {:<17} {:<12} {:<10} {:>6} {:<17} {:<20}",
                    style(short_id).cyan(),
                    format_short_id(&m.id),
                    m.date,
                    kind_styled,
                    m.quantity,
                    m.item
                        .as_ref()
                        .map(format_short_id)
                        .unwrap_or_else(|| "-".to_string()),
                    truncate_str(m.purpose.as_deref().unwrap_or("-"), 18)
                );
            }

            println!();
            println!(
                "{} movement(s) found. Use {} to reference by short ID.",
                style(movements.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for m in &movements {
                println!("{}", m.id);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let kind: MovementKind = args
        .kind
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    let item_id = match args.item {
        Some(ref reference) => {
            let short_ids = ShortIdIndex::load(&project);
            let resolved = short_ids
                .resolve(reference)
                .unwrap_or_else(|| reference.clone());
            Some(EntityId::parse(&resolved).map_err(|e| miette::miette!("{}", e))?)
        }
        None => None,
    };

    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut movement = StockMovement::new(kind, args.quantity, date, config.author());
    movement.item = item_id;
    movement.used_by = args.used_by;
    movement.purpose = args.purpose;
    movement.linked_test = args.linked_test;

    let path = project.entity_path(EntityPrefix::Txn, &movement.id);
    loader::save_entity(&path, &movement)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(movement.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Recorded {} of {} on {} ({})",
        style("✓").green(),
        style(movement.kind.to_string()).yellow(),
        style(movement.quantity).cyan(),
        movement.date,
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, movement) =
        load_record::<StockMovement>(&project, EntityPrefix::Txn, &args.id, "stock movement")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&movement).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let content = std::fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
    }

    Ok(())
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut movement) =
        load_record::<StockMovement>(&project, EntityPrefix::Txn, &args.id, "stock movement")?;

    if movement.lifecycle == Lifecycle::Deleted {
        println!("{} Movement is already deleted", style("!").yellow());
        return Ok(());
    }

    movement.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &movement)?;

    println!(
        "{} Deleted movement {} (record kept on disk)",
        style("✓").green(),
        style(format_short_id(&movement.id)).cyan()
    );

    Ok(())
}
