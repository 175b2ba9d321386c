//! `ldt cal` command - Calibration record management
//!
//! The DUE column is recomputed per row against the reference date, and the
//! instrument name is joined at read time from the linked instrument record;
//! no name is ever stored on the calibration itself.

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::helpers::{escape_csv, format_short_id, load_record, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Lifecycle;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::calibration::{Calibration, DueStatus};
use crate::entities::instrument::Instrument;

#[derive(Subcommand, Debug)]
pub enum CalCommands {
    /// List calibrations with derived due-date status
    List(ListArgs),

    /// Record a new calibration
    New(NewArgs),

    /// Show a calibration's details
    Show(ShowArgs),

    /// Edit a calibration in your editor
    Edit(EditArgs),

    /// Soft-delete a calibration
    Delete(DeleteArgs),
}

/// Derived due-date status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DueFilter {
    Valid,
    DueSoon,
    Overdue,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Title,
    Due,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by derived due-date status
    #[arg(long, default_value = "all")]
    pub due: DueFilter,

    /// Reference date for status computation (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub today: Option<chrono::NaiveDate>,

    /// Search in title, certifier, and certificate number
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "due")]
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
    /// Calibration title
    #[arg(long, short = 't')]
    pub title: String,

    /// Next due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: chrono::NaiveDate,

    /// Instrument the calibration belongs to (ID or @N)
    #[arg(long)]
    pub instrument: Option<String>,

    /// Date the instrument was last calibrated (YYYY-MM-DD)
    #[arg(long)]
    pub last: Option<chrono::NaiveDate>,

    /// Calibration cadence (Monthly, Quarterly, Annually, ...)
    #[arg(long)]
    pub frequency: Option<String>,

    /// Person or body that certified the calibration
    #[arg(long)]
    pub certified_by: Option<String>,

    /// Certificate reference number
    #[arg(long)]
    pub certificate: Option<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Calibration ID or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Calibration ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Calibration ID or short ID (@N)
    pub id: String,
}

/// Run a calibration subcommand
pub fn run(cmd: CalCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        CalCommands::List(args) => run_list(args),
        CalCommands::New(args) => run_new(args),
        CalCommands::Show(args) => run_show(args),
        CalCommands::Edit(args) => run_edit(args),
        CalCommands::Delete(args) => run_delete(args),
    }
}

/// Read-time join: map instrument IDs to names for list rendering
fn instrument_names(project: &Project) -> Result<HashMap<String, String>> {
    let instruments: Vec<Instrument> = loader::load_all(&project.entity_dir(EntityPrefix::Inst))?;
    Ok(instruments
        .into_iter()
        .map(|i| (i.id.to_string(), i.title))
        .collect())
}

fn style_due(status: DueStatus) -> console::StyledObject<String> {
    match status {
        DueStatus::Valid => style(status.to_string()).green(),
        DueStatus::DueSoon => style(status.to_string()).yellow(),
        DueStatus::Overdue => style(status.to_string()).red().bold(),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut cals: Vec<Calibration> = loader::load_active(&project.entity_dir(EntityPrefix::Cal))?;

    let due_filter = match args.due {
        DueFilter::Valid => Some(DueStatus::Valid),
        DueFilter::DueSoon => Some(DueStatus::DueSoon),
        DueFilter::Overdue => Some(DueStatus::Overdue),
        DueFilter::All => None,
    };
    if let Some(want) = due_filter {
        cals.retain(|c| c.due_status(today) == want);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        cals.retain(|c| {
            c.title.to_lowercase().contains(&needle)
                || c.certified_by
                    .as_ref()
                    .is_some_and(|p| p.to_lowercase().contains(&needle))
                || c.certificate_number
                    .as_ref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Title => cals.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Due => cals.sort_by_key(|c| c.next_due_date),
        SortField::Created => cals.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        cals.reverse();
    }

    if let Some(limit) = args.limit {
        cals.truncate(limit);
    }

    if args.count {
        println!("{}", cals.len());
        return Ok(());
    }

    if cals.is_empty() {
        println!("No calibrations found.");
        return Ok(());
    }

    let names = instrument_names(&project)?;
    let joined_name = |cal: &Calibration| -> String {
        cal.links
            .instrument
            .as_ref()
            .and_then(|id| names.get(&id.to_string()))
            .cloned()
            .unwrap_or_else(|| "-".to_string())
    };

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(cals.iter().map(|c| c.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let mut rows = Vec::new();
            for c in &cals {
                let mut row = serde_json::to_value(c).into_diagnostic()?;
                row["due_status"] = serde_json::Value::String(c.due_status(today).to_string());
                row["instrument_name"] = serde_json::Value::String(joined_name(c));
                rows.push(row);
            }
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&cals).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,instrument,next_due,due_status");
            for c in &cals {
                let short_id = short_ids.get_short_id(&c.id.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    short_id,
                    c.id,
                    escape_csv(&c.title),
                    escape_csv(&joined_name(c)),
                    c.next_due_date,
                    c.due_status(today)
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<26} {:<20} {:<12} {:<10}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("TITLE").bold(),
                style("INSTRUMENT").bold(),
                style("NEXT DUE").bold(),
                style("DUE").bold()
            );
            println!("{}", "-".repeat(98));

            for c in &cals {
                let short_id = short_ids.get_short_id(&c.id.to_string()).unwrap_or_default();
                println!(
                    "{:<8} {:<17} {:<26} {:<20} {:<12} {:<10}",
                    style(short_id).cyan(),
                    format_short_id(&c.id),
                    truncate_str(&c.title, 24),
                    truncate_str(&joined_name(c), 18),
                    c.next_due_date,
                    style_due(c.due_status(today))
                );
            }

            println!();
            println!(
                "{} calibration(s) found. Use {} to reference by short ID.",
                style(cals.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for c in &cals {
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

    // Resolve and verify the instrument link before storing its ID
    let instrument_id = match args.instrument {
        Some(ref reference) => {
            let (_, inst) =
                load_record::<Instrument>(&project, EntityPrefix::Inst, reference, "instrument")?;
            Some(inst.id)
        }
        None => None,
    };

    let mut cal = Calibration::new(args.title, args.due, config.author());
    cal.links.instrument = instrument_id;
    cal.last_calibration_date = args.last;
    cal.frequency = args.frequency;
    cal.certified_by = args.certified_by;
    cal.certificate_number = args.certificate;

    let path = project.entity_path(EntityPrefix::Cal, &cal.id);
    loader::save_entity(&path, &cal)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(cal.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created calibration {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} | next due {}",
        style(&cal.title).white(),
        style(cal.next_due_date).yellow()
    );

    if args.edit {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, cal) =
        load_record::<Calibration>(&project, EntityPrefix::Cal, &args.id, "calibration")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&cal).into_diagnostic()?;
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
        load_record::<Calibration>(&project, EntityPrefix::Cal, &args.id, "calibration")?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );

    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut cal) =
        load_record::<Calibration>(&project, EntityPrefix::Cal, &args.id, "calibration")?;

    if cal.lifecycle == Lifecycle::Deleted {
        println!(
            "{} Calibration {} is already deleted",
            style("!").yellow(),
            style(&cal.title).cyan()
        );
        return Ok(());
    }

    cal.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &cal)?;

    println!(
        "{} Deleted calibration {} (record kept on disk)",
        style("✓").green(),
        style(&cal.title).cyan()
    );

    Ok(())
}
