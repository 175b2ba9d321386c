//! `ldt inst` command - Lab instrument management

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
use crate::entities::instrument::{Instrument, InstrumentStatus};

#[derive(Subcommand, Debug)]
pub enum InstCommands {
    /// List instruments with filtering
    List(ListArgs),

    /// Register a new instrument
    New(NewArgs),

    /// Show an instrument's details
    Show(ShowArgs),

    /// Edit an instrument in your editor
    Edit(EditArgs),

    /// Soft-delete an instrument
    Delete(DeleteArgs),
}

/// Operational status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Active,
    UnderMaintenance,
    OutOfService,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Title,
    Status,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by operational status
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Search in name, manufacturer, model, and serial number
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
    /// Instrument name (required unless interactive)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Manufacturer
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Model designation
    #[arg(long)]
    pub model: Option<String>,

    /// Serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Physical location within the lab
    #[arg(long)]
    pub location: Option<String>,

    /// Department responsible for the instrument
    #[arg(long)]
    pub department: Option<String>,

    /// Operational status
    #[arg(long, short = 'S', default_value = "active")]
    pub status: String,

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
    /// Instrument ID or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Instrument ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Instrument ID or short ID (@N)
    pub id: String,
}

/// Run an instrument subcommand
pub fn run(cmd: InstCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        InstCommands::List(args) => run_list(args),
        InstCommands::New(args) => run_new(args),
        InstCommands::Show(args) => run_show(args),
        InstCommands::Edit(args) => run_edit(args),
        InstCommands::Delete(args) => run_delete(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut instruments: Vec<Instrument> =
        loader::load_active(&project.entity_dir(EntityPrefix::Inst))?;

    let status_filter = match args.status {
        StatusFilter::Active => Some(InstrumentStatus::Active),
        StatusFilter::UnderMaintenance => Some(InstrumentStatus::UnderMaintenance),
        StatusFilter::OutOfService => Some(InstrumentStatus::OutOfService),
        StatusFilter::All => None,
    };
    if let Some(want) = status_filter {
        instruments.retain(|i| i.status == want);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        instruments.retain(|i| {
            i.title.to_lowercase().contains(&needle)
                || i.manufacturer
                    .as_ref()
                    .is_some_and(|m| m.to_lowercase().contains(&needle))
                || i.model
                    .as_ref()
                    .is_some_and(|m| m.to_lowercase().contains(&needle))
                || i.serial_number
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Title => instruments.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Status => {
            instruments.sort_by(|a, b| a.status.to_string().cmp(&b.status.to_string()))
        }
        SortField::Created => instruments.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        instruments.reverse();
    }

    if let Some(limit) = args.limit {
        instruments.truncate(limit);
    }

    if args.count {
        println!("{}", instruments.len());
        return Ok(());
    }

    if instruments.is_empty() {
        println!("No instruments found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(instruments.iter().map(|i| i.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&instruments).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&instruments).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,manufacturer,model,serial,location,status");
            for inst in &instruments {
                let short_id = short_ids
                    .get_short_id(&inst.id.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{}",
                    short_id,
                    inst.id,
                    escape_csv(&inst.title),
                    escape_csv(inst.manufacturer.as_deref().unwrap_or("")),
                    escape_csv(inst.model.as_deref().unwrap_or("")),
                    escape_csv(inst.serial_number.as_deref().unwrap_or("")),
                    escape_csv(inst.lab_location.as_deref().unwrap_or("")),
                    inst.status
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<26} {:<16} {:<14} {:<18}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("MANUFACTURER").bold(),
                style("SERIAL").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(102));

            for inst in &instruments {
                let short_id = short_ids
                    .get_short_id(&inst.id.to_string())
                    .unwrap_or_default();
                let status_styled = match inst.status {
                    InstrumentStatus::Active => style(inst.status.to_string()).green(),
                    InstrumentStatus::UnderMaintenance => style(inst.status.to_string()).yellow(),
                    InstrumentStatus::OutOfService => style(inst.status.to_string()).red(),
                };

                println!(
                    "{:<8} {:<17} {:<26} {:<16} {:<14} {:<18}",
                    style(short_id).cyan(),
                    format_short_id(&inst.id),
                    truncate_str(&inst.title, 24),
                    truncate_str(inst.manufacturer.as_deref().unwrap_or("-"), 14),
                    truncate_str(inst.serial_number.as_deref().unwrap_or("-"), 12),
                    status_styled
                );
            }

            println!();
            println!(
                "{} instrument(s) found. Use {} to reference by short ID.",
                style(instruments.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for inst in &instruments {
                println!("{}", inst.id);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let (title, status) = if args.interactive || args.title.is_none() {
        use dialoguer::{Input, Select};

        let title: String = Input::new()
            .with_prompt("Instrument name")
            .interact_text()
            .into_diagnostic()?;

        let status_options = ["active", "under_maintenance", "out_of_service"];
        let status_idx = Select::new()
            .with_prompt("Operational status")
            .items(&status_options)
            .default(0)
            .interact()
            .into_diagnostic()?;

        (title, status_options[status_idx].to_string())
    } else {
        let title = args
            .title
            .ok_or_else(|| miette::miette!("Instrument name is required (use --title or -t)"))?;
        (title, args.status)
    };

    let status: InstrumentStatus = status.parse().map_err(|e: String| miette::miette!("{}", e))?;

    let mut inst = Instrument::new(title, config.author());
    inst.manufacturer = args.manufacturer;
    inst.model = args.model;
    inst.serial_number = args.serial;
    inst.lab_location = args.location;
    inst.assigned_department = args.department;
    inst.status = status;

    let path = project.entity_path(EntityPrefix::Inst, &inst.id);
    loader::save_entity(&path, &inst)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(inst.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created instrument {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} | {}",
        style(&inst.title).white(),
        style(inst.status.to_string()).yellow()
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
    let (path, inst) =
        load_record::<Instrument>(&project, EntityPrefix::Inst, &args.id, "instrument")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&inst).into_diagnostic()?;
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
        load_record::<Instrument>(&project, EntityPrefix::Inst, &args.id, "instrument")?;

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
    let (path, mut inst) =
        load_record::<Instrument>(&project, EntityPrefix::Inst, &args.id, "instrument")?;

    if inst.lifecycle == Lifecycle::Deleted {
        println!(
            "{} Instrument {} is already deleted",
            style("!").yellow(),
            style(&inst.title).cyan()
        );
        return Ok(());
    }

    inst.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &inst)?;

    println!(
        "{} Deleted instrument {} (record kept on disk)",
        style("✓").green(),
        style(&inst.title).cyan()
    );

    Ok(())
}
