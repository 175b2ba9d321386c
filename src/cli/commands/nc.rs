//! `ldt nc` command - Nonconformance / CAPA management

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
use crate::entities::nonconformance::{NcSeverity, NcStatus, Nonconformance};

#[derive(Subcommand, Debug)]
pub enum NcCommands {
    /// List nonconformances with filtering
    List(ListArgs),

    /// Raise a new nonconformance
    New(NewArgs),

    /// Close a nonconformance
    Close(CloseArgs),

    /// Show a nonconformance's details
    Show(ShowArgs),

    /// Edit a nonconformance in your editor
    Edit(EditArgs),

    /// Soft-delete a nonconformance
    Delete(DeleteArgs),
}

/// Severity filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityFilter {
    Low,
    Medium,
    High,
    All,
}

/// Handling status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Open,
    InProgress,
    Closed,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Title,
    Severity,
    Due,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by severity
    #[arg(long, short = 'S', default_value = "all")]
    pub severity: SeverityFilter,

    /// Filter by handling status
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Search in title, description, and impacted area
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
    /// Short summary of the nonconformance (required unless interactive)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Severity level
    #[arg(long, short = 'S', default_value = "medium")]
    pub severity: String,

    /// Full description
    #[arg(long)]
    pub description: Option<String>,

    /// Area of the lab affected
    #[arg(long)]
    pub area: Option<String>,

    /// Person responsible for the corrective action
    #[arg(long)]
    pub owner: Option<String>,

    /// Deadline for resolution (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<chrono::NaiveDate>,

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
pub struct CloseArgs {
    /// Nonconformance ID or short ID (@N)
    pub id: String,

    /// Closure date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<chrono::NaiveDate>,

    /// Root cause summary
    #[arg(long)]
    pub root_cause: Option<String>,

    /// Corrective action taken
    #[arg(long)]
    pub corrective_action: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Nonconformance ID or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Nonconformance ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Nonconformance ID or short ID (@N)
    pub id: String,
}

/// Run a nonconformance subcommand
pub fn run(cmd: NcCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        NcCommands::List(args) => run_list(args),
        NcCommands::New(args) => run_new(args),
        NcCommands::Close(args) => run_close(args),
        NcCommands::Show(args) => run_show(args),
        NcCommands::Edit(args) => run_edit(args),
        NcCommands::Delete(args) => run_delete(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut ncs: Vec<Nonconformance> = loader::load_active(&project.entity_dir(EntityPrefix::Nc))?;

    let severity_filter = match args.severity {
        SeverityFilter::Low => Some(NcSeverity::Low),
        SeverityFilter::Medium => Some(NcSeverity::Medium),
        SeverityFilter::High => Some(NcSeverity::High),
        SeverityFilter::All => None,
    };
    if let Some(want) = severity_filter {
        ncs.retain(|n| n.severity == want);
    }

    let status_filter = match args.status {
        StatusFilter::Open => Some(NcStatus::Open),
        StatusFilter::InProgress => Some(NcStatus::InProgress),
        StatusFilter::Closed => Some(NcStatus::Closed),
        StatusFilter::All => None,
    };
    if let Some(want) = status_filter {
        ncs.retain(|n| n.nc_status == want);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        ncs.retain(|n| {
            n.title.to_lowercase().contains(&needle)
                || n.description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || n.impacted_area
                    .as_ref()
                    .is_some_and(|a| a.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Title => ncs.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Severity => {
            ncs.sort_by(|a, b| a.severity.to_string().cmp(&b.severity.to_string()))
        }
        SortField::Due => ncs.sort_by_key(|n| n.due_date),
        SortField::Created => ncs.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        ncs.reverse();
    }

    if let Some(limit) = args.limit {
        ncs.truncate(limit);
    }

    if args.count {
        println!("{}", ncs.len());
        return Ok(());
    }

    if ncs.is_empty() {
        println!("No nonconformances found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(ncs.iter().map(|n| n.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ncs).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&ncs).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,severity,status,area,owner,due");
            for n in &ncs {
                let short_id = short_ids.get_short_id(&n.id.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{}",
                    short_id,
                    n.id,
                    escape_csv(&n.title),
                    n.severity,
                    n.nc_status,
                    escape_csv(n.impacted_area.as_deref().unwrap_or("")),
                    escape_csv(n.action_owner.as_deref().unwrap_or("")),
                    n.due_date.map(|d| d.to_string()).unwrap_or_default()
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<30} {:<10} {:<13} {:<12}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("TITLE").bold(),
                style("SEVERITY").bold(),
                style("STATUS").bold(),
                style("DUE").bold()
            );
            println!("{}", "-".repeat(94));

            for n in &ncs {
                let short_id = short_ids.get_short_id(&n.id.to_string()).unwrap_or_default();
                let severity_styled = match n.severity {
                    NcSeverity::High => style(n.severity.to_string()).red().bold(),
                    NcSeverity::Medium => style(n.severity.to_string()).yellow(),
                    NcSeverity::Low => style(n.severity.to_string()).white(),
                };

                println!(
                    "{:<8} {:<17} {:<30} {:<10} {:<13} {:<12}",
                    style(short_id).cyan(),
                    format_short_id(&n.id),
                    truncate_str(&n.title, 28),
                    severity_styled,
                    n.nc_status,
                    n.due_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }

            println!();
            println!(
                "{} nonconformance(s) found. Use {} to reference by short ID.",
                style(ncs.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for n in &ncs {
                println!("{}", n.id);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let (title, severity) = if args.interactive || args.title.is_none() {
        use dialoguer::{Input, Select};

        let title: String = Input::new()
            .with_prompt("Nonconformance title")
            .interact_text()
            .into_diagnostic()?;

        let severity_options = ["low", "medium", "high"];
        let severity_idx = Select::new()
            .with_prompt("Severity")
            .items(&severity_options)
            .default(1)
            .interact()
            .into_diagnostic()?;

        (title, severity_options[severity_idx].to_string())
    } else {
        let title = args
            .title
            .clone()
            .ok_or_else(|| miette::miette!("Title is required (use --title or -t)"))?;
        (title, args.severity.clone())
    };

    let severity: NcSeverity = severity.parse().map_err(|e: String| miette::miette!("{}", e))?;

    let mut nc = Nonconformance::new(title, severity, config.author());
    nc.description = args.description;
    nc.impacted_area = args.area;
    nc.action_owner = args.owner;
    nc.due_date = args.due;

    let path = project.entity_path(EntityPrefix::Nc, &nc.id);
    loader::save_entity(&path, &nc)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(nc.id.to_string());
    let _ = short_ids.save(&project);

    let severity_styled = match nc.severity {
        NcSeverity::High => style(nc.severity.to_string()).red().bold(),
        NcSeverity::Medium => style(nc.severity.to_string()).yellow(),
        NcSeverity::Low => style(nc.severity.to_string()).white(),
    };

    println!(
        "{} Created nonconformance {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} | {}",
        severity_styled,
        style(&nc.title).white()
    );

    if args.edit || (!args.no_edit && !args.interactive) {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_close(args: CloseArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut nc) =
        load_record::<Nonconformance>(&project, EntityPrefix::Nc, &args.id, "nonconformance")?;

    if nc.nc_status == NcStatus::Closed {
        return Err(miette::miette!(
            "Nonconformance '{}' is already closed",
            nc.title
        ));
    }

    if let Some(root_cause) = args.root_cause {
        nc.root_cause = Some(root_cause);
    }
    if let Some(corrective_action) = args.corrective_action {
        nc.corrective_action = Some(corrective_action);
    }

    let closure_date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    nc.close(closure_date);
    loader::save_entity(&path, &nc)?;

    println!(
        "{} Closed {} on {}",
        style("✓").green(),
        style(&nc.title).cyan(),
        closure_date
    );

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, nc) =
        load_record::<Nonconformance>(&project, EntityPrefix::Nc, &args.id, "nonconformance")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&nc).into_diagnostic()?;
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
        load_record::<Nonconformance>(&project, EntityPrefix::Nc, &args.id, "nonconformance")?;

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
    let (path, mut nc) =
        load_record::<Nonconformance>(&project, EntityPrefix::Nc, &args.id, "nonconformance")?;

    if nc.lifecycle == Lifecycle::Deleted {
        println!(
            "{} Nonconformance {} is already deleted",
            style("!").yellow(),
            style(&nc.title).cyan()
        );
        return Ok(());
    }

    nc.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &nc)?;

    println!(
        "{} Deleted nonconformance {} (record kept on disk)",
        style("✓").green(),
        style(&nc.title).cyan()
    );

    Ok(())
}
