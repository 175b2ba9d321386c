//! `ldt qc` command - Quality control check management
//!
//! `qc record` is the only path that touches a check's outcome fields or its
//! trend log. `qc new` refuses an inverted acceptance range, so every
//! persisted check satisfies min <= max.

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
use crate::entities::qc_check::{AcceptanceRange, QcCheck, QcOutcome};

#[derive(Subcommand, Debug)]
pub enum QcCommands {
    /// List QC checks with filtering
    List(ListArgs),

    /// Create a new QC check
    New(NewArgs),

    /// Record a measurement against a check
    Record(RecordArgs),

    /// Show a QC check's details
    Show(ShowArgs),

    /// Edit a QC check in your editor
    Edit(EditArgs),

    /// Soft-delete a QC check
    Delete(DeleteArgs),
}

/// Last-outcome filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeFilter {
    Pass,
    Fail,
    Unrecorded,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Title,
    Parameter,
    LastCheck,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by last recorded outcome
    #[arg(long, default_value = "all")]
    pub outcome: OutcomeFilter,

    /// Only checks whose last recording deviated
    #[arg(long)]
    pub deviations: bool,

    /// Search in test name and parameter
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
    /// Test name (required unless interactive)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Parameter being measured (pH, conductivity, ...)
    #[arg(long, short = 'p')]
    pub parameter: Option<String>,

    /// Nominal target value
    #[arg(long, default_value_t = 0.0)]
    pub target: f64,

    /// Acceptance range minimum (inclusive)
    #[arg(long)]
    pub min: Option<f64>,

    /// Acceptance range maximum (inclusive)
    #[arg(long)]
    pub max: Option<f64>,

    /// Unit of measurement
    #[arg(long)]
    pub unit: Option<String>,

    /// Check cadence (Daily, Weekly, Monthly, ...)
    #[arg(long)]
    pub frequency: Option<String>,

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
pub struct RecordArgs {
    /// QC check ID or short ID (@N)
    pub id: String,

    /// Measured value
    #[arg(long)]
    pub value: f64,

    /// Check date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<chrono::NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// QC check ID or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// QC check ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// QC check ID or short ID (@N)
    pub id: String,
}

/// Run a QC subcommand
pub fn run(cmd: QcCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        QcCommands::List(args) => run_list(args),
        QcCommands::New(args) => run_new(args),
        QcCommands::Record(args) => run_record(args),
        QcCommands::Show(args) => run_show(args),
        QcCommands::Edit(args) => run_edit(args),
        QcCommands::Delete(args) => run_delete(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut checks: Vec<QcCheck> = loader::load_active(&project.entity_dir(EntityPrefix::Qc))?;

    checks.retain(|q| match args.outcome {
        OutcomeFilter::Pass => q.outcome == Some(QcOutcome::Pass),
        OutcomeFilter::Fail => q.outcome == Some(QcOutcome::Fail),
        OutcomeFilter::Unrecorded => q.outcome.is_none(),
        OutcomeFilter::All => true,
    });

    if args.deviations {
        checks.retain(|q| q.deviation);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        checks.retain(|q| {
            q.title.to_lowercase().contains(&needle)
                || q.parameter.to_lowercase().contains(&needle)
        });
    }

    match args.sort {
        SortField::Title => checks.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Parameter => checks.sort_by(|a, b| a.parameter.cmp(&b.parameter)),
        SortField::LastCheck => checks.sort_by_key(|q| q.last_check_date),
        SortField::Created => checks.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        checks.reverse();
    }

    if let Some(limit) = args.limit {
        checks.truncate(limit);
    }

    if args.count {
        println!("{}", checks.len());
        return Ok(());
    }

    if checks.is_empty() {
        println!("No QC checks found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(checks.iter().map(|q| q.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&checks).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&checks).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,title,parameter,range_min,range_max,last_result,outcome,recordings");
            for q in &checks {
                let short_id = short_ids.get_short_id(&q.id.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{},{}",
                    short_id,
                    q.id,
                    escape_csv(&q.title),
                    escape_csv(&q.parameter),
                    q.acceptance_range.min,
                    q.acceptance_range.max,
                    q.last_result.map(|v| v.to_string()).unwrap_or_default(),
                    q.outcome.map(|o| o.to_string()).unwrap_or_default(),
                    q.trend_len()
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<26} {:<14} {:<16} {:>8} {:<8}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("TEST").bold(),
                style("PARAMETER").bold(),
                style("RANGE").bold(),
                style("LAST").bold(),
                style("OUTCOME").bold()
            );
            println!("{}", "-".repeat(104));

            for q in &checks {
                let short_id = short_ids.get_short_id(&q.id.to_string()).unwrap_or_default();
                let outcome_styled = match q.outcome {
                    Some(QcOutcome::Pass) => style("pass".to_string()).green(),
                    Some(QcOutcome::Fail) => style("fail".to_string()).red().bold(),
                    None => style("-".to_string()).dim(),
                };

                println!(
                    "{:<8} {:<17} {:<26} {:<14} {:<16} {:>8} {:<8}",
                    style(short_id).cyan(),
                    format_short_id(&q.id),
                    truncate_str(&q.title, 24),
                    truncate_str(&q.parameter, 12),
                    format!("{}..{}", q.acceptance_range.min, q.acceptance_range.max),
                    q.last_result
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    outcome_styled
                );
            }

            println!();
            println!(
                "{} QC check(s) found. Use {} to reference by short ID.",
                style(checks.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for q in &checks {
                println!("{}", q.id);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let (title, parameter, target, min, max) =
        if args.interactive || args.title.is_none() || args.parameter.is_none() {
            use dialoguer::Input;

            let title: String = Input::new()
                .with_prompt("Test name")
                .interact_text()
                .into_diagnostic()?;

            let parameter: String = Input::new()
                .with_prompt("Parameter measured")
                .interact_text()
                .into_diagnostic()?;

            let target: f64 = Input::new()
                .with_prompt("Target value")
                .default(0.0)
                .interact_text()
                .into_diagnostic()?;

            let min: f64 = Input::new()
                .with_prompt("Acceptance range minimum")
                .interact_text()
                .into_diagnostic()?;

            let max: f64 = Input::new()
                .with_prompt("Acceptance range maximum")
                .interact_text()
                .into_diagnostic()?;

            (title, parameter, target, min, max)
        } else {
            let title = args
                .title
                .clone()
                .ok_or_else(|| miette::miette!("Test name is required (use --title or -t)"))?;
            let parameter = args
                .parameter
                .clone()
                .ok_or_else(|| miette::miette!("Parameter is required (use --parameter or -p)"))?;
            let min = args
                .min
                .ok_or_else(|| miette::miette!("Acceptance range minimum is required (--min)"))?;
            let max = args
                .max
                .ok_or_else(|| miette::miette!("Acceptance range maximum is required (--max)"))?;
            (title, parameter, args.target, min, max)
        };

    let range = AcceptanceRange { min, max };
    if !range.is_valid() {
        return Err(miette::miette!(
            "Acceptance range minimum ({}) exceeds maximum ({}); no measurement could ever pass",
            min,
            max
        ));
    }

    let mut check = QcCheck::new(title, parameter, target, range, config.author());
    check.unit = args.unit;
    check.frequency = args.frequency;

    let path = project.entity_path(EntityPrefix::Qc, &check.id);
    loader::save_entity(&path, &check)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(check.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created QC check {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} | {} in {}..{}",
        style(&check.title).white(),
        style(&check.parameter).yellow(),
        check.acceptance_range.min,
        check.acceptance_range.max
    );

    if args.edit || (!args.no_edit && !args.interactive) {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_record(args: RecordArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut check) = load_record::<QcCheck>(&project, EntityPrefix::Qc, &args.id, "QC check")?;

    let check_date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    check.record_result(args.value, check_date);
    loader::save_entity(&path, &check)?;

    let outcome_styled = match check.outcome {
        Some(QcOutcome::Pass) => style("pass").green().bold(),
        _ => style("fail").red().bold(),
    };

    println!(
        "{} Recorded {} = {} on {}: {}",
        style("✓").green(),
        style(&check.parameter).cyan(),
        args.value,
        check_date,
        outcome_styled
    );
    println!(
        "   range {}..{} | {} recording(s) in trend",
        check.acceptance_range.min,
        check.acceptance_range.max,
        check.trend_len()
    );
    if check.deviation {
        println!(
            "   {} measurement outside the acceptance range",
            style("!").yellow()
        );
    }

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, check) = load_record::<QcCheck>(&project, EntityPrefix::Qc, &args.id, "QC check")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&check).into_diagnostic()?;
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
    let (path, _) = load_record::<QcCheck>(&project, EntityPrefix::Qc, &args.id, "QC check")?;

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
    let (path, mut check) = load_record::<QcCheck>(&project, EntityPrefix::Qc, &args.id, "QC check")?;

    if check.lifecycle == Lifecycle::Deleted {
        println!(
            "{} QC check {} is already deleted",
            style("!").yellow(),
            style(&check.title).cyan()
        );
        return Ok(());
    }

    check.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &check)?;

    println!(
        "{} Deleted QC check {} (record kept on disk)",
        style("✓").green(),
        style(&check.title).cyan()
    );

    Ok(())
}
