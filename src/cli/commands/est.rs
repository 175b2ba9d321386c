//! `ldt est` command - Cost estimation management
//!
//! Line items are given on the command line and the totals are computed
//! once, at creation. Review moves a draft to approved or rejected through
//! the closed workflow; reviewed estimations are terminal.

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
use crate::core::workflow::ReviewStatus;
use crate::core::Config;
use crate::entities::estimation::{Estimation, LineItem};

#[derive(Subcommand, Debug)]
pub enum EstCommands {
    /// List estimations with filtering
    List(ListArgs),

    /// Create a new draft estimation
    New(NewArgs),

    /// Review a draft estimation (approve or reject)
    Review(ReviewArgs),

    /// Show an estimation's details
    Show(ShowArgs),

    /// Edit an estimation in your editor
    Edit(EditArgs),

    /// Soft-delete an estimation
    Delete(DeleteArgs),
}

/// Review status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReviewFilter {
    Draft,
    Approved,
    Rejected,
    All,
}

/// Review verdict for `est review`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReviewVerdict {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Number,
    Hours,
    Cost,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by review status
    #[arg(long, default_value = "all")]
    pub status: ReviewFilter,

    /// Search in estimate number and RFQ reference
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
    /// RFQ reference this estimation answers
    #[arg(long)]
    pub rfq: Option<String>,

    /// Line item as NAME:UNITS:HOURS:RATE[:REMARKS] (repeatable)
    #[arg(long = "item", short = 'I')]
    pub items: Vec<String>,

    /// Margin percent applied to the subtotal
    #[arg(long, short = 'm', default_value_t = 0.0)]
    pub margin: f64,

    /// Discount percent applied after margin
    #[arg(long, short = 'd', default_value_t = 0.0)]
    pub discount: f64,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ReviewArgs {
    /// Estimation ID or short ID (@N)
    pub id: String,

    /// Review verdict
    #[arg(long, short = 's')]
    pub status: ReviewVerdict,

    /// Review comments (appended to the notes)
    #[arg(long, short = 'c')]
    pub comments: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Estimation ID, estimate number, or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Estimation ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Estimation ID or short ID (@N)
    pub id: String,
}

/// Run an estimation subcommand
pub fn run(cmd: EstCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        EstCommands::List(args) => run_list(args),
        EstCommands::New(args) => run_new(args),
        EstCommands::Review(args) => run_review(args),
        EstCommands::Show(args) => run_show(args),
        EstCommands::Edit(args) => run_edit(args),
        EstCommands::Delete(args) => run_delete(args),
    }
}

/// Parse a line item given as NAME:UNITS:HOURS:RATE[:REMARKS]
fn parse_item(raw: &str) -> Result<LineItem> {
    let parts: Vec<&str> = raw.splitn(5, ':').collect();
    if parts.len() < 4 {
        return Err(miette::miette!(
            "Invalid line item '{}': expected NAME:UNITS:HOURS:RATE[:REMARKS]",
            raw
        ));
    }

    let units: u32 = parts[1]
        .parse()
        .map_err(|_| miette::miette!("Invalid unit count '{}' in line item '{}'", parts[1], raw))?;
    if units == 0 {
        return Err(miette::miette!(
            "Line item '{}' must cover at least one unit under test",
            raw
        ));
    }

    let hours: f64 = parts[2]
        .parse()
        .map_err(|_| miette::miette!("Invalid hours '{}' in line item '{}'", parts[2], raw))?;
    let rate: f64 = parts[3]
        .parse()
        .map_err(|_| miette::miette!("Invalid rate '{}' in line item '{}'", parts[3], raw))?;
    if hours < 0.0 || rate < 0.0 {
        return Err(miette::miette!(
            "Hours and rate must be non-negative in line item '{}'",
            raw
        ));
    }

    Ok(LineItem {
        test_type: parts[0].to_string(),
        units_under_test: units,
        hours_per_unit: hours,
        rate_per_hour: rate,
        remarks: parts.get(4).map(|r| r.to_string()),
    })
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut ests: Vec<Estimation> = loader::load_active(&project.entity_dir(EntityPrefix::Estm))?;

    let status_filter = match args.status {
        ReviewFilter::Draft => Some(ReviewStatus::Draft),
        ReviewFilter::Approved => Some(ReviewStatus::Approved),
        ReviewFilter::Rejected => Some(ReviewStatus::Rejected),
        ReviewFilter::All => None,
    };
    if let Some(want) = status_filter {
        ests.retain(|e| e.review_status == want);
    }

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        ests.retain(|e| {
            e.estimate_number.to_lowercase().contains(&needle)
                || e.rfq
                    .as_ref()
                    .is_some_and(|r| r.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Number => ests.sort_by(|a, b| a.estimate_number.cmp(&b.estimate_number)),
        SortField::Hours => ests.sort_by(|a, b| {
            a.total_hours
                .partial_cmp(&b.total_hours)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortField::Cost => ests.sort_by(|a, b| {
            a.total_cost
                .partial_cmp(&b.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortField::Created => ests.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        ests.reverse();
    }

    if let Some(limit) = args.limit {
        ests.truncate(limit);
    }

    if args.count {
        println!("{}", ests.len());
        return Ok(());
    }

    if ests.is_empty() {
        println!("No estimations found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(ests.iter().map(|e| e.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ests).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&ests).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,number,rfq,items,total_hours,total_cost,status");
            for e in &ests {
                let short_id = short_ids.get_short_id(&e.id.to_string()).unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{}",
                    short_id,
                    e.id,
                    e.estimate_number,
                    escape_csv(e.rfq.as_deref().unwrap_or("")),
                    e.item_count(),
                    e.total_hours,
                    e.total_cost,
                    e.review_status
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<8} {:<17} {:<12} {:<16} {:>6} {:>10} {:>12} {:<10}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("NUMBER").bold(),
                style("RFQ").bold(),
                style("ITEMS").bold(),
                style("HOURS").bold(),
                style("COST").bold(),
                style("STATUS").bold()
            );
            println!("{}", "-".repeat(100));

            for e in &ests {
                let short_id = short_ids.get_short_id(&e.id.to_string()).unwrap_or_default();
                let status_styled = match e.review_status {
                    ReviewStatus::Draft => style(e.review_status.to_string()).white(),
                    ReviewStatus::Approved => style(e.review_status.to_string()).green(),
                    ReviewStatus::Rejected => style(e.review_status.to_string()).red(),
                };

                println!(
                    "{:<8} {:<17} {:<12} {:<16} {:>6} {:>10} {:>12.2} {:<10}",
                    style(short_id).cyan(),
                    format_short_id(&e.id),
                    e.estimate_number,
                    truncate_str(e.rfq.as_deref().unwrap_or("-"), 14),
                    e.item_count(),
                    e.total_hours,
                    e.total_cost,
                    status_styled
                );
            }

            println!();
            println!(
                "{} estimation(s) found. Use {} to reference by short ID.",
                style(ests.len()).cyan(),
                style("@N").cyan()
            );
        }
        OutputFormat::Id => {
            for e in &ests {
                println!("{}", e.id);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let items = args
        .items
        .iter()
        .map(|s| parse_item(s))
        .collect::<Result<Vec<_>>>()?;

    let mut est = Estimation::new(args.rfq, items, args.margin, args.discount, config.author());
    est.notes = args.notes;

    let path = project.entity_path(EntityPrefix::Estm, &est.id);
    loader::save_entity(&path, &est)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(est.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created estimation {} ({})",
        style("✓").green(),
        style(&est.estimate_number).cyan(),
        style(format!("@{}", short_id)).cyan()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} item(s) | {} h | {:.2} total",
        est.item_count(),
        est.total_hours,
        est.total_cost
    );

    if args.edit {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&path).into_diagnostic()?;
    }

    Ok(())
}

fn run_review(args: ReviewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut est) =
        load_record::<Estimation>(&project, EntityPrefix::Estm, &args.id, "estimation")?;

    let to = match args.status {
        ReviewVerdict::Approved => ReviewStatus::Approved,
        ReviewVerdict::Rejected => ReviewStatus::Rejected,
    };

    est.review(to, args.comments.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;
    loader::save_entity(&path, &est)?;

    let verdict_styled = match to {
        ReviewStatus::Approved => style(to.to_string()).green().bold(),
        _ => style(to.to_string()).red().bold(),
    };

    println!(
        "{} Estimation {} {}",
        style("✓").green(),
        style(&est.estimate_number).cyan(),
        verdict_styled
    );

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, est) =
        load_record::<Estimation>(&project, EntityPrefix::Estm, &args.id, "estimation")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&est).into_diagnostic()?;
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
        load_record::<Estimation>(&project, EntityPrefix::Estm, &args.id, "estimation")?;

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
    let (path, mut est) =
        load_record::<Estimation>(&project, EntityPrefix::Estm, &args.id, "estimation")?;

    if est.lifecycle == Lifecycle::Deleted {
        println!(
            "{} Estimation {} is already deleted",
            style("!").yellow(),
            style(&est.estimate_number).cyan()
        );
        return Ok(());
    }

    est.lifecycle = Lifecycle::Deleted;
    loader::save_entity(&path, &est)?;

    println!(
        "{} Deleted estimation {} (record kept on disk)",
        style("✓").green(),
        style(&est.estimate_number).cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_full() {
        let item = parse_item("EMC Testing:2:3:100:Includes retest").unwrap();
        assert_eq!(item.test_type, "EMC Testing");
        assert_eq!(item.units_under_test, 2);
        assert_eq!(item.hours_per_unit, 3.0);
        assert_eq!(item.rate_per_hour, 100.0);
        assert_eq!(item.remarks.as_deref(), Some("Includes retest"));
    }

    #[test]
    fn test_parse_item_without_remarks() {
        let item = parse_item("RF Testing:1:8.5:120").unwrap();
        assert_eq!(item.units_under_test, 1);
        assert_eq!(item.hours_per_unit, 8.5);
        assert!(item.remarks.is_none());
    }

    #[test]
    fn test_parse_item_rejects_malformed() {
        assert!(parse_item("EMC Testing:2:3").is_err());
        assert!(parse_item("EMC Testing:two:3:100").is_err());
        assert!(parse_item("EMC Testing:0:3:100").is_err());
        assert!(parse_item("EMC Testing:2:-3:100").is_err());
    }
}
