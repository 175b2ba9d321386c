//! `ldt init` command - Initialize a new LDT project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    // Create directory if it doesn't exist
    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    match Project::init(&path) {
        Ok(project) => {
            println!(
                "{} Initialized LDT project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Register your first instrument",
                style("ldt inst new").yellow()
            );
            println!(
                "  {} Add consumable stock",
                style("ldt cons new").yellow()
            );
            println!(
                "  {} Check stock and expiry status",
                style("ldt cons list").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} LDT project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let dirs = [
        ".ldt/",
        ".ldt/config.yaml",
        "inventory/instruments/",
        "inventory/consumables/",
        "inventory/calibrations/",
        "inventory/transactions/",
        "quality/checks/",
        "quality/nonconformances/",
        "estimations/",
    ];

    for dir in dirs {
        if root.join(dir).exists() {
            println!("  {}", style(dir).dim());
        }
    }
}
