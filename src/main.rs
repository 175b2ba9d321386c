use clap::Parser;
use ldt::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => ldt::cli::commands::init::run(args),
        Commands::Inst(cmd) => ldt::cli::commands::inst::run(cmd, &global),
        Commands::Cons(cmd) => ldt::cli::commands::cons::run(cmd, &global),
        Commands::Cal(cmd) => ldt::cli::commands::cal::run(cmd, &global),
        Commands::Qc(cmd) => ldt::cli::commands::qc::run(cmd, &global),
        Commands::Est(cmd) => ldt::cli::commands::est::run(cmd, &global),
        Commands::Txn(cmd) => ldt::cli::commands::txn::run(cmd, &global),
        Commands::Nc(cmd) => ldt::cli::commands::nc::run(cmd, &global),
    }
}
