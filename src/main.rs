//! Reface DX Librarian CLI
//!
//! Command-line interface for saving and restoring Reface DX voices.

use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use reface_dx::cli::commands::{self, CommandContext};
use reface_dx::cli::{Cli, Commands};
use reface_dx::config::LibrarianConfig;
use reface_dx::Result;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Reface DX Librarian v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        for suggestion in e.recovery_suggestions() {
            eprintln!("  - {}", suggestion);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = LibrarianConfig::load_or_default(cli.config.as_deref())?;
    config.apply_overrides(cli.port, cli.timeout_ms)?;
    debug!("Using config: {:?}", config);

    let ctx = CommandContext::new(config, cli.simulate);
    handle_command(&ctx, cli.command)
}

fn handle_command(ctx: &CommandContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Identify => commands::identify(ctx),
        Commands::Download {
            output,
            dir,
            keep_partial,
        } => commands::download(ctx, output.as_deref(), dir.as_deref(), keep_partial).map(|_| ()),
        Commands::Upload { file, verify } => commands::upload(ctx, &file, verify),
        Commands::GetName => commands::get_name(ctx),
        Commands::SetName { name } => commands::set_name(ctx, &name),
        Commands::List { dir } => commands::list(ctx, dir.as_deref()),
        Commands::Inspect { file, json } => commands::inspect(&file, json),
        Commands::Ports => commands::ports(),
    }
}
