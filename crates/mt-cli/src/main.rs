use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mt_cli::commands::{
    calendar, clear, export, import, records, stats, status, tracking, watch,
};
use mt_cli::{Cli, Commands, Config};
use mt_core::{SystemClock, Tracker};
use mt_db::Database;

/// Loads config, opens the database and restores the tracker from it.
fn open_tracker(cli: &Cli) -> Result<Tracker<Database>> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let tracker_config = config.tracker_config()?;
    let db = Database::open(&config.database_path).with_context(|| {
        format!(
            "failed to open database at {}",
            config.database_path.display()
        )
    })?;
    Ok(Tracker::load(db, Arc::new(SystemClock), tracker_config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Log to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut tracker = open_tracker(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Start => tracking::start(&mut tracker, &mut out)?,
        Commands::Pause => tracking::pause(&mut tracker, &mut out)?,
        Commands::Resume => tracking::resume(&mut tracker, &mut out)?,
        Commands::Stop => tracking::stop(&mut tracker, &mut out)?,
        Commands::Reset => tracking::reset(&mut tracker, &mut out)?,
        Commands::Status { json } => status::run(&tracker, &mut out, *json)?,
        Commands::Watch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(watch::run(&mut tracker, &mut out, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            }))?;
        }
        Commands::Records { date } => records::list(&tracker, &mut out, *date)?,
        Commands::Add { date, start, end } => {
            records::add(&mut tracker, &mut out, *date, *start, *end)?;
        }
        Commands::Edit { id, start, end } => records::edit(&mut tracker, &mut out, id, start, end)?,
        Commands::Delete { id } => records::delete(&mut tracker, &mut out, id)?,
        Commands::Stats { json } => stats::run(&tracker, &mut out, *json)?,
        Commands::Calendar { month } => calendar::run(&tracker, &mut out, *month)?,
        Commands::Export { output } => export::run(&tracker, &mut out, output.as_deref())?,
        Commands::Import { path, yes } => {
            let mut input = io::stdin().lock();
            import::run(&mut tracker, &mut input, &mut out, path, *yes)?;
        }
        Commands::Clear { yes } => {
            let mut input = io::stdin().lock();
            clear::run(&mut tracker, &mut input, &mut out, *yes)?;
        }
    }

    out.flush()?;
    Ok(())
}
