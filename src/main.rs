use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vetbox::cli::args::{Cli, Commands, ConfigArgs};
use vetbox::cli::commands;
use vetbox::config::{Config, Paths};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_env("VETBOX_LOG").ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let paths = Paths::resolve(cli.home)?;
    let config = Config::load_from_path(&paths.config_file)?;
    let format = cli.output.unwrap_or(config.general.default_output);

    let output = match cli.command {
        Commands::Config(ConfigArgs { command }) => commands::config(&paths, command, format)?,
        command => {
            let outbox = commands::open_outbox(&paths, &config, cli.offline)?;
            match command {
                Commands::Submit(args) => commands::submit(&outbox, args, format)?,
                Commands::Drain => commands::drain(&outbox, format)?,
                Commands::Status => commands::status(&outbox, format)?,
                Commands::List => commands::list(&outbox, format)?,
                Commands::Discard { position } => commands::discard(&outbox, position, format)?,
                Commands::Clear { force } => commands::clear(&outbox, force, format)?,
                Commands::Watch { interval, once } => {
                    commands::watch(&outbox, &config, interval, once, format)?
                }
                Commands::Config(_) => String::new(),
            }
        }
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
