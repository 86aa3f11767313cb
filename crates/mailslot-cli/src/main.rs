//! mailslot CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use mailslot_cli::cli::{Cli, Command, ConfigAction};
use mailslot_cli::commands;
use mailslot_cli::commands::serve::ServeOverrides;
use mailslot_cli::config::AppConfig;
use mailslot_cli::error::CliResult;
use mailslot_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match cli.config {
        Some(ref path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let debug = cli.debug || config.debug;
    if let Err(e) = init_tracing(tracing_config(cli.command.as_ref(), debug)) {
        eprintln!("warning: {}", e);
    }

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn tracing_config(command: Option<&Command>, debug: bool) -> TracingConfig {
    match command {
        Some(Command::Serve { json_logs, .. }) => {
            let format = if *json_logs {
                TracingOutputFormat::Json
            } else {
                TracingOutputFormat::Compact
            };
            let config = TracingConfig::server().with_format(format);
            if debug {
                config.with_level(Level::DEBUG)
            } else {
                config
            }
        }
        _ => TracingConfig::cli(debug),
    }
}

async fn run(command: Option<Command>, config: &AppConfig) -> CliResult<ExitCode> {
    match command {
        Some(Command::Serve { bind, port, .. }) => {
            commands::serve::run(config, ServeOverrides { bind, port }).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Analyze { email }) => {
            let handler = commands::build_handler(config)?;
            let ok = commands::analyze::analyze(&handler, &email).await?;
            Ok(exit_code(ok))
        }
        Some(Command::Schedule { event }) => {
            let handler = commands::build_handler(config)?;
            let ok = commands::analyze::schedule(&handler, &event).await?;
            Ok(exit_code(ok))
        }
        Some(Command::Config { action }) => {
            match action {
                ConfigAction::Dump => commands::config::dump(config)?,
                ConfigAction::Validate => commands::config::validate(config)?,
                ConfigAction::Path => commands::config::path()?,
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("mailslot - Turn meeting emails into bookable slots");
            println!();
            println!("Run 'mailslot --help' for usage information.");
            println!();
            println!("Quick start:");
            println!(
                "  1. Add [google] and [openai] sections to {}",
                AppConfig::default_path().display()
            );
            println!("  2. Check them: mailslot config validate");
            println!("  3. Start the service: mailslot serve");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
