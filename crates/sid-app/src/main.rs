use anyhow::{Context, Result};
use clap::Parser;
use sid_core::cancel::CancelToken;
use sid_core::config::MatchConfig;

pub mod cli;
pub mod commands;

use cli::Command;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config
    let mut config = resolve_config(&cli)?;
    if let Some(threads) = cli.threads {
        config.threads = threads;
        config.clamp_all();
    }

    // 4. Pool rayon
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
        .context("Impossible de configurer le pool rayon")?;

    // 5. Ctrl-C → annulation coopérative
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::warn!("Interruption demandée, arrêt en cours...");
        handler_token.cancel();
    }) {
        log::warn!("Handler Ctrl-C non installé : {e}");
    }

    // 6. Dispatcher
    match cli.command {
        Command::Identify {
            probe,
            database,
            train,
            matching,
        } => {
            matching.apply(&mut config);
            commands::identify(&config, &probe, database, train, cancel)
        }
        Command::Evaluate {
            train,
            test,
            report,
            json_report,
            failure_policy,
            sequential,
            matching,
        } => {
            matching.apply(&mut config);
            let args = commands::EvaluateArgs {
                train,
                test,
                report,
                json_report,
                failure_policy,
                sequential,
            };
            commands::evaluate_sets(&config, args, cancel)
        }
        Command::Enroll {
            label,
            features,
            database,
        } => commands::enroll_speaker(&config, &label, &features, database),
        Command::Align {
            first,
            second,
            width,
        } => commands::align_pair(&config, &first, &second, width),
        Command::Inspect { dir, single } => commands::inspect_store(&dir, single),
        Command::Export { from, to, single } => commands::export(&from, &to, single),
    }
}

/// Config file when present, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<MatchConfig> {
    if cli.config.exists() {
        sid_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(MatchConfig::default())
    }
}
