mod cli;
mod client;
mod clipboard;
mod config;
mod daemon;
mod input;
mod ipc;
mod menu;
mod probe;
mod resolver;
mod selection;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};
use config::{Config, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "config failed");
            eprintln!("xpopd: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Daemon {
            force_copy,
            drag_threshold,
        } => {
            config.force_copy |= force_copy;
            if let Some(threshold) = drag_threshold {
                config.drag_threshold = threshold;
            }
            let settings = settings_or_exit("daemon", &config);
            if let Err(e) = daemon::run(settings).await {
                tracing::error!(error = %e, "daemon failed");
                eprintln!("xpopd daemon: {e}");
                std::process::exit(1);
            }
        }
        Command::Probe { force_copy } => {
            config.force_copy |= force_copy;
            let settings = settings_or_exit("probe", &config);
            if let Err(e) = probe::run_probe(settings).await {
                tracing::error!(error = %e, "probe failed");
                eprintln!("xpopd probe: {e}");
                std::process::exit(1);
            }
        }
        Command::MenuState => {
            let settings = settings_or_exit("menu-state", &config);
            if let Err(e) = probe::run_menu_state(settings).await {
                tracing::error!(error = %e, "menu-state failed");
                eprintln!("xpopd menu-state: {e}");
                std::process::exit(1);
            }
        }
        Command::Client { action } => {
            if let Err(e) = client::run(action).await {
                tracing::error!(error = %e, "client failed");
                eprintln!("xpopd client: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn settings_or_exit(command: &str, config: &Config) -> Arc<Settings> {
    match Settings::from_config(config) {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            eprintln!("xpopd {command}: {e}");
            std::process::exit(1);
        }
    }
}
