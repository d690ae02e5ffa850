// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! chanbridge - Telegram channel source connector.
//!
//! Joins the Telegram channels listed in its channel store and forwards
//! their messages to an HTTP event bus.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chanbridge_config::{ConfigError, ConnectorConfig, ReplicaIdentity};

/// chanbridge - Telegram channel source connector.
#[derive(Parser, Debug)]
#[command(name = "chanbridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the connector (default).
    Serve,
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load(cli: &Cli) -> Result<ConnectorConfig, Vec<ConfigError>> {
    match &cli.config {
        Some(path) => chanbridge_config::load_and_validate_path(path),
        None => chanbridge_config::load_and_validate(),
    }
}

/// One-line summary printed by `check-config`. Never includes secrets.
fn summarize(config: &ConnectorConfig) -> String {
    let replica = ReplicaIdentity::resolve(&config.replica)
        .map(|id| id.to_string())
        .unwrap_or_else(|_| "invalid".to_string());
    format!(
        "config ok: replica {} ({replica}), {} bot token(s), store {}, writer {}, api {}:{}",
        config.replica.name,
        config.telegram.bot_tokens.len(),
        config.storage.database_path,
        config.writer.uri,
        config.api.host,
        config.api.port,
    )
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(errors) => {
            chanbridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => println!("{}", summarize(&config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["chanbridge"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["chanbridge", "check-config", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chanbridge.toml");
        std::fs::write(
            &path,
            "[replica]\nname = \"chanbridge-1\"\ncount = 2\n\n[telegram]\nbot_tokens = [\"1:a\", \"2:b\"]\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["chanbridge", "-c", path.to_str().unwrap()]).unwrap();
        let config = load(&cli).unwrap();
        assert_eq!(config.replica.name, "chanbridge-1");
    }

    #[test]
    fn config_short_of_bot_tokens_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chanbridge.toml");
        std::fs::write(
            &path,
            "[replica]\nname = \"chanbridge-1\"\ncount = 2\n\n[telegram]\nbot_tokens = [\"1:a\"]\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["chanbridge", "check-config", "-c", path.to_str().unwrap()])
            .unwrap();
        let errors = load(&cli).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("not enough telegram bot tokens"))
        );
    }

    #[test]
    fn summary_hides_tokens() {
        let mut config = ConnectorConfig::default();
        config.telegram.bot_tokens = vec!["123:secret".into()];
        let summary = summarize(&config);
        assert!(summary.contains("chanbridge-0 (0/1)"));
        assert!(summary.contains("1 bot token(s)"));
        assert!(!summary.contains("secret"));
    }
}
