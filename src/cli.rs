use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::LogFormat;

/// otpdeck command-line interface.
#[derive(Debug, Parser)]
#[command(name = "otpdeck")]
#[command(about = "Time-based one-time password authenticator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file. Defaults to <data dir>/otpdeck/config.json
    #[arg(long, global = true, env = "OTPDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store file, overriding the config
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error, or EnvFilter directives)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Add an entry from an otpauth://totp/ URI
    Add { uri: String },
    /// Add an entry from its account name, issuer and shared key
    AddManual {
        #[arg(long)]
        name: String,
        #[arg(long)]
        issuer: String,
        #[arg(long)]
        key: String,
    },
    /// Print stored URIs, oldest first
    List,
    /// Delete a stored URI
    Remove { uri: String },
    /// Print the current code of every entry
    Codes {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print codes and reprint them on every refresh
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_manual() {
        let cli = Cli::try_parse_from([
            "otpdeck", "add-manual", "--name", "alice", "--issuer", "Acme", "--key", "secret",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::AddManual {
                name: "alice".into(),
                issuer: "Acme".into(),
                key: "secret".into(),
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "otpdeck", "watch", "--ticks", "3", "--log-format", "json", "--store", "/tmp/s.json",
        ])
        .unwrap();
        assert_eq!(cli.command, Command::Watch { ticks: Some(3) });
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s.json")));
    }
}
