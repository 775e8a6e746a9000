//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Go-Short-Link - short-link redirection service
#[derive(Parser, Debug)]
#[command(name = "go-short-link")]
#[command(version)]
#[command(about = "Short-link redirection service with a read-through cache", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print a sample configuration, or write it to a file
    GenerateConfig {
        /// Output file path (default: stdout)
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["go-short-link"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["go-short-link", "serve", "--config", "/etc/gsl.toml"]);
        assert_eq!(cli.config, "/etc/gsl.toml");
        assert_eq!(cli.command, Some(Commands::Serve));
    }

    #[test]
    fn test_generate_config_output() {
        let cli = Cli::parse_from(["go-short-link", "-c", "x.toml", "generate-config", "out.toml"]);
        assert_eq!(
            cli.command,
            Some(Commands::GenerateConfig {
                output: Some("out.toml".to_string())
            })
        );
    }
}
