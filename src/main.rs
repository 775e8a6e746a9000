use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use go_short_link::cli::{Cli, Commands};
use go_short_link::config::{StaticConfig, get_config, init_config_from};
use go_short_link::errors::ShortlinkError;
use go_short_link::runtime::modes::run_server;
use go_short_link::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::GenerateConfig { output } => generate_config(output.as_deref()),
        Commands::Serve => {
            init_config_from(&cli.config);
            let config = get_config();
            let _guard = init_logging(&config.logging);
            run_server(config).await.inspect_err(|e| {
                if let Some(err) = e.downcast_ref::<ShortlinkError>() {
                    eprintln!("{}", err.format_colored());
                }
            })
        }
    }
}

fn generate_config(output: Option<&str>) -> anyhow::Result<()> {
    match output {
        None => {
            println!("{}", StaticConfig::generate_sample_config());
            Ok(())
        }
        Some(path) => {
            StaticConfig::default()
                .save_to_file(path)
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Failed to write {}", path))?;
            println!("{} {}", "Sample configuration written to".green(), path.bold());
            Ok(())
        }
    }
}
