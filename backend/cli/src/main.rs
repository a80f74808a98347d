mod config_cmd;
mod extract_cmd;
mod normalize_cmd;
mod serve_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use orderiq_config::{load_and_prepare, log_report, validate, OrderIqConfig, ValidationReport};
use orderiq_logging::init_logger;

#[derive(Parser)]
#[command(name = "orderiq")]
#[command(about = "OrderIQ: turn order messages and faxes into spreadsheets")]
#[command(version)]
struct Cli {
    /// Config file (default: $ORDERIQ_CONFIG, then ~/.orderiq/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Extract orders once through the configured backend and print them as JSON
    Extract {
        /// An order message; repeat for a batch
        #[arg(short, long = "text")]
        texts: Vec<String>,
        /// Read one more message from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Extract from an image instead of text
        #[arg(short, long, conflicts_with_all = ["texts", "file"])]
        image: Option<PathBuf>,
        /// Also write the spreadsheet to the output directory
        #[arg(long)]
        xlsx: bool,
        /// Print a table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Normalize saved raw model output offline (`-` reads stdin)
    Normalize {
        #[arg(default_value = "-")]
        input: String,
        /// Print a table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Query the health endpoint of a running service
    Status {
        /// Base URL of the service (default: derived from the config)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_and_prepare(cli.config.as_deref()).await?;

    let logging = config.logging.clone().unwrap_or_default();
    let log_dir = match cli.command {
        Commands::Serve { .. } => logging.dir.clone(),
        _ => None,
    };
    init_logger(
        log_dir.as_deref(),
        &config.log_level(),
        logging.json.unwrap_or(false),
    )?;

    match cli.command {
        Commands::Serve { port, bind } => {
            checked_config(&config, "start")?;
            serve_cmd::run(config, port, bind).await?;
        }
        Commands::Extract {
            texts,
            file,
            image,
            xlsx,
            table,
        } => {
            checked_config(&config, "extract")?;
            let input = extract_cmd::collect_input(texts, file, image).await?;
            extract_cmd::run(&config, input, xlsx, table).await?;
        }
        Commands::Normalize { input, table } => {
            normalize_cmd::run(&config, &input, table).await?;
        }
        Commands::Status { url } => {
            status_cmd::run(&config, url).await?;
        }
        Commands::Config => {
            config_cmd::run(&config, cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Validate the config, log what was found, and stop on errors.
fn checked_config(config: &OrderIqConfig, action: &str) -> Result<()> {
    let report = validate(config);
    log_report(&report);
    ensure_valid(&report, action)
}

fn ensure_valid(report: &ValidationReport, action: &str) -> Result<()> {
    if !report.is_valid() {
        bail!(
            "Refusing to {action} with {} config error(s); run `orderiq config` for details",
            report.errors.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use orderiq_config::{BackendConfig, SchemaConfig};

    fn mock_config() -> OrderIqConfig {
        OrderIqConfig {
            backend: Some(BackendConfig {
                provider: Some("mock".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn extract_accepts_repeated_text() {
        let cli = Cli::parse_from(["orderiq", "extract", "-t", "2 tea", "--text", "3 milk", "--xlsx"]);
        match cli.command {
            Commands::Extract { texts, xlsx, .. } => {
                assert_eq!(texts, ["2 tea", "3 milk"]);
                assert!(xlsx);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn image_conflicts_with_text() {
        assert!(Cli::try_parse_from(["orderiq", "extract", "-t", "x", "--image", "fax.png"]).is_err());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["orderiq", "serve", "--port", "9000", "--config", "/etc/orderiq.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/orderiq.yaml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));
    }

    #[test]
    fn empty_sentinel_stops_the_command() {
        let mut config = mock_config();
        config.schema = Some(SchemaConfig {
            fields: None,
            sentinel: Some(String::new()),
        });
        let err = ensure_valid(&validate(&config), "extract").unwrap_err();
        assert!(err.to_string().contains("Refusing to extract"));
    }

    #[test]
    fn valid_config_passes() {
        assert!(ensure_valid(&validate(&mock_config()), "extract").is_ok());
    }
}
