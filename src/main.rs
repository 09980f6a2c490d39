use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use nodewatch::app::App;
use nodewatch::cli::{Cli, Commands, ConfigCommands, DashboardArgs};
use nodewatch::core::GatewayClient;
use nodewatch::utils::{self, AppConfig, DEFAULT_CLIENT_TIMEOUT};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win over it
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        None => {
            // No command - run interactive TUI
            handle_dashboard(load_config(config_path)?, DashboardArgs::default()).await?;
        }
        #[cfg(feature = "server")]
        Some(Commands::Serve(args)) => {
            let mut config = load_config(config_path)?;
            args.apply(&mut config.gateway);
            config.ensure_valid()?;
            utils::init_logging();
            nodewatch::server::run(config.gateway).await?;
        }
        Some(Commands::Dashboard(args)) => {
            handle_dashboard(load_config(config_path)?, args).await?;
        }
        Some(Commands::Instances { api_url }) => {
            let api_url = match api_url {
                Some(url) => url,
                None => load_config(config_path)?.dashboard.api_url,
            };
            handle_instances(api_url).await?;
        }
        Some(Commands::Snapshot {
            instance,
            api_url,
            pretty,
        }) => {
            let api_url = match api_url {
                Some(url) => url,
                None => load_config(config_path)?.dashboard.api_url,
            };
            handle_snapshot(api_url, instance, pretty).await?;
        }
        Some(Commands::Config { command }) => {
            handle_config(command, config_path)?;
        }
    }

    Ok(())
}

/// File, then environment; command-line flags are applied by each command
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)?;
    config.apply_env(|key: &str| std::env::var(key).ok())?;
    Ok(config)
}

async fn handle_dashboard(mut config: AppConfig, args: DashboardArgs) -> Result<()> {
    args.apply(&mut config.dashboard);
    config.ensure_valid()?;

    match args.log_file {
        Some(Some(path)) => utils::init_file_logging(&path)?,
        Some(None) => utils::init_file_logging(&utils::default_log_path()?)?,
        None => {}
    }

    let mut app = App::new(&config.dashboard)?;
    app.run().await
}

async fn handle_instances(api_url: String) -> Result<()> {
    let client = GatewayClient::new(&api_url, DEFAULT_CLIENT_TIMEOUT)?;
    let instances = client.list_instances().await?;

    if instances.is_empty() {
        println!("No instances reported by {}", client.base_url());
        return Ok(());
    }

    println!("Instances ({})\n", instances.len());
    for (i, instance) in instances.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, instance);
    }

    Ok(())
}

async fn handle_snapshot(api_url: String, instance: Option<String>, pretty: bool) -> Result<()> {
    let client = GatewayClient::new(&api_url, DEFAULT_CLIENT_TIMEOUT)?;
    let snapshot = client.system(instance.as_deref()).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);

    Ok(())
}

fn handle_config(command: ConfigCommands, explicit: Option<&Path>) -> Result<()> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => AppConfig::config_path()?,
    };

    match command {
        ConfigCommands::Show => {
            let config = load_config(explicit)?;
            let contents = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("# {}", path.display());
            println!("{}", contents);
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                println!("Config file already exists at {}", path.display());
                println!("Use --force to overwrite it.");
                return Ok(());
            }
            AppConfig::default().save(&path)?;
            println!("✓ Wrote default configuration to {}", path.display());
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Validate => {
            let errors = load_config(explicit)?.validate();

            if errors.is_empty() {
                println!("✓ Configuration is valid");
            } else {
                println!("✗ Configuration errors:");
                for error in errors {
                    println!("  - {}", error);
                }
            }
        }
    }

    Ok(())
}
