/// CLI argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::{DashboardSettings, GatewaySettings};

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "nodewatch")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/nodewatch/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP query gateway in front of Prometheus
    #[cfg(feature = "server")]
    Serve(ServeArgs),

    /// Run the terminal dashboard (default)
    Dashboard(DashboardArgs),

    /// List instances known to the gateway
    Instances {
        /// Gateway API base URL
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Fetch one metrics snapshot and print it as JSON
    Snapshot {
        /// Instance to query; omitted means unscoped
        #[arg(short, long)]
        instance: Option<String>,

        /// Gateway API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the config file path
    Path,

    /// Validate configuration
    Validate,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Prometheus base URL
    #[arg(long)]
    pub prometheus_url: Option<String>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Scrape job whose targets are listed as instances
    #[arg(long)]
    pub job: Option<String>,

    /// Reject /api/system requests without an instance
    #[arg(long, value_name = "BOOL")]
    pub require_instance: Option<bool>,

    /// Upstream query timeout (e.g. 10s)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub query_timeout: Option<Duration>,

    /// Disable permissive CORS
    #[arg(long)]
    pub no_cors: bool,
}

impl ServeArgs {
    pub fn apply(&self, settings: &mut GatewaySettings) {
        if let Some(url) = &self.prometheus_url {
            settings.prometheus_url = url.clone();
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(job) = &self.job {
            settings.job = job.clone();
        }
        if let Some(required) = self.require_instance {
            settings.require_instance = required;
        }
        if let Some(timeout) = self.query_timeout {
            settings.query_timeout = timeout;
        }
        if self.no_cors {
            settings.cors = false;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct DashboardArgs {
    /// Gateway API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Time between polls (e.g. 5s, 500ms)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Samples kept per metric
    #[arg(long)]
    pub history: Option<usize>,

    /// Poll all instances together instead of selecting one
    #[arg(short, long)]
    pub global: bool,

    /// Write logs to a file; without a path, uses the data directory
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<Option<PathBuf>>,
}

impl DashboardArgs {
    pub fn apply(&self, settings: &mut DashboardSettings) {
        if let Some(url) = &self.api_url {
            settings.api_url = url.clone();
        }
        if let Some(interval) = self.poll_interval {
            settings.poll_interval = interval;
        }
        if let Some(history) = self.history {
            settings.history = history;
        }
        if self.global {
            settings.global = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AppConfig;

    #[test]
    fn test_no_subcommand_runs_dashboard() {
        let cli = Cli::try_parse_from(["nodewatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_dashboard_flags() {
        let cli = Cli::try_parse_from([
            "nodewatch",
            "dashboard",
            "--poll-interval",
            "500ms",
            "--history",
            "30",
            "--log-file",
        ])
        .unwrap();

        let Some(Commands::Dashboard(args)) = cli.command else {
            panic!("expected dashboard command");
        };
        assert_eq!(args.poll_interval, Some(Duration::from_millis(500)));
        assert_eq!(args.history, Some(30));
        assert_eq!(args.log_file, Some(None));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["nodewatch", "instances", "--config", "/tmp/nw.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/nw.toml")));
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_cli_overrides_env_overrides_file() {
        let mut config = AppConfig::default();
        config.gateway.port = 4100; // from file
        config
            .apply_env(|key: &str| match key {
                "PORT" => Some("5000".to_string()),
                "NODEWATCH_JOB" => Some("hosts".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.gateway.port, 5000);

        let cli = Cli::try_parse_from(["nodewatch", "serve", "--port", "6000", "--require-instance", "false"]).unwrap();
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve command");
        };
        args.apply(&mut config.gateway);

        assert_eq!(config.gateway.port, 6000);
        assert_eq!(config.gateway.job, "hosts");
        assert!(!config.gateway.require_instance);
        assert!(config.gateway.cors);
    }

    #[test]
    fn test_dashboard_args_apply() {
        let mut settings = DashboardSettings::default();
        let args = DashboardArgs {
            api_url: Some("http://gw:4000/api".to_string()),
            global: true,
            ..Default::default()
        };
        args.apply(&mut settings);

        assert_eq!(settings.api_url, "http://gw:4000/api");
        assert!(settings.global);
        assert_eq!(settings.history, 120);
    }
}
