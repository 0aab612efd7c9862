use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dashboard_core::{Config, Credentials, Dispatcher, QueryKind, UiState};
use tracing::debug;

use crate::{console, output::OutputOptions};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather API dashboard")]
pub struct Cli {
    /// Log request details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API username; defaults to the configured one.
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// API password; prompted for when absent.
    #[arg(
        long,
        global = true,
        env = "WEATHER_API_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Print the rendered result as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Write one SVG sparkline per forecast day into this directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub svg_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current conditions for a location.
    Current {
        /// Location name, e.g. "London".
        location: String,
    },

    /// Show a multi-day forecast.
    Forecast {
        location: String,

        /// Number of days, at least 1.
        #[arg(long, default_value = "1")]
        days: String,
    },

    /// Show historical observations for one day.
    History {
        location: String,

        /// Date in yyyy-MM-dd form.
        #[arg(long, default_value = console::DEFAULT_HISTORY_DATE)]
        date: String,
    },

    /// Interactive dashboard: run queries until you quit.
    Console,

    /// Set the API host, base URL and default username.
    Configure,
}

impl Command {
    /// Kind, location and auxiliary value for the one-shot query commands.
    fn query_parts(&self) -> Option<(QueryKind, &str, &str)> {
        match self {
            Command::Current { location } => Some((QueryKind::Current, location, "")),
            Command::Forecast { location, days } => Some((QueryKind::Forecast, location, days)),
            Command::History { location, date } => Some((QueryKind::History, location, date)),
            Command::Console | Command::Configure => None,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Command::Configure = self.command {
            // Edit what is on disk, not the environment override.
            return console::configure(Config::load_from(&Config::config_file_path()?)?);
        }

        let config = Config::load()?;
        let options = OutputOptions {
            json: self.json,
            svg_dir: self.svg_dir.clone(),
        };

        let dispatcher = Dispatcher::from_config(&config)?;
        let credentials = self.credentials(&config);

        let Some((kind, location, extra)) = self.command.query_parts() else {
            return console::run(&dispatcher, credentials, &options).await;
        };

        let mut state = UiState::begin(kind);
        debug!(?state, "Dispatching one-shot query");

        let outcome = dispatcher
            .dispatch_raw(kind, location, extra, &credentials)
            .await;
        state = UiState::finish(kind, outcome, Utc::now());

        if let Some(message) = state.error() {
            return Err(anyhow!(message.to_owned()));
        }

        options.print(&state)
    }

    fn credentials(&self, config: &Config) -> Credentials {
        let username = match &self.username {
            Some(username) => username.clone(),
            None => config.username.clone(),
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => console::prompt_password(),
        };
        Credentials::new(username, password)
    }
}
