use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};
use tracing::warn;
use wayther_core::{
    Cache, CachedForecast, Config, ConfigPaths, ConfigPrompter, OutputFormat, Weather,
    WeatherProvider, provider_from_config,
};

use crate::{format, logging, prompt::InquirePrompter};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wayther", version, about = "Weather forecast for your terminal or status bar")]
pub struct Cli {
    /// City or location to look up. Defaults to the location in the config file.
    pub location: Option<String>,

    /// Custom config file, merged over the default one. Created if missing.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format: table or json. Defaults to json when stdout is not a terminal.
    #[arg(short, long)]
    pub output: Option<OutputFormat>,

    /// Number of hourly forecast rows to show.
    #[arg(short, long, value_name = "HOURS")]
    pub forecast_hours: Option<usize>,

    /// Drop stale entries from the forecast cache before the lookup.
    #[arg(long)]
    pub clean_cache: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let is_terminal = io::stdout().is_terminal();
        let logging = logging::init();

        let (paths, config) = match self.load_config(&InquirePrompter, is_terminal) {
            Ok(loaded) => loaded,
            Err(err) => return report(self.forced_output(is_terminal), err),
        };

        logging.set_verbose(config.logger_enabled());

        match self.execute(&paths, &config).await {
            Ok(output) => {
                println!("{output}");
                Ok(())
            }
            Err(err) => report(Some(config.output()), err),
        }
    }

    fn load_config(
        &self,
        prompter: &dyn ConfigPrompter,
        is_terminal: bool,
    ) -> Result<(ConfigPaths, Config)> {
        let paths = ConfigPaths::resolve(self.config.clone())?;
        let mut config = Config::load(&paths, prompter)?;
        self.apply_overrides(&mut config, is_terminal);
        Ok((paths, config))
    }

    /// Command-line values win over the config files.
    fn apply_overrides(&self, config: &mut Config, is_terminal: bool) {
        if let Some(location) = &self.location {
            config.location = Some(location.clone());
        }
        if let Some(output) = self.forced_output(is_terminal) {
            config.output = Some(output);
        }
        if let Some(hours) = self.forecast_hours {
            config.forecast_hours = Some(hours);
        }
    }

    /// Output chosen without looking at the config: the flag, or JSON when
    /// stdout is piped into something like a status bar.
    fn forced_output(&self, is_terminal: bool) -> Option<OutputFormat> {
        self.output.or((!is_terminal).then_some(OutputFormat::Json))
    }

    async fn execute(&self, paths: &ConfigPaths, config: &Config) -> Result<String> {
        let provider = provider_from_config(config)?;

        let cache = match Cache::new(&paths.default) {
            Ok(cache) => Some(cache),
            Err(err) => {
                warn!("forecast cache unavailable, fetching without it: {err}");
                None
            }
        };

        let mut forecast = CachedForecast::new(provider, cache, config.cache_max_age());
        if self.clean_cache {
            forecast.clean()?;
        }

        lookup(&mut forecast, config, Utc::now()).await
    }
}

/// Fetch the configured location and render it.
pub async fn lookup<P: WeatherProvider>(
    forecast: &mut CachedForecast<P>,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<String> {
    let location = config.location().ok_or_else(|| {
        anyhow!(
            "No location provided.\n\
             Hint: pass one as an argument or set `location` in the config file."
        )
    })?;

    let response = forecast.fetch(location).await?;
    format::render(&Weather::from(&response), config, now)
}

/// JSON consumers always get a parseable line, even on failure.
fn report(output: Option<OutputFormat>, err: anyhow::Error) -> Result<()> {
    match output {
        Some(OutputFormat::Json) => {
            println!("{}", format::error_json(&err));
            Ok(())
        }
        _ => Err(err),
    }
}
