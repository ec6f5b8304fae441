//! Table and status-bar JSON rendering.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use prettytable::{Table, format, row};
use serde::Serialize;
use wayther_core::{Config, HourlyForecast, OutputFormat, Weather};

use crate::template::{self, clock};

/// Hours further out than this end the forecast list.
const FORECAST_HORIZON_HOURS: i64 = 23;

/// Shape expected by status bars such as waybar.
#[derive(Debug, Serialize)]
struct StatusLine {
    text: String,
    tooltip: String,
}

pub fn render(weather: &Weather, config: &Config, now: DateTime<Utc>) -> Result<String> {
    match config.output() {
        OutputFormat::Table => render_table(weather, config, now),
        OutputFormat::Json => render_json(weather, config, now),
    }
}

fn render_table(weather: &Weather, config: &Config, now: DateTime<Utc>) -> Result<String> {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(row!["Current:"]);
    let current = template::render("table-current", config.current_template(), &weather.current)?;
    table.add_row(row![current]);

    let hours = upcoming_hours(&weather.hourly, config.forecast_hours(), now);
    if config.forecast_hours() > 0 {
        table.add_row(row!["Hourly Forecast:"]);
        for hour in hours {
            let line = template::render("table-hourly", config.forecast_template(), hour)?;
            table.add_row(row![format!("{} : {}", clock(hour.time_epoch), line)]);
        }
    }

    Ok(table.to_string())
}

fn render_json(weather: &Weather, config: &Config, now: DateTime<Utc>) -> Result<String> {
    let text = template::render("json-text", config.short_template(), &weather.current)?;

    let tooltip = upcoming_hours(&weather.hourly, config.forecast_hours(), now)
        .into_iter()
        .map(|hour| {
            template::render("json-tooltip", config.forecast_template(), hour)
                .map(|line| format!(" {}: {} ", clock(hour.time_epoch), line))
        })
        .collect::<Result<Vec<_>>>()?
        .join("\r");

    serde_json::to_string(&StatusLine { text, tooltip }).context("Failed to serialize JSON output")
}

/// Status-bar friendly replacement for a failed lookup.
pub fn error_json(err: &anyhow::Error) -> String {
    serde_json::json!({
        "text": "N/A ☢",
        "tooltip": format!(" error fetching weather: {err:#} "),
    })
    .to_string()
}

/// Hours from `now` on, at most `limit`, stopping after the first one past
/// the forecast horizon.
fn upcoming_hours(
    hourly: &[HourlyForecast],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<&HourlyForecast> {
    let start = now.timestamp();
    let horizon = (now + Duration::hours(FORECAST_HORIZON_HOURS)).timestamp();

    let mut hours = Vec::new();
    for hour in hourly {
        if hours.len() >= limit {
            break;
        }
        if hour.time_epoch < start {
            continue;
        }
        hours.push(hour);
        if hour.time_epoch > horizon {
            break;
        }
    }
    hours
}
