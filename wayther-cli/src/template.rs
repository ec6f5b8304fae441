//! Tiny `{field}` placeholder templates for user-configurable output lines.
//!
//! `{{` and `}}` produce literal braces.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Local};
use wayther_core::{HourlyForecast, WeatherCurrent};

pub trait TemplateFields {
    fn field(&self, name: &str) -> Option<String>;
}

impl TemplateFields for WeatherCurrent {
    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "location" => self.location.clone(),
            "region" => self.region.clone(),
            "country" => self.country.clone(),
            "emoji" => self.emoji.clone(),
            "condition" => self.condition.clone(),
            "temp_c" => self.temp_c.to_string(),
            "feelslike_c" => self.feelslike_c.to_string(),
            "humidity" => self.humidity.to_string(),
            "wind_kph" => self.wind_kph.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

impl TemplateFields for HourlyForecast {
    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "time" => clock(self.time_epoch),
            "emoji" => self.emoji.clone(),
            "condition" => self.condition.clone(),
            "temp_c" => self.temp_c.to_string(),
            "feelslike_c" => self.feelslike_c.to_string(),
            "chance_of_rain" => self.chance_of_rain.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Local wall-clock `HH:MM` for a unix timestamp.
pub fn clock(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn render(name: &str, template: &str, data: &dyn TemplateFields) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => bail!("template {name}: unclosed placeholder '{{{field}'"),
                    }
                }
                let value = data
                    .field(field.trim())
                    .ok_or_else(|| anyhow!("template {name}: unknown field '{field}'"))?;
                out.push_str(&value);
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
