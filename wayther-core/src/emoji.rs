//! WeatherAPI.com condition codes to emoji.

use crate::model::ForecastResponse;

/// Shown for condition codes we don't know about.
pub const UNKNOWN_EMOJI: &str = "❓";

pub fn emoji_for_code(code: u32) -> &'static str {
    match code {
        1000 => "☀️",
        1003 => "⛅",
        1006 => "☁️",
        1009 => "🌥️",
        1030 | 1135 | 1147 => "🌫️",
        1063 | 1150 | 1153 | 1180 | 1183 | 1240 => "🌦️",
        1186 | 1189 | 1192 | 1195 | 1243 | 1246 => "🌧️",
        1066 | 1210 | 1213 | 1216 | 1255 => "🌨️",
        1114 | 1117 | 1219 | 1222 | 1225 | 1258 => "❄️",
        1069 | 1072 | 1168 | 1171 | 1198 | 1201 | 1204 | 1207 | 1237 | 1249 | 1252 | 1261
        | 1264 => "🧊",
        1087 | 1273 | 1276 => "⛈️",
        1279 | 1282 => "🌩️",
        _ => UNKNOWN_EMOJI,
    }
}

impl ForecastResponse {
    /// Fill in the emoji of every condition in the response.
    pub fn annotate_emoji(&mut self) {
        let current = &mut self.current.condition;
        current.emoji = emoji_for_code(current.code).to_owned();

        for day in &mut self.forecast.forecastday {
            day.day.condition.emoji = emoji_for_code(day.day.condition.code).to_owned();

            for hour in &mut day.hour {
                hour.condition.emoji = emoji_for_code(hour.condition.code).to_owned();
            }
        }
    }
}
