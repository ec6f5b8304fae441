use serde::{Deserialize, Serialize};

/// Top-level shape of the WeatherAPI.com `forecast.json` response.
///
/// Every field defaults when absent, so partial payloads (and older cache
/// files) still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastResponse {
    pub location: Location,
    pub current: Current,
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Current {
    pub last_updated_epoch: i64,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i32,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub humidity: u8,
    pub cloud: u8,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub windchill_c: f64,
    pub windchill_f: f64,
    pub heatindex_c: f64,
    pub heatindex_f: f64,
    pub dewpoint_c: f64,
    pub dewpoint_f: f64,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub uv: f64,
    pub gust_mph: f64,
    pub gust_kph: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub text: String,
    pub icon: String,
    pub code: u32,
    /// Filled in locally from `code`, never sent by the API.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastDay {
    pub date: String,
    pub date_epoch: i64,
    pub day: Day,
    pub astro: Astro,
    pub hour: Vec<Hour>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Day {
    pub maxtemp_c: f64,
    pub maxtemp_f: f64,
    pub mintemp_c: f64,
    pub mintemp_f: f64,
    pub avgtemp_c: f64,
    pub avgtemp_f: f64,
    pub maxwind_mph: f64,
    pub maxwind_kph: f64,
    pub totalprecip_mm: f64,
    pub totalprecip_in: f64,
    pub totalsnow_cm: f64,
    pub avgvis_km: f64,
    pub avgvis_miles: f64,
    pub avghumidity: u8,
    pub daily_will_it_rain: u8,
    pub daily_chance_of_rain: u8,
    pub daily_will_it_snow: u8,
    pub daily_chance_of_snow: u8,
    pub condition: Condition,
    pub uv: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Astro {
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub moon_illumination: u8,
    pub is_moon_up: u8,
    pub is_sun_up: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hour {
    pub time_epoch: i64,
    pub time: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: u8,
    pub condition: Condition,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i32,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub pressure_in: f64,
    pub precip_mm: f64,
    pub precip_in: f64,
    pub snow_cm: f64,
    pub humidity: u8,
    pub cloud: u8,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub windchill_c: f64,
    pub windchill_f: f64,
    pub heatindex_c: f64,
    pub heatindex_f: f64,
    pub dewpoint_c: f64,
    pub dewpoint_f: f64,
    pub will_it_rain: u8,
    pub chance_of_rain: u8,
    pub will_it_snow: u8,
    pub chance_of_snow: u8,
    pub vis_km: f64,
    pub vis_miles: f64,
    pub gust_mph: f64,
    pub gust_kph: f64,
    pub uv: f64,
    pub short_rad: f64,
    pub diff_rad: f64,
}

/// Simplified view of a forecast used for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub current: WeatherCurrent,
    pub hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherCurrent {
    pub location: String,
    pub region: String,
    pub country: String,
    pub emoji: String,
    pub condition: String,
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: u8,
    pub wind_kph: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub time_epoch: i64,
    pub emoji: String,
    pub condition: String,
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub chance_of_rain: u8,
}

impl From<&ForecastResponse> for Weather {
    fn from(response: &ForecastResponse) -> Self {
        let current = WeatherCurrent {
            location: response.location.name.clone(),
            region: response.location.region.clone(),
            country: response.location.country.clone(),
            emoji: response.current.condition.emoji.clone(),
            condition: response.current.condition.text.clone(),
            temp_c: response.current.temp_c,
            feelslike_c: response.current.feelslike_c,
            humidity: response.current.humidity,
            wind_kph: response.current.wind_kph,
        };

        let hourly = response
            .forecast
            .forecastday
            .iter()
            .flat_map(|day| day.hour.iter())
            .map(|hour| HourlyForecast {
                time_epoch: hour.time_epoch,
                emoji: hour.condition.emoji.clone(),
                condition: hour.condition.text.clone(),
                temp_c: hour.temp_c,
                feelslike_c: hour.feelslike_c,
                chance_of_rain: hour.chance_of_rain,
            })
            .collect();

        Self { current, hourly }
    }
}
