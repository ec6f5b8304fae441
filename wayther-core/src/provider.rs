use crate::{
    Config, ForecastResponse,
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the current conditions and hourly forecast for `location`.
    async fn forecast(&self, location: &str) -> anyhow::Result<ForecastResponse>;
}

#[async_trait]
impl<P: WeatherProvider + ?Sized> WeatherProvider for Box<P> {
    async fn forecast(&self, location: &str) -> anyhow::Result<ForecastResponse> {
        (**self).forecast(location).await
    }
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    Ok(Box::new(WeatherApiProvider::new(api_key.to_owned())))
}
