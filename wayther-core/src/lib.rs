//! Core library for the `wayther` CLI.
//!
//! This crate defines:
//! - Configuration loading, merging & interactive creation
//! - The on-disk response cache
//! - Abstraction over the WeatherAPI.com forecast endpoint
//! - Shared domain models (upstream payload, simplified view)
//!
//! It is used by `wayther-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod emoji;
pub mod forecast;
pub mod model;
pub mod provider;

pub use cache::{Cache, CacheEntry, CacheError};
pub use config::{Config, ConfigPaths, ConfigPrompter, OutputFormat};
pub use forecast::CachedForecast;
pub use model::{ForecastResponse, HourlyForecast, Weather, WeatherCurrent};
pub use provider::{WeatherProvider, provider_from_config};
