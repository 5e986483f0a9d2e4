//! Ambient weather context.
//!
//! A single background task ([`refresher::WeatherRefresher`]) fetches raw
//! current-weather data, asks the chat model for a one or two sentence
//! summary and publishes it into a [`cache::WeatherCache`]. Handlers read the
//! latest snapshot and inject it as a system message.

pub mod cache;
pub mod config;
pub mod errors;
pub mod refresher;
pub mod source;

pub use cache::{WeatherCache, WeatherPublisher};
pub use config::WeatherConfig;
pub use errors::WeatherError;
pub use refresher::WeatherRefresher;
pub use source::{OpenMeteoSource, WeatherSource};
