//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration of the API base URL and default username
//! - The request dispatcher and its HTTP transport
//! - Normalization of raw responses into a display model
//! - The dashboard state that ties the two together
//!
//! It is used by `dashboard-cli`, but can also back other front ends.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod render;
pub mod state;

pub use config::Config;
pub use dispatch::{Dispatcher, HttpReply, HttpTransport, WeatherTransport};
pub use error::DashboardError;
pub use model::{Credentials, ForecastDays, Query, QueryKind, RawWeatherResponse};
pub use render::{DisplayModel, ResultView, Sparkline, TempTheme, render};
pub use state::UiState;
