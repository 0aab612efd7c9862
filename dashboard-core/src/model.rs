use std::{
    fmt,
    num::{IntErrorKind, NonZeroU32},
    str::FromStr,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Untyped response body. Its shape depends on the query kind and is
/// never validated up front.
pub type RawWeatherResponse = serde_json::Value;

/// Basic-auth credentials typed in by the operator.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty before anything goes on the wire.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Current,
    Forecast,
    History,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Current => "current",
            QueryKind::Forecast => "forecast",
            QueryKind::History => "history",
        }
    }

    /// Heading shown in the meta bar.
    pub fn label(&self) -> &'static str {
        match self {
            QueryKind::Current => "Current",
            QueryKind::Forecast => "Forecast",
            QueryKind::History => "History",
        }
    }

    pub const fn all() -> &'static [QueryKind] {
        &[QueryKind::Current, QueryKind::Forecast, QueryKind::History]
    }
}

/// Meta bar label for an optional kind; falls back to "Weather".
pub fn label_request_type(kind: Option<QueryKind>) -> &'static str {
    kind.map_or("Weather", |k| k.label())
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for QueryKind {
    type Error = DashboardError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "current" => Ok(QueryKind::Current),
            "forecast" => Ok(QueryKind::Forecast),
            "history" => Ok(QueryKind::History),
            _ => Err(DashboardError::validation(format!(
                "Unknown query kind '{value}'. Supported kinds: current, forecast, history."
            ))),
        }
    }
}

/// Number of forecast days; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastDays(NonZeroU32);

impl ForecastDays {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl FromStr for ForecastDays {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<NonZeroU32>()
            .map(ForecastDays)
            .map_err(|e| {
                let message = match e.kind() {
                    IntErrorKind::PosOverflow => {
                        format!("Forecast days must be at most {}", u32::MAX)
                    }
                    _ => "Forecast days must be at least 1".to_string(),
                };
                DashboardError::validation(message)
            })
    }
}

impl fmt::Display for ForecastDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single validated request, consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Current { location: String },
    Forecast {
        location: String,
        days: ForecastDays,
    },
    History { location: String, date: NaiveDate },
}

impl Query {
    pub fn current(location: &str) -> Result<Self, DashboardError> {
        Ok(Query::Current {
            location: require_location(location)?,
        })
    }

    pub fn forecast(location: &str, days: &str) -> Result<Self, DashboardError> {
        let location = require_location(location)?;
        Ok(Query::Forecast {
            location,
            days: days.parse()?,
        })
    }

    pub fn history(location: &str, date: &str) -> Result<Self, DashboardError> {
        let location = require_location(location)?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            DashboardError::validation("History date must use the yyyy-MM-dd format")
        })?;
        Ok(Query::History { location, date })
    }

    /// Build a query from its kind plus the one auxiliary value the kind
    /// needs (day count for forecasts, date for history; ignored for current).
    pub fn from_parts(
        kind: QueryKind,
        location: &str,
        extra: &str,
    ) -> Result<Self, DashboardError> {
        match kind {
            QueryKind::Current => Self::current(location),
            QueryKind::Forecast => Self::forecast(location, extra),
            QueryKind::History => Self::history(location, extra),
        }
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Current { .. } => QueryKind::Current,
            Query::Forecast { .. } => QueryKind::Forecast,
            Query::History { .. } => QueryKind::History,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Query::Current { location }
            | Query::Forecast { location, .. }
            | Query::History { location, .. } => location.as_str(),
        }
    }

    /// Path segments below the API base, unencoded.
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = vec!["weather".to_string(), self.kind().as_str().to_string()];
        segments.push(self.location().to_string());
        match self {
            Query::Current { .. } => {}
            Query::Forecast { days, .. } => segments.push(days.to_string()),
            Query::History { date, .. } => segments.push(date.format("%Y-%m-%d").to_string()),
        }
        segments
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path_segments().join("/"))
    }
}

fn require_location(location: &str) -> Result<String, DashboardError> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::validation("Location must not be empty"));
    }
    Ok(trimmed.to_string())
}
