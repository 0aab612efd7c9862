use chrono::{DateTime, Utc};

use crate::{
    error::DashboardError,
    model::{QueryKind, RawWeatherResponse},
    render::{ResultView, render},
};

/// What the result panel is showing. Replaced wholesale on every transition,
/// so a result and an error can never be present together.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiState {
    #[default]
    Idle,
    Loading {
        kind: QueryKind,
    },
    Failed {
        message: String,
    },
    Loaded {
        response: RawWeatherResponse,
        kind: QueryKind,
        updated_at: DateTime<Utc>,
    },
}

impl UiState {
    pub fn idle() -> Self {
        UiState::Idle
    }

    /// A request has started; any previous result or error is dropped.
    pub fn begin(kind: QueryKind) -> Self {
        UiState::Loading { kind }
    }

    /// A request has completed, one way or the other.
    pub fn finish(
        kind: QueryKind,
        outcome: Result<RawWeatherResponse, DashboardError>,
        now: DateTime<Utc>,
    ) -> Self {
        match outcome {
            Ok(response) => UiState::Loaded {
                response,
                kind,
                updated_at: now,
            },
            Err(err) => UiState::Failed {
                message: err.to_string(),
            },
        }
    }

    /// Triggering controls stay disabled while this is true.
    pub fn is_busy(&self) -> bool {
        matches!(self, UiState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UiState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn query_kind(&self) -> Option<QueryKind> {
        match self {
            UiState::Loading { kind } | UiState::Loaded { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Text for the result panel when there is no rendered result.
    pub fn status_line(&self) -> Option<&str> {
        match self {
            UiState::Idle => Some("No response yet. Run a query to populate this panel."),
            UiState::Loading { .. } => Some("Loading weather data..."),
            UiState::Failed { message } => Some(message),
            UiState::Loaded { .. } => None,
        }
    }

    /// Rendered result; recomputed from the raw response on every call.
    pub fn view(&self) -> Option<ResultView> {
        match self {
            UiState::Loaded {
                response,
                kind,
                updated_at,
            } => Some(render(response, *kind, Some(*updated_at))),
            _ => None,
        }
    }
}
