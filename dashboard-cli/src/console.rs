//! Interactive dashboard loop and the `configure` flow.

use std::fmt;

use anyhow::{Context, Result};
use chrono::Utc;
use dashboard_core::{Config, Credentials, Dispatcher, QueryKind, UiState, WeatherTransport};
use inquire::{InquireError, Password, Select, Text};
use tracing::debug;

use crate::output::OutputOptions;

pub const DEFAULT_LOCATION: &str = "London";
pub const DEFAULT_FORECAST_DAYS: &str = "1";
pub const DEFAULT_HISTORY_DATE: &str = "2025-01-20";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Query(QueryKind),
    Credentials,
    Quit,
}

impl Action {
    const ALL: [Action; 5] = [
        Action::Query(QueryKind::Current),
        Action::Query(QueryKind::Forecast),
        Action::Query(QueryKind::History),
        Action::Credentials,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Query(kind) => write!(f, "Get {}", kind.label()),
            Action::Credentials => f.write_str("Change credentials"),
            Action::Quit => f.write_str("Quit"),
        }
    }
}

/// Form values the operator edits between queries.
#[derive(Debug, Clone)]
struct Form {
    location: String,
    forecast_days: String,
    history_date: String,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS.to_string(),
            history_date: DEFAULT_HISTORY_DATE.to_string(),
        }
    }
}

impl Form {
    /// Auxiliary value the dispatcher needs for a kind.
    fn extra(&self, kind: QueryKind) -> &str {
        match kind {
            QueryKind::Current => "",
            QueryKind::Forecast => &self.forecast_days,
            QueryKind::History => &self.history_date,
        }
    }

    /// Prompt for the fields a kind uses, starting from the current values.
    /// `None` when the operator backs out part way; nothing is applied then.
    fn edit(&self, kind: QueryKind) -> Result<Option<Form>> {
        let mut next = self.clone();
        let Some(location) = ask("Location:", &self.location)? else {
            return Ok(None);
        };
        next.location = location;

        match kind {
            QueryKind::Current => {}
            QueryKind::Forecast => {
                let Some(days) = ask("Forecast days:", &self.forecast_days)? else {
                    return Ok(None);
                };
                next.forecast_days = days;
            }
            QueryKind::History => {
                let Some(date) = ask("History date (yyyy-MM-dd):", &self.history_date)? else {
                    return Ok(None);
                };
                next.history_date = date;
            }
        }
        Ok(Some(next))
    }
}

/// Esc on a prompt means "back out", not failure.
fn or_cancel<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn ask(message: &str, default: &str) -> Result<Option<String>> {
    or_cancel(Text::new(message).with_default(default).prompt())
}

fn password_prompt() -> Password<'static> {
    Password::new("Password:").without_confirmation()
}

/// Run queries one at a time until the operator quits. Each request is
/// awaited before the menu comes back, so only one is ever in flight.
pub async fn run<T: WeatherTransport>(
    dispatcher: &Dispatcher<T>,
    mut credentials: Credentials,
    options: &OutputOptions,
) -> Result<()> {
    let mut form = Form::default();
    let mut state = UiState::idle();
    options.print(&state)?;

    loop {
        let menu = Select::new("Action:", Action::ALL.to_vec());
        let action = or_cancel(menu.prompt())?.unwrap_or(Action::Quit);

        let kind = match action {
            Action::Quit => return Ok(()),
            Action::Credentials => {
                if let Some(updated) = prompt_credentials(&credentials.username)? {
                    credentials = updated;
                }
                continue;
            }
            Action::Query(kind) => kind,
        };

        let Some(edited) = form.edit(kind)? else {
            debug!(kind = %kind, "Query form abandoned");
            continue;
        };
        form = edited;

        state = UiState::begin(kind);
        options.print(&state)?;

        let outcome = dispatcher
            .dispatch_raw(kind, &form.location, form.extra(kind), &credentials)
            .await;
        state = UiState::finish(kind, outcome, Utc::now());
        debug!(kind = %kind, failed = state.error().is_some(), "Query finished");

        options.print(&state)?;
    }
}

/// Password prompt that never fails; a cancelled or unavailable prompt
/// leaves the password empty, which the dispatcher rejects.
pub fn prompt_password() -> String {
    password_prompt().prompt().unwrap_or_else(|err| {
        debug!(error = %err, "Password prompt unavailable");
        String::new()
    })
}

/// `None` when the operator backs out; the caller keeps what it had.
fn prompt_credentials(current_username: &str) -> Result<Option<Credentials>> {
    let Some(username) = ask("Username:", current_username)? else {
        return Ok(None);
    };
    let Some(password) = or_cancel(password_prompt().prompt())? else {
        return Ok(None);
    };
    Ok(Some(Credentials::new(username, password)))
}

fn edit_config(config: &Config) -> Result<Option<Config>> {
    const BASE_URL_PROMPT: &str = "API base URL (absolute, or a path below the host):";

    let Some(host) = ask("API host:", &config.host)? else {
        return Ok(None);
    };
    let Some(base_url) = ask(BASE_URL_PROMPT, &config.base_url)? else {
        return Ok(None);
    };
    let Some(username) = ask("Default username:", &config.username)? else {
        return Ok(None);
    };

    Ok(Some(Config {
        host,
        base_url,
        username,
        ..config.clone()
    }))
}

/// Interactive edit of the persisted settings. Backing out of any prompt
/// leaves the file as it was.
pub fn configure(config: Config) -> Result<()> {
    let Some(config) = edit_config(&config)? else {
        println!("Configuration unchanged.");
        return Ok(());
    };

    config
        .api_base()
        .context("Refusing to save an unusable API base")?;
    config.save()?;

    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
