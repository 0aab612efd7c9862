//! Request dispatch: credential and query checks, the HTTP transport, and
//! turning raw replies into either a response body or a `DashboardError`.

use async_trait::async_trait;
use reqwest::{
    Client, Url,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde_json::Value;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    error::DashboardError,
    model::{Credentials, Query, QueryKind, RawWeatherResponse},
};

/// What came back over the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// The network collaborator: performs one authenticated GET for a query.
#[async_trait]
pub trait WeatherTransport: Send + Sync + Debug {
    async fn get(
        &self,
        query: &Query,
        credentials: &Credentials,
    ) -> Result<HttpReply, DashboardError>;
}

/// reqwest-backed transport rooted at the configured API base.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: Url,
    http: Client,
}

impl HttpTransport {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, DashboardError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        Ok(Self { base, http })
    }

    pub fn from_config(config: &Config) -> Result<Self, DashboardError> {
        Self::new(config.api_base()?, Duration::from_secs(config.timeout_secs))
    }

    /// Full request URL for a query, with each segment percent-encoded.
    pub fn url_for(&self, query: &Query) -> Result<Url, DashboardError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                DashboardError::Config(format!("'{}' cannot be used as an API base", self.base))
            })?;
            segments.pop_if_empty().extend(query.path_segments());
        }
        Ok(url)
    }
}

#[async_trait]
impl WeatherTransport for HttpTransport {
    async fn get(
        &self,
        query: &Query,
        credentials: &Credentials,
    ) -> Result<HttpReply, DashboardError> {
        let url = self.url_for(query)?;
        debug!(url = %url, "Sending weather request");

        let res = self
            .http
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = res
            .text()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        debug!(
            status,
            content_type = ?content_type,
            bytes = body.len(),
            "Received weather response"
        );

        Ok(HttpReply {
            status,
            content_type,
            body,
        })
    }
}

/// Validates a request, hands it to the transport and interprets the reply.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    transport: T,
}

impl Dispatcher<HttpTransport> {
    pub fn from_config(config: &Config) -> Result<Self, DashboardError> {
        Ok(Self::new(HttpTransport::from_config(config)?))
    }
}

impl<T: WeatherTransport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a query. Credentials are checked before anything is sent; no retry.
    #[instrument(
        skip(self, credentials),
        fields(kind = %query.kind(), location = %query.location())
    )]
    pub async fn dispatch(
        &self,
        query: &Query,
        credentials: &Credentials,
    ) -> Result<RawWeatherResponse, DashboardError> {
        if !credentials.is_complete() {
            return Err(DashboardError::AuthenticationMissing);
        }

        let reply = self.transport.get(query, credentials).await?;
        decode_reply(reply)
    }

    /// Same as [`Dispatcher::dispatch`] but from raw form input; `extra` is the
    /// day count for forecasts and the date for history.
    pub async fn dispatch_raw(
        &self,
        kind: QueryKind,
        location: &str,
        extra: &str,
        credentials: &Credentials,
    ) -> Result<RawWeatherResponse, DashboardError> {
        if !credentials.is_complete() {
            return Err(DashboardError::AuthenticationMissing);
        }

        let query = Query::from_parts(kind, location, extra)?;
        self.dispatch(&query, credentials).await
    }
}

/// Interpret a raw reply: JSON when the content type says so, text otherwise.
pub fn decode_reply(reply: HttpReply) -> Result<RawWeatherResponse, DashboardError> {
    let json = reply
        .is_json()
        .then(|| serde_json::from_str::<Value>(&reply.body));

    if reply.is_success() {
        return match json {
            Some(parsed) => parsed.map_err(|e| DashboardError::Decode(e.to_string())),
            None => Ok(Value::String(reply.body)),
        };
    }

    // A failure page served with a JSON content type is still worth showing.
    let data = match json {
        Some(Ok(value)) => value,
        _ => Value::String(reply.body),
    };

    let message = remote_error_message(reply.status, &data);
    warn!(status = reply.status, message = %message, "Weather request failed");
    Err(DashboardError::Remote(message))
}

/// Best-effort failure text: `message`, then `error`, then the serialized
/// body, then a generic status line.
pub fn remote_error_message(status: u16, data: &Value) -> String {
    let message = match data {
        Value::Object(_) | Value::Array(_) => data
            .get("message")
            .and_then(truthy_text)
            .or_else(|| data.get("error").and_then(truthy_text))
            .or_else(|| serde_json::to_string(data).ok()),
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    };

    message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingTransport {
        reply: HttpReply,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn replying(reply: HttpReply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WeatherTransport for RecordingTransport {
        async fn get(
            &self,
            query: &Query,
            _credentials: &Credentials,
        ) -> Result<HttpReply, DashboardError> {
            self.calls.lock().unwrap().push(query.to_string());
            Ok(self.reply.clone())
        }
    }

    fn json_reply(status: u16, body: Value) -> HttpReply {
        HttpReply {
            status,
            content_type: Some("application/json; charset=utf-8".into()),
            body: body.to_string(),
        }
    }

    fn text_reply(status: u16, body: &str) -> HttpReply {
        HttpReply {
            status,
            content_type: Some("text/plain".into()),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn missing_credentials_never_reach_transport() {
        let dispatcher = Dispatcher::new(RecordingTransport::replying(json_reply(200, json!({}))));
        let query = Query::current("London").unwrap();

        let incomplete = [
            Credentials::new("", "pw"),
            Credentials::new("user", ""),
            Credentials::default(),
        ];
        for creds in incomplete {
            let err = dispatcher.dispatch(&query, &creds).await.unwrap_err();
            assert!(matches!(err, DashboardError::AuthenticationMissing));
        }
        assert_eq!(dispatcher.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn invalid_forecast_days_never_reach_transport() {
        let dispatcher = Dispatcher::new(RecordingTransport::replying(json_reply(200, json!({}))));
        let creds = Credentials::new("user", "pw");

        for days in ["0", "abc"] {
            let err = dispatcher
                .dispatch_raw(QueryKind::Forecast, "London", days, &creds)
                .await
                .unwrap_err();
            assert!(matches!(err, DashboardError::Validation(_)), "{days:?}");
        }
        assert_eq!(dispatcher.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn auth_is_checked_before_validation() {
        let dispatcher = Dispatcher::new(RecordingTransport::replying(json_reply(200, json!({}))));
        let err = dispatcher
            .dispatch_raw(QueryKind::Forecast, "London", "0", &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::AuthenticationMissing));
    }

    #[tokio::test]
    async fn successful_json_is_returned_as_is() {
        let body = json!({ "locationName": "London", "tempC": 7.25 });
        let transport = RecordingTransport::replying(json_reply(200, body.clone()));
        let dispatcher = Dispatcher::new(transport);
        let creds = Credentials::new("user", "pw");

        let data = dispatcher
            .dispatch_raw(QueryKind::Current, "London", "", &creds)
            .await
            .unwrap();

        assert_eq!(data, body);
        let calls = dispatcher.transport().calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["/weather/current/London"]);
    }

    #[test]
    fn success_text_body_is_opaque_string() {
        let data = decode_reply(text_reply(200, "sunny")).unwrap();
        assert_eq!(data, Value::String("sunny".into()));
    }

    #[test]
    fn success_with_broken_json_is_decode_error() {
        let reply = HttpReply {
            status: 200,
            content_type: Some("application/json".into()),
            body: "{not json".into(),
        };
        let result = decode_reply(reply);
        assert!(matches!(result, Err(DashboardError::Decode(_))));
    }

    #[test]
    fn remote_message_prefers_message_then_error() {
        let body = json!({ "message": "Unknown city", "error": "x" });
        let err = decode_reply(json_reply(404, body));
        assert_eq!(err.unwrap_err().to_string(), "Unknown city");

        let body = json!({ "message": "", "error": "Unauthorized" });
        let err = decode_reply(json_reply(401, body));
        assert_eq!(err.unwrap_err().to_string(), "Unauthorized");

        let err = decode_reply(json_reply(500, json!({ "status": 500 })));
        assert_eq!(err.unwrap_err().to_string(), r#"{"status":500}"#);
    }

    #[test]
    fn non_json_failure_still_has_a_message() {
        let err = decode_reply(text_reply(502, "Bad Gateway")).unwrap_err();
        assert_eq!(err.to_string(), "Bad Gateway");

        let err = decode_reply(text_reply(503, "")).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 503");

        let reply = HttpReply {
            status: 500,
            content_type: None,
            body: String::new(),
        };
        let err = decode_reply(reply).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[test]
    fn broken_json_on_failure_falls_back_to_text() {
        let reply = HttpReply {
            status: 500,
            content_type: Some("application/json".into()),
            body: "upstream exploded".into(),
        };
        let err = decode_reply(reply).unwrap_err();
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[test]
    fn url_encodes_location_segment() {
        let base = Url::parse("http://localhost:9091/api/v1/").unwrap();
        let transport = HttpTransport::new(base, Duration::from_secs(1)).unwrap();
        let query = Query::forecast("New York/East", "2").unwrap();
        let url = transport.url_for(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9091/api/v1/weather/forecast/New%20York%2FEast/2"
        );
    }
}
