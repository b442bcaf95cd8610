//! HTTP client for the events server.
//!
//! Covers the endpoints the registration and race-timing tools need:
//! - Event listing and lookup
//! - Participant registration and management
//! - Race result persistence, via [`ResultsRepository`]

use std::fmt;
use std::time::Duration;

use evt_core::{
    Event, EventId, Gender, NormalizedParticipant, ParticipantForm, ParticipantId, RaceEntry,
    RaceRole, ResultsRepository,
};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Production events server.
pub const DEFAULT_BASE_URL: &str = "https://events-server-eu5z.onrender.com/api";

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Events API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot address the API.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Server rejected the request.
    #[error("{message}")]
    Api { message: String },
    /// Server has no such resource.
    #[error("not found: {path}")]
    NotFound { path: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Events server client.
///
/// Cloning is cheap; clones share the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("base URL cannot be empty"));
    }
    let url = Url::parse(trimmed).map_err(|_| invalid("not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path"));
    }
    Ok(url)
}

impl Client {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty, not http(s), or if the
    /// HTTP client fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `parse_base_url` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await?;
        tracing::debug!(%status, %path, bytes = body.len(), "events API response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { path });
        }
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| ApiError::Api {
                message: if body.trim().is_empty() {
                    format!("status {status}")
                } else {
                    format!("status {status}: {body}")
                },
            }));
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let body = self.execute(self.http.get(self.url(segments))).await?;
        decode(&body)
    }

    /// All events known to the server.
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get_json(&["events"]).await
    }

    /// One event by id or storage folder.
    pub async fn get_event(&self, id: &str) -> Result<Event, ApiError> {
        self.get_json(&["events", id]).await
    }

    /// Submits a validated registration to the event's folder.
    pub async fn register(
        &self,
        folder: &str,
        participant: &NormalizedParticipant,
    ) -> Result<RegistrationReceipt, ApiError> {
        let request = self
            .http
            .post(self.url(&["events", folder, "register"]))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(participant);
        let body = self.execute(request).await?;
        if body.trim().is_empty() {
            return Ok(RegistrationReceipt::default());
        }
        decode(&body)
    }

    /// Registrations stored for an event folder.
    pub async fn list_participants(&self, folder: &str) -> Result<Vec<Participant>, ApiError> {
        self.get_json(&["events", folder, "participants"]).await
    }

    /// Replaces a stored registration with a re-validated one.
    pub async fn update_participant(
        &self,
        folder: &str,
        id: &ParticipantId,
        participant: &NormalizedParticipant,
    ) -> Result<(), ApiError> {
        let payload = ParticipantUpdate {
            id,
            details: participant,
        };
        let request = self
            .http
            .put(self.url(&["events", folder, "participants", id.as_str()]))
            .json(&payload);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn delete_participant(
        &self,
        folder: &str,
        id: &ParticipantId,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url(&["events", folder, "participants", id.as_str()]));
        self.execute(request).await?;
        Ok(())
    }
}

impl ResultsRepository for Client {
    type Error = ApiError;

    async fn fetch_results(&self, event: &EventId) -> Result<Vec<RaceEntry>, ApiError> {
        self.get_json(&["events", event.as_str(), "results"]).await
    }

    async fn save_results(&self, event: &EventId, entries: &[RaceEntry]) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct SaveRequest<'a> {
            results: &'a [RaceEntry],
        }

        let request = self
            .http
            .post(self.url(&["events", event.as_str(), "results"]))
            .json(&SaveRequest { results: entries });
        self.execute(request).await?;
        tracing::debug!(event = %event, count = entries.len(), "saved results");
        Ok(())
    }

    async fn delete_result(&self, event: &EventId, entry: &RaceEntry) -> Result<(), ApiError> {
        let start = entry.start_time.to_string();
        let request = self.http.delete(self.url(&[
            "events",
            event.as_str(),
            "results",
            entry.id.as_str(),
            start.as_str(),
        ]));
        self.execute(request).await?;
        Ok(())
    }
}

/// Server acknowledgement of a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistrationReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

/// A stored registration.
///
/// Decoding is forgiving: the server keeps whatever was submitted, so ages
/// may be numbers or text and choice fields may be blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age: String,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(
        default,
        deserialize_with = "lenient_choice",
        skip_serializing_if = "Option::is_none"
    )]
    pub race_role: Option<RaceRole>,
}

impl Participant {
    /// The registration as an editable form, ready for re-validation.
    pub fn to_form(&self) -> ParticipantForm {
        ParticipantForm {
            name: self.name.clone(),
            surname: self.surname.clone(),
            age: self.age.clone(),
            gender: self.gender,
            email: self.email.clone(),
            phone: self.phone.clone(),
            race_role: self.race_role,
        }
    }
}

#[derive(Serialize)]
struct ParticipantUpdate<'a> {
    id: &'a ParticipantId,
    #[serde(flatten)]
    details: &'a NormalizedParticipant,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

/// Blank or unrecognized values decode as `None`.
fn lenient_choice<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text.and_then(|t| t.parse().ok()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn parse_api_error(body: &str) -> Option<ApiError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorPayload {
        Text { error: String },
        Nested { error: ErrorDetails },
        Message { message: String },
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    let message = match serde_json::from_str::<ErrorPayload>(body).ok()? {
        ErrorPayload::Text { error } => error,
        ErrorPayload::Nested { error } => error.message,
        ErrorPayload::Message { message } => message,
    };
    Some(ApiError::Api { message })
}
