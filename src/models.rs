use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One recorded redirect traversal with contextual metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    /// Referrer header value, or "Direct" when none was sent.
    pub referrer: String,
    /// Best-effort geographic string, or "Unknown".
    pub location: String,
    /// Raw client user-agent string, or "Unknown".
    pub user_agent: String,
}

/// URL mapping held by the registry.
///
/// Immutable after creation except for the append-only `clicks` sequence;
/// the entry is only ever removed by the expiry sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntry {
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub clicks: Vec<ClickEvent>,
}

impl UrlEntry {
    pub fn new(
        short_code: String,
        original_url: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            short_code,
            original_url,
            created_at,
            expires_at,
            clicks: Vec::new(),
        }
    }

    /// Whether the validity window has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Request to create a short URL
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlRequest {
    pub url: String,

    /// Validity window in minutes; defaults to 30 when absent.
    #[validate(range(
        min = 1,
        max = 43200,
        message = "Validity must be between 1 and 43200 minutes"
    ))]
    pub validity: Option<i64>,

    #[validate(length(min = 4, max = 10, message = "Shortcode must be 4-10 characters"))]
    pub shortcode: Option<String>,
}

/// Payload for the creation endpoint: a single request or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateUrlPayload {
    Single(CreateUrlRequest),
    Batch(Vec<CreateUrlRequest>),
}

/// Response after creating a short URL
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlResponse {
    pub short_link: String,
    pub expiry: DateTime<Utc>,
}

/// Per-index outcome of a batch creation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchCreateOutcome {
    Created(CreateUrlResponse),
    Failed { error: String, message: String },
}

/// Full statistics snapshot for one shortcode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlStatsResponse {
    pub shortcode: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub total_clicks: usize,
    pub clicks: Vec<ClickEvent>,
}

impl From<UrlEntry> for UrlStatsResponse {
    fn from(entry: UrlEntry) -> Self {
        UrlStatsResponse {
            shortcode: entry.short_code,
            original_url: entry.original_url,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            total_clicks: entry.clicks.len(),
            clicks: entry.clicks,
        }
    }
}

/// Request-scoped metadata a click event is built from.
///
/// Captured by the HTTP layer at redirect time; location resolution happens
/// later, off the hot path.
#[derive(Debug, Clone)]
pub struct ClickContext {
    pub requested_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}

impl ClickContext {
    /// Fold the context and a resolved location into the stored event,
    /// applying the "Direct"/"Unknown" sentinels.
    pub fn into_event(self, location: String) -> ClickEvent {
        ClickEvent {
            timestamp: self.requested_at,
            referrer: self.referrer.unwrap_or_else(|| "Direct".to_string()),
            location,
            user_agent: self.user_agent.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}
