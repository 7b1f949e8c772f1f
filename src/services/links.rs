//! Orchestration of the three use cases: create, redirect, statistics.
//!
//! `LinkService` is transport-agnostic: it consumes validated creation
//! requests and redirect/stat lookups as plain method calls and returns
//! result values; HTTP status mapping lives with the caller.

use crate::error::{AppError, AppResult};
use crate::jobs::JobSender;
use crate::models::{
    ClickContext, CreateUrlRequest, CreateUrlResponse, UrlEntry, UrlStatsResponse,
};
use crate::registry::Registry;
use crate::services::short_code::ShortCodeService;
use crate::validate;
use chrono::{Duration, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct LinkService {
    registry: Arc<dyn Registry>,
    job_sender: JobSender,
    base_url: String,
    short_code_length: usize,
    short_code_max_attempts: u32,
    default_validity_minutes: i64,
}

impl LinkService {
    pub fn new(
        registry: Arc<dyn Registry>,
        job_sender: JobSender,
        base_url: String,
        short_code_length: usize,
        short_code_max_attempts: u32,
        default_validity_minutes: i64,
    ) -> Self {
        Self {
            registry,
            job_sender,
            base_url: base_url.trim_end_matches('/').to_string(),
            short_code_length,
            short_code_max_attempts,
            default_validity_minutes,
        }
    }

    fn short_link(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Create one short URL mapping.
    ///
    /// A custom shortcode gets a single atomic insert attempt and surfaces
    /// the conflict; an auto-generated one retries generation across insert
    /// races up to the configured budget.
    pub async fn create(&self, request: &CreateUrlRequest) -> AppResult<CreateUrlResponse> {
        let normalized = validate::validate_request(request, self.default_validity_minutes)
            .map_err(validate::into_app_error)?;

        let created_at = Utc::now();
        let expires_at = created_at + Duration::minutes(normalized.validity_minutes);

        let entry = match normalized.shortcode {
            Some(code) => {
                self.registry
                    .insert(UrlEntry::new(
                        code,
                        normalized.url,
                        created_at,
                        expires_at,
                    ))
                    .await?
            }
            None => {
                self.insert_generated(normalized.url, created_at, expires_at)
                    .await?
            }
        };

        tracing::info!(
            short_code = %entry.short_code,
            expires_at = %entry.expires_at,
            "Created short URL"
        );

        Ok(CreateUrlResponse {
            short_link: self.short_link(&entry.short_code),
            expiry: entry.expires_at,
        })
    }

    /// Generate-and-insert loop for auto-assigned codes.
    ///
    /// The generator probes `exists` before handing out a candidate, but the
    /// atomic insert is the arbiter: a probe-to-insert race just costs one
    /// more attempt.
    async fn insert_generated(
        &self,
        url: String,
        created_at: chrono::DateTime<Utc>,
        expires_at: chrono::DateTime<Utc>,
    ) -> AppResult<UrlEntry> {
        for _ in 0..self.short_code_max_attempts {
            let code = ShortCodeService::generate_short_code(
                self.short_code_length,
                self.short_code_max_attempts,
                self.registry.as_ref(),
            )
            .await?;

            match self
                .registry
                .insert(UrlEntry::new(
                    code,
                    url.clone(),
                    created_at,
                    expires_at,
                ))
                .await
            {
                Ok(entry) => return Ok(entry),
                Err(AppError::ShortcodeTaken(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::CapacityExhausted)
    }

    /// Create several mappings independently; one entry's failure never
    /// affects another's success and nothing is rolled back.
    pub async fn create_batch(
        &self,
        requests: &[CreateUrlRequest],
    ) -> Vec<AppResult<CreateUrlResponse>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.create(request).await);
        }
        results
    }

    /// Resolve a shortcode for redirection, recording the click.
    ///
    /// Expiry is checked eagerly at read time, so a logically-expired entry
    /// is never served even before the sweeper removes it. Click recording
    /// is handed to the background worker and can neither block nor fail
    /// the redirect.
    pub async fn resolve(&self, code: &str, context: ClickContext) -> AppResult<String> {
        let entry = self
            .registry
            .lookup(code)
            .await?
            .ok_or_else(|| AppError::NotFound(code.to_string()))?;

        if entry.is_expired(Utc::now()) {
            return Err(AppError::Expired(code.to_string()));
        }

        self.job_sender.record_click(entry.short_code.clone(), context);

        Ok(entry.original_url)
    }

    /// Full statistics snapshot for a shortcode.
    ///
    /// Expired-but-unswept entries answer `Expired` rather than serving
    /// stale data.
    pub async fn stats(&self, code: &str) -> AppResult<UrlStatsResponse> {
        let entry = self
            .registry
            .lookup(code)
            .await?
            .ok_or_else(|| AppError::NotFound(code.to_string()))?;

        if entry.is_expired(Utc::now()) {
            return Err(AppError::Expired(code.to_string()));
        }

        Ok(UrlStatsResponse::from(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{create_job_channel, Job};
    use crate::registry::{InMemoryRegistry, MockRegistry};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn service_with(
        registry: Arc<dyn Registry>,
    ) -> (LinkService, UnboundedReceiver<Job>) {
        let (job_sender, receiver) = create_job_channel();
        let service = LinkService::new(
            registry,
            job_sender,
            "http://localhost:3000".to_string(),
            6,
            10,
            crate::validate::DEFAULT_VALIDITY_MINUTES,
        );
        (service, receiver)
    }

    fn request(url: &str, validity: Option<i64>, shortcode: Option<&str>) -> CreateUrlRequest {
        CreateUrlRequest {
            url: url.to_string(),
            validity,
            shortcode: shortcode.map(|s| s.to_string()),
        }
    }

    fn context() -> ClickContext {
        ClickContext {
            requested_at: Utc::now(),
            referrer: None,
            user_agent: Some("test-agent".to_string()),
            client_ip: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_custom_code() {
        let (service, _rx) = service_with(Arc::new(InMemoryRegistry::new()));

        let response = service
            .create(&request("https://example.com/a", Some(1), Some("abcd")))
            .await
            .unwrap();

        assert_eq!(response.short_link, "http://localhost:3000/abcd");
        let remaining = response.expiry - Utc::now();
        assert!(remaining <= Duration::minutes(1));
        assert!(remaining > Duration::seconds(55));
    }

    #[tokio::test]
    async fn test_create_duplicate_custom_code_conflicts() {
        let (service, _rx) = service_with(Arc::new(InMemoryRegistry::new()));

        service
            .create(&request("https://example.com/a", None, Some("abcd")))
            .await
            .unwrap();

        let err = service
            .create(&request("https://example.com/b", None, Some("abcd")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ShortcodeTaken(_)));
    }

    #[tokio::test]
    async fn test_create_generates_code_when_absent() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (service, _rx) = service_with(Arc::clone(&registry) as Arc<dyn Registry>);

        let response = service
            .create(&request("https://example.com", None, None))
            .await
            .unwrap();

        let code = response.short_link.rsplit('/').next().unwrap();
        assert_eq!(code.len(), 6);
        assert!(registry.exists(code).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_applies_configured_default_validity() {
        let (job_sender, _rx) = create_job_channel();
        let service = LinkService::new(
            Arc::new(InMemoryRegistry::new()),
            job_sender,
            "http://localhost:3000".to_string(),
            6,
            10,
            60,
        );

        let response = service
            .create(&request("https://example.com", None, None))
            .await
            .unwrap();

        let remaining = response.expiry - Utc::now();
        assert!(remaining <= Duration::minutes(60));
        assert!(remaining > Duration::minutes(59));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let (service, _rx) = service_with(Arc::new(InMemoryRegistry::new()));

        let err = service
            .create(&request("not a url", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field.as_str() == "url"));
    }

    #[tokio::test]
    async fn test_create_exhausts_capacity_on_saturated_registry() {
        let mut mock = MockRegistry::new();
        mock.expect_exists().returning(|_| Ok(false));
        mock.expect_insert()
            .returning(|entry| Err(AppError::ShortcodeTaken(entry.short_code)));

        let (service, _rx) = service_with(Arc::new(mock));

        let err = service
            .create(&request("https://example.com", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityExhausted));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (service, mut rx) = service_with(Arc::new(InMemoryRegistry::new()));

        service
            .create(&request("https://example.com/a", None, Some("abcd")))
            .await
            .unwrap();

        let url = service.resolve("abcd", context()).await.unwrap();
        assert_eq!(url, "https://example.com/a");

        // The click was handed off to the worker queue
        match rx.try_recv().unwrap() {
            Job::RecordClick { short_code, .. } => assert_eq!(short_code, "abcd"),
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let (service, _rx) = service_with(Arc::new(InMemoryRegistry::new()));

        let err = service.resolve("nope", context()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_expired_code() {
        let registry = Arc::new(InMemoryRegistry::new());
        let now = Utc::now();
        registry
            .insert(UrlEntry::new(
                "abcd".to_string(),
                "https://example.com".to_string(),
                now - Duration::minutes(2),
                now - Duration::minutes(1),
            ))
            .await
            .unwrap();

        let (service, mut rx) = service_with(Arc::clone(&registry) as Arc<dyn Registry>);

        let err = service.resolve("abcd", context()).await.unwrap_err();
        assert!(matches!(err, AppError::Expired(_)));

        // No click recorded for an expired code
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let registry = Arc::new(InMemoryRegistry::new());
        let (service, _rx) = service_with(Arc::clone(&registry) as Arc<dyn Registry>);

        service
            .create(&request("https://example.com/a", Some(10), Some("abcd")))
            .await
            .unwrap();
        registry
            .append_click("abcd", context().into_event("Unknown".to_string()))
            .await
            .unwrap();

        let stats = service.stats("abcd").await.unwrap();
        assert_eq!(stats.shortcode, "abcd");
        assert_eq!(stats.original_url, "https://example.com/a");
        assert_eq!(stats.total_clicks, 1);
        assert_eq!(stats.clicks[0].referrer, "Direct");
    }

    #[tokio::test]
    async fn test_stats_expired_code() {
        let registry = Arc::new(InMemoryRegistry::new());
        let now = Utc::now();
        registry
            .insert(UrlEntry::new(
                "abcd".to_string(),
                "https://example.com".to_string(),
                now - Duration::minutes(2),
                now - Duration::minutes(1),
            ))
            .await
            .unwrap();

        let (service, _rx) = service_with(Arc::clone(&registry) as Arc<dyn Registry>);

        let err = service.stats("abcd").await.unwrap_err();
        assert!(matches!(err, AppError::Expired(_)));
    }

    #[tokio::test]
    async fn test_batch_create_partial_failure() {
        let (service, _rx) = service_with(Arc::new(InMemoryRegistry::new()));

        let requests = vec![
            request("https://example.com/1", None, None),
            request("definitely not a url", None, None),
            request("https://example.com/3", None, None),
        ];

        let results = service.create_batch(&requests).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
