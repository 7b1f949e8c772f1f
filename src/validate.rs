//! Pure validation rules for creation requests.
//!
//! Each check is side-effect free and reports a specific failure reason;
//! uniqueness is deliberately not checked here, the registry enforces it
//! atomically at insertion time.

use crate::error::AppError;
use crate::models::CreateUrlRequest;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Default validity window in minutes when the request omits it.
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// Upper bound on the validity window (30 days).
pub const MAX_VALIDITY_MINUTES: i64 = 43200;

/// Shortcodes that collide with route namespaces and may never be claimed.
const RESERVED_SHORTCODES: &[&str] = &["api", "admin", "www", "shorturls", "health", "stats"];

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{4,10}$").expect("shortcode regex is valid"));

static HOSTNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").expect("hostname regex is valid"));

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

/// A creation request with defaults resolved and the URL trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub url: String,
    pub shortcode: Option<String>,
    pub validity_minutes: i64,
}

/// Validate a candidate URL; returns the trimmed URL on success.
pub fn validate_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err("URL must not be empty".to_string());
    }

    if trimmed.contains(char::is_whitespace) {
        return Err("URL must not contain whitespace".to_string());
    }

    let parsed =
        Url::parse(trimmed).map_err(|_| "URL must be a valid absolute URL".to_string())?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!("URL scheme must be http or https, got '{}'", scheme));
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| "URL must have a hostname".to_string())?;

    if !HOSTNAME_RE.is_match(host) {
        return Err("URL hostname contains invalid characters".to_string());
    }

    if !host.contains('.') {
        return Err("URL hostname must contain a dot".to_string());
    }

    if host.starts_with('-') || host.ends_with('-') || host.starts_with('.') || host.ends_with('.')
    {
        return Err("URL hostname must not start or end with '-' or '.'".to_string());
    }

    Ok(trimmed.to_string())
}

/// Validate an optional custom shortcode. `None` means auto-generate.
pub fn validate_shortcode(code: Option<&str>) -> Result<Option<String>, String> {
    let Some(code) = code else {
        return Ok(None);
    };

    if !SHORTCODE_RE.is_match(code) {
        return Err("Shortcode must be 4-10 alphanumeric characters".to_string());
    }

    if RESERVED_SHORTCODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
    {
        return Err(format!("Shortcode '{}' is reserved", code));
    }

    Ok(Some(code.to_string()))
}

/// Validate an optional validity window, resolving against the given
/// default (configurable, [`DEFAULT_VALIDITY_MINUTES`] unless overridden).
pub fn validate_validity(minutes: Option<i64>, default_minutes: i64) -> Result<i64, String> {
    let minutes = minutes.unwrap_or(default_minutes);

    if !(1..=MAX_VALIDITY_MINUTES).contains(&minutes) {
        return Err(format!(
            "Validity must be between 1 and {} minutes",
            MAX_VALIDITY_MINUTES
        ));
    }

    Ok(minutes)
}

/// Validate one creation request, collecting every failing field.
///
/// Checks are independent so a batch caller can report all problems of an
/// entry at once instead of stopping at the first.
pub fn validate_request(
    req: &CreateUrlRequest,
    default_validity_minutes: i64,
) -> Result<NormalizedRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let url = match validate_url(&req.url) {
        Ok(url) => Some(url),
        Err(reason) => {
            errors.push(FieldError {
                field: "url",
                reason,
            });
            None
        }
    };

    let shortcode = match validate_shortcode(req.shortcode.as_deref()) {
        Ok(code) => code,
        Err(reason) => {
            errors.push(FieldError {
                field: "shortcode",
                reason,
            });
            None
        }
    };

    let validity_minutes = match validate_validity(req.validity, default_validity_minutes) {
        Ok(minutes) => minutes,
        Err(reason) => {
            errors.push(FieldError {
                field: "validity",
                reason,
            });
            0
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NormalizedRequest {
        url: url.expect("url validated"),
        shortcode,
        validity_minutes,
    })
}

/// Collapse field errors into the application error surfaced to callers.
pub fn into_app_error(errors: Vec<FieldError>) -> AppError {
    match errors.as_slice() {
        [single] => AppError::validation(single.field, single.reason.clone()),
        many => {
            let reason = many
                .iter()
                .map(|e| format!("{}: {}", e.field, e.reason))
                .collect::<Vec<_>>()
                .join("; ");
            AppError::validation("request", reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert_eq!(
            validate_url("https://example.com/a?b=c").unwrap(),
            "https://example.com/a?b=c"
        );
        assert_eq!(
            validate_url("  http://sub.domain.co/path  ").unwrap(),
            "http://sub.domain.co/path"
        );
    }

    #[test]
    fn test_invalid_urls() {
        assert!(validate_url("").is_err());
        assert!(validate_url("   ").is_err());
        assert!(validate_url("https://exa mple.com").is_err());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
        assert!(validate_url("https://exa_mple.com").is_err());
        assert!(validate_url("https://localhost").is_err());
        assert!(validate_url("https://-example.com").is_err());
        assert!(validate_url("https://example.com-").is_err());
        assert!(validate_url("https://.example.com").is_err());
        assert!(validate_url("https://example.com.").is_err());
    }

    #[test]
    fn test_shortcode_length_bounds() {
        assert!(validate_shortcode(Some("abc")).is_err());
        assert!(validate_shortcode(Some("abcd")).is_ok());
        assert!(validate_shortcode(Some("a1b2c3d4e5")).is_ok());
        assert!(validate_shortcode(Some("a1b2c3d4e5f")).is_err());
    }

    #[test]
    fn test_shortcode_charset() {
        assert!(validate_shortcode(Some("abc-123")).is_err());
        assert!(validate_shortcode(Some("abc_123")).is_err());
        assert!(validate_shortcode(Some("abc.123")).is_err());
        assert!(validate_shortcode(Some("Test1234")).is_ok());
    }

    #[test]
    fn test_shortcode_reserved_words() {
        assert!(validate_shortcode(Some("admin")).is_err());
        assert!(validate_shortcode(Some("ADMIN")).is_err());
        assert!(validate_shortcode(Some("shorturls")).is_err());
        assert!(validate_shortcode(Some("health")).is_err());
        assert!(validate_shortcode(Some("stats")).is_err());
        // "api" and "www" fail the length rule before the reserved check,
        // but must stay rejected either way
        assert!(validate_shortcode(Some("api")).is_err());
        assert!(validate_shortcode(Some("www")).is_err());
    }

    #[test]
    fn test_shortcode_none_is_valid() {
        assert_eq!(validate_shortcode(None).unwrap(), None);
    }

    #[test]
    fn test_validity_bounds() {
        assert!(validate_validity(Some(0), DEFAULT_VALIDITY_MINUTES).is_err());
        assert_eq!(validate_validity(Some(1), DEFAULT_VALIDITY_MINUTES).unwrap(), 1);
        assert_eq!(
            validate_validity(Some(43200), DEFAULT_VALIDITY_MINUTES).unwrap(),
            43200
        );
        assert!(validate_validity(Some(43201), DEFAULT_VALIDITY_MINUTES).is_err());
        assert!(validate_validity(Some(-5), DEFAULT_VALIDITY_MINUTES).is_err());
    }

    #[test]
    fn test_validity_default_is_configurable() {
        assert_eq!(
            validate_validity(None, DEFAULT_VALIDITY_MINUTES).unwrap(),
            DEFAULT_VALIDITY_MINUTES
        );
        assert_eq!(validate_validity(None, 60).unwrap(), 60);
        // A request-supplied value always wins over the default
        assert_eq!(validate_validity(Some(5), 60).unwrap(), 5);
    }

    #[test]
    fn test_validate_request_collects_all_fields() {
        let req = CreateUrlRequest {
            url: "not-a-url".to_string(),
            validity: Some(0),
            shortcode: Some("ab".to_string()),
        };

        let errors = validate_request(&req, DEFAULT_VALIDITY_MINUTES).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["url", "shortcode", "validity"]);
    }

    #[test]
    fn test_validate_request_normalizes() {
        let req = CreateUrlRequest {
            url: " https://example.com ".to_string(),
            validity: None,
            shortcode: None,
        };

        let normalized = validate_request(&req, DEFAULT_VALIDITY_MINUTES).unwrap();
        assert_eq!(normalized.url, "https://example.com");
        assert_eq!(normalized.shortcode, None);
        assert_eq!(normalized.validity_minutes, DEFAULT_VALIDITY_MINUTES);
    }
}
