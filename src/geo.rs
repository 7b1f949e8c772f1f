//! Best-effort IP geolocation for click analytics.
//!
//! Lookups only ever run inside the background click worker, never on the
//! redirect hot path, and every failure collapses to "Unknown".

use dashmap::DashMap;
use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Location sentinel used whenever resolution is disabled or fails.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Geolocation data for a single IP address.
#[derive(Debug, Clone)]
pub struct GeoInfo {
    pub country: String,
    pub city: String,
}

impl GeoInfo {
    /// Collapse into the single location string a click event stores.
    pub fn display(&self) -> String {
        match (self.city.is_empty(), self.country.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.country),
            (true, false) => self.country.clone(),
            (false, true) => self.city.clone(),
            (true, true) => UNKNOWN_LOCATION.to_string(),
        }
    }
}

/// Thread-safe in-memory cache: IP string → Option<GeoInfo>.
/// `None` means we already tried and the lookup failed/returned no data.
#[derive(Clone, Debug, Default)]
pub struct GeoCache {
    inner: Arc<DashMap<String, Option<GeoInfo>>>,
}

impl GeoCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    city: Option<String>,
}

/// Resolve the location string for an optional client IP.
///
/// Returns "Unknown" when lookups are disabled, the IP is absent or
/// private, or the upstream API fails.
pub async fn resolve_location(ip: Option<&str>, cache: &GeoCache, enabled: bool) -> String {
    if !enabled {
        return UNKNOWN_LOCATION.to_string();
    }

    match ip {
        Some(ip) => lookup(ip, cache)
            .await
            .map(|info| info.display())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        None => UNKNOWN_LOCATION.to_string(),
    }
}

/// Look up geolocation for `ip`, using `cache` to avoid repeated network
/// requests for the same address.
async fn lookup(ip: &str, cache: &GeoCache) -> Option<GeoInfo> {
    // Skip addresses that can never be geolocated
    if is_private(ip) {
        return None;
    }

    // Cache covers both successful hits and known misses
    if let Some(entry) = cache.inner.get(ip) {
        return entry.clone();
    }

    let result = fetch_geo(ip).await;

    // Store regardless of outcome so we don't retry endlessly
    cache.inner.insert(ip.to_owned(), result.clone());

    result
}

async fn fetch_geo(ip: &str) -> Option<GeoInfo> {
    // Strict timeout so a slow API can never back up the click worker
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .ok()?;

    let url = format!("http://ip-api.com/json/{}?fields=status,country,city", ip);

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| tracing::debug!("geo lookup network error for {}: {}", ip, e))
        .ok()?;

    let body: IpApiResponse = resp
        .json()
        .await
        .map_err(|e| tracing::debug!("geo lookup parse error for {}: {}", ip, e))
        .ok()?;

    if body.status != "success" {
        tracing::debug!("geo lookup returned non-success status for {}", ip);
        return None;
    }

    let country = body.country.filter(|s| !s.is_empty()).unwrap_or_default();
    let city = body.city.filter(|s| !s.is_empty()).unwrap_or_default();

    if country.is_empty() && city.is_empty() {
        return None;
    }

    Some(GeoInfo { country, city })
}

/// Return `true` for addresses that should never be sent to a public
/// geolocation API: loopback, link-local, private ranges, and IPv6 special
/// addresses.
fn is_private(ip_str: &str) -> bool {
    // Strip IPv6-mapped IPv4 prefix: "::ffff:1.2.3.4" → "1.2.3.4"
    let ip_str = ip_str.strip_prefix("::ffff:").unwrap_or(ip_str);

    match IpAddr::from_str(ip_str) {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_broadcast()
                || octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        Ok(IpAddr::V6(addr)) => {
            addr.is_loopback()
                || addr.is_unspecified()
                // fe80::/10 link-local
                || (addr.segments()[0] & 0xffc0) == 0xfe80
                // fc00::/7 unique-local
                || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
        // Not an IP at all: "unknown" placeholders, hostnames, garbage
        Err(_) => true,
    }
}
