//! Per-IP rate limiting with a fixed window per tier.
//!
//! Registration and login carry their own tight budgets; every other
//! endpoint shares a general hourly budget backed by a coarser daily cap.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

use super::{ApiError, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    Register,
    Login,
    General,
    /// Slow-moving cap layered under `General`; never used on its own.
    Daily,
}

#[derive(Debug, Clone)]
struct WindowEntry {
    tokens: u32,
    window_start: Instant,
}

/// Remaining budget reported back to the client on allowed requests.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<(IpAddr, RateLimitTier), WindowEntry>,
    config: RateLimitConfig,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    const fn tier_params(&self, tier: RateLimitTier) -> (u32, Duration) {
        match tier {
            RateLimitTier::Register => (
                self.config.register_limit,
                Duration::from_secs(self.config.register_window_seconds),
            ),
            RateLimitTier::Login => (
                self.config.login_limit,
                Duration::from_secs(self.config.login_window_seconds),
            ),
            RateLimitTier::General => (
                self.config.general_limit,
                Duration::from_secs(self.config.general_window_seconds),
            ),
            RateLimitTier::Daily => (self.config.daily_limit, Duration::from_secs(86_400)),
        }
    }

    /// Consume one token from the tier's fixed window for this IP.
    /// Returns the remaining budget, or the seconds to wait when the
    /// window is spent.
    pub fn check(&self, ip: IpAddr, tier: RateLimitTier) -> Result<RateLimitInfo, u64> {
        if !self.config.enabled {
            return Ok(RateLimitInfo {
                limit: u32::MAX,
                remaining: u32::MAX,
                reset_after: 0,
            });
        }

        let (limit, window) = self.tier_params(tier);
        let now = Instant::now();

        let mut entry = self
            .entries
            .entry((ip, tier))
            .or_insert_with(|| WindowEntry {
                tokens: limit,
                window_start: now,
            });

        let elapsed = now.duration_since(entry.window_start);
        if elapsed >= window {
            entry.tokens = limit;
            entry.window_start = now;
        }

        if entry.tokens > 0 {
            entry.tokens -= 1;
            Ok(RateLimitInfo {
                limit,
                remaining: entry.tokens,
                reset_after: window.saturating_sub(elapsed).as_secs(),
            })
        } else {
            Err(window.saturating_sub(elapsed).as_secs().max(1))
        }
    }

    /// Drop windows that ended long enough ago that they would reset on
    /// the next request anyway.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|(_, tier), entry| {
            let (_, window) = self.tier_params(*tier);
            now.duration_since(entry.window_start) < window * 2
        });
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

fn extract_client_ip(request: &Request<Body>) -> IpAddr {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip_str) = value.split(',').next()
        && let Ok(ip) = ip_str.trim().parse::<IpAddr>()
    {
        return ip;
    }

    if let Some(real_ip) = request.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && let Ok(ip) = value.trim().parse::<IpAddr>()
    {
        return ip;
    }

    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn insert_numeric_header(headers: &mut HeaderMap, name: &'static str, value: u64) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

fn apply_budget_headers(response: &mut Response, info: &RateLimitInfo) {
    let headers = response.headers_mut();
    insert_numeric_header(headers, "x-ratelimit-limit", u64::from(info.limit));
    insert_numeric_header(headers, "x-ratelimit-remaining", u64::from(info.remaining));
    insert_numeric_header(headers, "x-ratelimit-reset", info.reset_after);
}

fn too_many_requests(info_limit: u32, retry_after: u64) -> Response {
    let mut response = ApiError::RateLimited {
        retry_after_secs: retry_after,
    }
    .into_response();

    let headers = response.headers_mut();
    insert_numeric_header(headers, "x-ratelimit-limit", u64::from(info_limit));
    insert_numeric_header(headers, "x-ratelimit-remaining", 0);
    insert_numeric_header(headers, "x-ratelimit-reset", retry_after);

    response
}

pub async fn rate_limit_register(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    limit_with_tier(&state, request, next, RateLimitTier::Register).await
}

pub async fn rate_limit_login(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    limit_with_tier(&state, request, next, RateLimitTier::Login).await
}

/// General traffic burns the hourly window and the daily cap together;
/// running out of either one blocks the request.
pub async fn rate_limit_general(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limiter = state.rate_limiter();
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let ip = extract_client_ip(&request);

    let hourly = match limiter.check(ip, RateLimitTier::General) {
        Ok(info) => info,
        Err(retry_after) => {
            let (limit, _) = limiter.tier_params(RateLimitTier::General);
            return too_many_requests(limit, retry_after);
        }
    };

    if let Err(retry_after) = limiter.check(ip, RateLimitTier::Daily) {
        let (limit, _) = limiter.tier_params(RateLimitTier::Daily);
        return too_many_requests(limit, retry_after);
    }

    let mut response = next.run(request).await;
    apply_budget_headers(&mut response, &hourly);
    response
}

async fn limit_with_tier(
    state: &AppState,
    request: Request<Body>,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let limiter = state.rate_limiter();
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let ip = extract_client_ip(&request);

    match limiter.check(ip, tier) {
        Ok(info) => {
            let mut response = next.run(request).await;
            apply_budget_headers(&mut response, &info);
            response
        }
        Err(retry_after) => {
            let (limit, _) = limiter.tier_params(tier);
            too_many_requests(limit, retry_after)
        }
    }
}

/// Periodically evict spent windows so the per-IP map cannot grow without
/// bound.
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                "Rate limiter cleanup complete, {} entries remaining",
                rate_limiter.entry_count()
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            register_limit: 3,
            register_window_seconds: 3600,
            login_limit: 5,
            login_window_seconds: 900,
            general_limit: 50,
            general_window_seconds: 3600,
            daily_limit: 200,
        }
    }

    #[test]
    fn test_allows_requests_under_limit() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for i in 0..3 {
            let result = limiter.check(ip, RateLimitTier::Register);
            assert!(result.is_ok(), "Request {} should be allowed", i);
        }
    }

    #[test]
    fn test_blocks_after_limit() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..3 {
            let _ = limiter.check(ip, RateLimitTier::Register);
        }

        let result = limiter.check(ip, RateLimitTier::Register);
        assert!(result.is_err(), "Request over the limit should be blocked");
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        let first = limiter.check(ip, RateLimitTier::Login).unwrap();
        let second = limiter.check(ip, RateLimitTier::Login).unwrap();

        assert_eq!(first.limit, 5);
        assert_eq!(first.remaining, 4);
        assert_eq!(second.remaining, 3);
    }

    #[test]
    fn test_different_ips_have_separate_limits() {
        let limiter = RateLimiter::new(test_config());
        let ip1: IpAddr = "192.168.1.1".parse().unwrap();
        let ip2: IpAddr = "192.168.1.2".parse().unwrap();

        for _ in 0..3 {
            let _ = limiter.check(ip1, RateLimitTier::Register);
        }

        assert!(limiter.check(ip1, RateLimitTier::Register).is_err());
        assert!(limiter.check(ip2, RateLimitTier::Register).is_ok());
    }

    #[test]
    fn test_different_tiers_have_separate_budgets() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..3 {
            let _ = limiter.check(ip, RateLimitTier::Register);
        }

        assert!(limiter.check(ip, RateLimitTier::Register).is_err());
        assert!(limiter.check(ip, RateLimitTier::Login).is_ok());
        assert!(limiter.check(ip, RateLimitTier::General).is_ok());
    }

    #[test]
    fn test_disabled_limiter_allows_everything() {
        let mut config = test_config();
        config.enabled = false;
        let limiter = RateLimiter::new(config);
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..100 {
            assert!(limiter.check(ip, RateLimitTier::Register).is_ok());
        }
    }

    #[test]
    fn test_retry_after_is_bounded_by_window() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..5 {
            let _ = limiter.check(ip, RateLimitTier::Login);
        }

        let retry_after = limiter.check(ip, RateLimitTier::Login).unwrap_err();
        assert!(retry_after >= 1);
        assert!(retry_after <= 900);
    }

    #[test]
    fn test_cleanup_keeps_recent_entries() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        let _ = limiter.check(ip, RateLimitTier::General);
        assert_eq!(limiter.entry_count(), 1);

        limiter.cleanup_expired();
        assert_eq!(limiter.entry_count(), 1);
    }
}
