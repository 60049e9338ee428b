use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::ApiError;

/// Simple in-memory rate limiter keyed by session token with a fixed window.
#[derive(Clone)]
pub struct RateLimiter {
    // Map of session_token -> (request_count, window_start)
    state: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    /// Check if a request should be allowed
    pub fn check_rate_limit(&self, token: &str) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();

        // Bounded memory: shed stale windows once the map grows large
        if state.len() > 10000 {
            state.retain(|_, (_, start)| now.duration_since(*start) < self.window_duration * 2);
        }

        match state.get_mut(token) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) < self.window_duration {
                    if *count >= self.max_requests {
                        let remaining = self.window_duration - now.duration_since(*window_start);
                        return Err(format!(
                            "Rate limit exceeded. Try again in {} seconds.",
                            remaining.as_secs()
                        ));
                    }
                    *count += 1;
                } else {
                    *window_start = now;
                    *count = 1;
                }
            }
            None => {
                state.insert(token.to_string(), (1, now));
            }
        }

        Ok(())
    }
}

/// Middleware applying the limiter to authenticated requests.
/// Anonymous traffic (no session header) passes through unmetered.
pub async fn rate_limit_middleware(
    axum::Extension(limiter): axum::Extension<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok());

    if let Some(token) = token {
        if let Err(msg) = limiter.check_rate_limit(token) {
            return Ok(ApiError::TooManyRequests(msg).into_response());
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_within_limit_pass() {
        let limiter = RateLimiter::new(3, 60);
        for _ in 0..3 {
            assert!(limiter.check_rate_limit("token-a").is_ok());
        }
        assert!(limiter.check_rate_limit("token-a").is_err());
    }

    #[test]
    fn test_tokens_are_metered_independently() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check_rate_limit("token-a").is_ok());
        assert!(limiter.check_rate_limit("token-b").is_ok());
        assert!(limiter.check_rate_limit("token-a").is_err());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.check_rate_limit("token-a").is_ok());
        // Zero-length window means every request starts a fresh one
        assert!(limiter.check_rate_limit("token-a").is_ok());
    }
}
