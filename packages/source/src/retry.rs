//! Bounded-retry HTTP layer for upstream GIS queries.
//!
//! Every upstream request goes through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so each logical fetch gets
//! automatic retry with exponential backoff for transient failures
//! (timeouts, connection resets, rate limiting, server errors, garbled
//! bodies). Permanent client errors are rejected immediately.

use std::future::Future;
use std::time::Duration;

use crate::SourceError;

/// Maximum number of retry attempts for transient failures.
///
/// With exponential backoff (2s, 4s, 8s, 16s, 32s) the total wait before
/// giving up is 62 seconds. Combined with the per-request timeout set by
/// the fetch layer this bounds the total duration of one logical fetch.
pub const MAX_RETRIES: u32 = 5;

/// Maximum length of the response body preview included in warning logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends an HTTP request and parses the response body as JSON, retrying
/// transient failures.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Retry behaviour
///
/// Retried, up to [`MAX_RETRIES`] times with exponential backoff, each
/// attempt logged: connection errors and timeouts, HTTP 429, HTTP 5xx,
/// and bodies that arrive but cannot be decoded as JSON. Exhausting the
/// budget fails with [`SourceError::Exhausted`] carrying the last cause.
///
/// Not retried: HTTP 4xx other than 429 fails immediately with
/// [`SourceError::Rejected`].
///
/// # Errors
///
/// Returns [`SourceError`] as described above.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    send_json_with(|| build_request().send(), MAX_RETRIES).await
}

/// Core retry loop behind [`send_json`], generic over the request
/// transport so the backoff policy can be exercised without a live
/// upstream.
#[allow(clippy::future_not_send, clippy::too_many_lines)]
pub(crate) async fn send_json_with<F, Fut>(
    attempt: F,
    max_retries: u32,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut last_cause = String::from("no attempt made");

    for attempt_no in 0..=max_retries {
        if attempt_no > 0 {
            let delay = Duration::from_secs(1u64 << attempt_no); // 2s, 4s, 8s
            log::warn!("  retry {attempt_no}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match attempt().await {
            Err(e) => {
                if !is_transient(&e) {
                    return Err(SourceError::Http(e));
                }
                log::warn!("  transient error: {e}");
                last_cause = e.to_string();
            }
            Ok(response) => {
                let status = response.status();

                // 429 and 5xx are the upstream telling us to come back
                // later; anything else in 4xx is permanent.
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
                {
                    log::warn!("  HTTP {status}");
                    last_cause = format!("HTTP {status}");
                    continue;
                }
                if status.is_client_error() {
                    return Err(SourceError::Rejected { status });
                }

                let url = response.url().to_string();
                match response.text().await {
                    Err(e) => {
                        log::warn!("  response body read failed for {url}: {e}");
                        last_cause = e.to_string();
                    }
                    Ok(text) => match serde_json::from_str(&text) {
                        Ok(value) => return Ok(value),
                        Err(e) => {
                            let preview = if text.len() > BODY_PREVIEW_LEN {
                                &text[..BODY_PREVIEW_LEN]
                            } else {
                                text.as_str()
                            };
                            log::warn!(
                                "  JSON parse failed for {url}: {e} \
                                 (received {} bytes, preview: {preview})",
                                text.len(),
                            );
                            last_cause = format!("JSON parse failed: {e}");
                        }
                    },
                }
            }
        }
    }

    Err(SourceError::Exhausted {
        attempts: max_retries,
        last_cause,
    })
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn response(status: u16, body: &str) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .body(body.to_string())
            .unwrap()
            .into()
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_server_errors() {
        let calls = AtomicU32::new(0);
        let value = send_json_with(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Ok(response(503, "unavailable"))
                    } else {
                        Ok(response(200, r#"{"features": []}"#))
                    }
                }
            },
            3,
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(value.get("features").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_persistent_server_errors() {
        let calls = AtomicU32::new(0);
        let err = send_json_with(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(response(503, "unavailable")) }
            },
            2,
        )
        .await
        .unwrap_err();

        // Initial attempt plus two retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            SourceError::Exhausted {
                attempts,
                last_cause,
            } => {
                assert_eq!(attempts, 2);
                assert!(last_cause.contains("503"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_client_error_without_retry() {
        let calls = AtomicU32::new(0);
        let err = send_json_with(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(response(404, "no such layer")) }
            },
            5,
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match err {
            SourceError::Rejected { status } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limiting() {
        let calls = AtomicU32::new(0);
        let value = send_json_with(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(response(429, "slow down"))
                    } else {
                        Ok(response(200, "42"))
                    }
                }
            },
            3,
        )
        .await
        .unwrap();

        assert_eq!(value, serde_json::json!(42));
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_garbled_body() {
        let calls = AtomicU32::new(0);
        let value = send_json_with(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(response(200, r#"{"features": [truncat"#))
                    } else {
                        Ok(response(200, r#"{"features": [1]}"#))
                    }
                }
            },
            3,
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(value["features"][0], serde_json::json!(1));
    }
}
