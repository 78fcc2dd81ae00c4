//! HTTP retry helper for transient provider errors.
//!
//! Both provider implementations send their requests through
//! [`send_json`] so every embedding or generation call gets a bounded
//! number of retries with exponential backoff for timeouts, connection
//! resets, HTTP 429, and HTTP 5xx. Other 4xx statuses are permanent and
//! surface immediately.

use std::time::Duration;

use crate::AiError;

/// Maximum retry attempts for transient errors. With backoff delays of
/// 2s, 4s, 8s the total extra wait before giving up is 14 seconds.
const MAX_RETRIES: u32 = 3;

/// Maximum length of the response body preview included in error messages.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`AiError`] if the request still fails after all retries, the
/// server returns a non-retryable status, or the body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, AiError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<AiError> = None;

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << attempt); // 2s, 4s, 8s
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    last_error = Some(AiError::Http(e));
                    continue;
                }
                return Err(AiError::Http(e));
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if attempt < MAX_RETRIES {
                log::warn!("  HTTP {status}, retrying");
                last_error = Some(AiError::Provider {
                    message: format!("HTTP {status}"),
                });
                continue;
            }
            return Err(AiError::Provider {
                message: format!("HTTP {status} after {MAX_RETRIES} retries"),
            });
        }

        let body = response.text().await?;

        if !status.is_success() {
            // Non-429 client errors are permanent.
            return Err(AiError::Provider {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        return serde_json::from_str(&body).map_err(|e| AiError::Provider {
            message: format!("invalid JSON response: {e} (body: {})", preview(&body)),
        });
    }

    Err(last_error.unwrap_or_else(|| AiError::Provider {
        message: "request failed after all retries".to_string(),
    }))
}

fn preview(body: &str) -> String {
    if body.len() > BODY_PREVIEW_LEN {
        // Back up to a char boundary so multibyte bodies slice safely.
        let mut end = BODY_PREVIEW_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
