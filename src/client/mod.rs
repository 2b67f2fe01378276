//! HTTP probe client
//!
//! This module issues the single GET request behind each HTTP probe:
//! - Building the shared `reqwest` client from [`HttpOptions`]
//!   (redirect, proxy and TLS policy, timeout)
//! - Per-request headers: cookie, user agent, basic auth
//! - Classifying transport failures, certificate errors in particular
//! - Computing the response length when requested

use crate::config::HttpOptions;
use crate::{BusterError, ClientError, ClientResult, ConfigError, DEFAULT_USER_AGENT};
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::{redirect::Policy, Client, Proxy, Response};
use std::error::Error as StdError;
use tokio_util::sync::CancellationToken;

/// Classification of one successful request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code of the (last) response
    pub status: u16,

    /// Response length, only computed when length reporting is enabled
    pub length: Option<u64>,
}

/// Wrapper around a shared HTTP transport
///
/// Configured once from [`HttpOptions`] and never mutated afterwards. Clones of
/// the inner `reqwest::Client` share the same connection pool.
#[derive(Debug)]
pub struct ProbeClient {
    client: Client,
    cancel: CancellationToken,
    user_agent: String,
    username: Option<String>,
    password: Option<String>,
    include_length: bool,
}

impl ProbeClient {
    /// Creates a new probe client
    ///
    /// # Arguments
    ///
    /// * `options` - The HTTP options of the run
    /// * `cancel` - Token that aborts in-flight requests when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(ProbeClient)` - Successfully built client
    /// * `Err(BusterError)` - Invalid proxy or TLS backend failure
    pub fn new(options: &HttpOptions, cancel: CancellationToken) -> Result<Self, BusterError> {
        let client = build_http_client(options)?;

        let user_agent = options
            .user_agent
            .clone()
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            client,
            cancel,
            user_agent,
            username: options.username.clone().filter(|u| !u.is_empty()),
            password: options.password.clone(),
            include_length: options.include_length,
        })
    }

    /// Sends a GET request to `url` and classifies the response
    ///
    /// The request is abandoned as soon as the cancellation token fires. The
    /// response body is always consumed before returning so the connection can
    /// go back to the pool.
    ///
    /// # Arguments
    ///
    /// * `url` - Full URL to request
    /// * `cookie` - Raw Cookie header value, skipped when empty
    pub async fn probe(&self, url: &str, cookie: Option<&str>) -> ClientResult<ProbeResponse> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.send(url, cookie) => result,
        }
    }

    async fn send(&self, url: &str, cookie: Option<&str>) -> ClientResult<ProbeResponse> {
        let mut request = self.client.get(url).header(USER_AGENT, &self.user_agent);

        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            request = request.header(COOKIE, cookie);
        }

        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();

        let length = if self.include_length {
            Some(response_length(response).await)
        } else {
            drain(response).await;
            None
        };

        Ok(ProbeResponse { status, length })
    }
}

/// Builds the shared HTTP client
///
/// Without an explicit proxy, reqwest picks up the usual proxy environment
/// variables and connects directly when none are set.
pub fn build_http_client(options: &HttpOptions) -> Result<Client, BusterError> {
    let redirect = if options.follow_redirect {
        Policy::default()
    } else {
        Policy::none()
    };

    let mut builder = Client::builder()
        .timeout(options.timeout())
        .redirect(redirect)
        .danger_accept_invalid_certs(options.insecure_tls)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.is_empty()) {
        let proxy = Proxy::all(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Proxy URL is invalid: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Maps a transport error to a [`ClientError`]
fn classify_error(url: &str, error: reqwest::Error) -> ClientError {
    if is_certificate_error(&error) {
        ClientError::InvalidCertificate
    } else {
        ClientError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Returns true if any cause of `error` is a certificate failure
///
/// Only the source chain is inspected: the top level message carries the
/// request URL, which may contain anything.
fn is_certificate_error(error: &(dyn StdError + 'static)) -> bool {
    let mut cause = error.source();
    while let Some(err) = cause {
        let message = err.to_string().to_lowercase();
        if message.contains("certificate") || message.contains("x509") {
            return true;
        }
        cause = err.source();
    }
    false
}

/// Declared length if positive, otherwise the length of the body
async fn response_length(response: Response) -> u64 {
    match response.content_length() {
        Some(length) if length > 0 => {
            drain(response).await;
            length
        }
        _ => match response.bytes().await {
            Ok(body) => body_length(&body),
            Err(e) => {
                tracing::debug!("Failed to read response body: {}", e);
                0
            }
        },
    }
}

/// Length of a response body
///
/// Text bodies count Unicode code points; bodies that are not valid UTF-8
/// count raw bytes.
pub fn body_length(body: &[u8]) -> u64 {
    match std::str::from_utf8(body) {
        Ok(text) => text.chars().count() as u64,
        Err(_) => body.len() as u64,
    }
}

/// Reads and discards whatever is left of the body
async fn drain(mut response: Response) {
    while let Ok(Some(_)) = response.chunk().await {}
}
