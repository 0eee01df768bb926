// Reddit API client: OAuth (client-credentials) or anonymous JSON over HTTP.
//
// With app credentials the client talks to oauth.reddit.com using a bearer
// token from the application-only grant. Without them it falls back to the
// public `.json` endpoints on www.reddit.com, which serve the same listing
// shapes at a lower rate limit.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::rate_limit::{with_retry, RateLimitedError, RateLimiter};

/// API endpoint for authenticated requests.
pub const DEFAULT_OAUTH_API_URL: &str = "https://oauth.reddit.com";

/// API endpoint for anonymous requests.
pub const DEFAULT_PUBLIC_API_URL: &str = "https://www.reddit.com";

/// Host that issues access tokens.
pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com";

/// Reddit rejects requests without a descriptive user agent.
pub const DEFAULT_USER_AGENT: &str = "subsift/0.1 (subreddit query frequency)";

/// Tokens are refreshed this many seconds before Reddit says they expire.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Reddit "script" app credentials for the application-only OAuth grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Host serving `/api/v1/access_token`.
    pub auth_url: String,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Thin reqwest wrapper with a generic JSON GET helper.
///
/// All requests share one rate limiter sized for the auth mode.
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: RateLimiter,
}

impl RedditClient {
    /// Create a client against `base_url`.
    ///
    /// Pass `None` for credentials to use the anonymous JSON API; the base URL
    /// should then be `https://www.reddit.com`.
    pub fn new(base_url: &str, user_agent: &str, credentials: Option<Credentials>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        let rate_limiter = if credentials.is_some() {
            RateLimiter::oauth()
        } else {
            RateLimiter::anonymous()
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            token: Mutex::new(None),
            rate_limiter,
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let credentials = config.credentials();
        info!(
            authenticated = credentials.is_some(),
            api_url = config.effective_api_url(),
            "Creating Reddit client"
        );
        Self::new(config.effective_api_url(), &config.user_agent, credentials)
    }

    /// Whether requests carry an OAuth bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Full URL for an API path such as `/r/rust/new`.
    ///
    /// The anonymous API needs the `.json` suffix; the OAuth API serves JSON
    /// without it.
    pub fn endpoint_url(&self, path: &str) -> String {
        let path = path.trim_end_matches('/');
        if self.is_authenticated() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}.json", self.base_url, path)
        }
    }

    /// Make a GET request to an API path and deserialize the response.
    ///
    /// `raw_json=1` is always sent so bodies come back without HTML entity
    /// escaping. Rate limiting and 429 retries are handled here.
    pub async fn api_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        with_retry(&self.rate_limiter, || self.get_once(path, params)).await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint_url(path);

        debug!(path = path, "Reddit GET request");

        let mut request = self
            .client
            .get(&url)
            .query(params)
            .query(&[("raw_json", "1")]);

        if self.is_authenticated() {
            let token = self.access_token().await?;
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Reddit request failed: {path}"))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RateLimitedError {
                path: path.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit API {path} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {path} response"))
    }

    /// Return a cached bearer token, requesting a new one when it's missing
    /// or about to expire.
    async fn access_token(&self) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No Reddit credentials configured"))?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let url = format!(
            "{}/api/v1/access_token",
            credentials.auth_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to request Reddit access token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit token endpoint returned {status}: {body}");
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Reddit token response")?;
        let (value, expires_in) = parsed.into_token()?;

        info!(expires_in = expires_in, "Obtained Reddit access token");

        let lifetime = Duration::from_secs(expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS));
        *cached = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(value)
    }
}

/// Response from `/api/v1/access_token`.
///
/// Bad credentials can come back as a 200 with an `error` field instead of
/// a token, so every field is optional.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
}

impl TokenResponse {
    /// Extract the token and its lifetime in seconds, or the API's error.
    pub fn into_token(self) -> Result<(String, u64)> {
        if let Some(error) = self.error {
            anyhow::bail!("Reddit rejected the app credentials: {error}");
        }
        let token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Reddit token response had no access_token"))?;
        Ok((token, self.expires_in.unwrap_or(3600)))
    }
}
