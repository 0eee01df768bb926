use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::reddit::client::{
    Credentials, DEFAULT_AUTH_URL, DEFAULT_OAUTH_API_URL, DEFAULT_PUBLIC_API_URL,
    DEFAULT_USER_AGENT,
};

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub user_agent: String,
    /// Overrides the API base URL. When unset, the URL follows the auth mode:
    /// oauth.reddit.com with credentials, www.reddit.com without.
    pub api_url: Option<String>,
    /// Token endpoint host for the client-credentials grant.
    pub auth_url: String,
    /// Where the last fetch is cached so `update` can re-analyze it.
    pub snapshot_path: PathBuf,
    /// Comma-separated stopwords applied when `--stopwords` isn't passed.
    pub default_stopwords: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is required here. Reddit credentials are optional: without
    /// them the client falls back to the anonymous public JSON API.
    pub fn load() -> Result<Self> {
        let snapshot_path = env::var("SUBSIFT_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_snapshot_path());

        Ok(Self {
            reddit_client_id: env::var("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            api_url: env::var("REDDIT_API_URL").ok().filter(|u| !u.is_empty()),
            auth_url: env::var("REDDIT_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            snapshot_path,
            default_stopwords: env::var("SUBSIFT_STOPWORDS").unwrap_or_default(),
        })
    }

    /// The app credentials, if both halves are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        if self.reddit_client_id.is_empty() || self.reddit_client_secret.is_empty() {
            return None;
        }
        Some(Credentials {
            client_id: self.reddit_client_id.clone(),
            client_secret: self.reddit_client_secret.clone(),
            auth_url: self.auth_url.clone(),
        })
    }

    /// API base URL for the configured auth mode.
    pub fn effective_api_url(&self) -> &str {
        match (&self.api_url, self.credentials()) {
            (Some(url), _) => url.as_str(),
            (None, Some(_)) => DEFAULT_OAUTH_API_URL,
            (None, None) => DEFAULT_PUBLIC_API_URL,
        }
    }

    /// Check that Reddit app credentials are configured.
    /// Call this when the user explicitly asked for authenticated access.
    pub fn require_credentials(&self) -> Result<()> {
        if self.credentials().is_none() {
            anyhow::bail!(
                "REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET must both be set.\n\
                 Create a \"script\" app at https://www.reddit.com/prefs/apps and\n\
                 add its id and secret to your .env file."
            );
        }
        Ok(())
    }
}

/// Default snapshot location under the platform data directory.
pub fn default_snapshot_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subsift")
        .join("last_fetch.json")
}
