//! HTTP clients for the balance, wins, subscription and channel services.

use reqwest::StatusCode;
use thiserror::Error;

use crate::{
    config::{AppConfig, Identity},
    models::{BalancePayload, Channel, WinsPayload},
};

/// Errors produced by the remote service clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, timeout, body decode.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("{context} returned {status}")]
    Status {
        /// Which call failed.
        context: &'static str,
        /// The offending HTTP status.
        status: StatusCode,
    },
}

/// Thin client over the game's REST collaborators.
///
/// Balance, wins, subscription and channel live behind `api_url`; the win
/// increment goes through the separate gateway.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    gateway_base: String,
}

impl ApiClient {
    /// Build a client from the configured base URLs.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_base: trim_base(&config.api_url),
            gateway_base: trim_base(&config.gateway_url),
        })
    }

    /// Current balance for the user.
    pub async fn balance(&self, identity: &Identity) -> Result<i64, ApiError> {
        let url = format!("{}/get_user_balance/{}", self.api_base, identity.user_id);
        let res = self
            .http
            .get(url)
            .query(&[("bot_username", identity.bot_username.as_str())])
            .send()
            .await?;
        let res = check("balance fetch", res)?;
        Ok(res.json::<BalancePayload>().await?.balance)
    }

    /// Apply a signed delta to the server-side balance.
    pub async fn update_balance(&self, identity: &Identity, delta: i64) -> Result<(), ApiError> {
        let url = format!("{}/update_user_balance/{}", self.api_base, identity.user_id);
        let res = self
            .http
            .post(url)
            .query(&[("bot_username", identity.bot_username.as_str())])
            .json(&serde_json::json!({ "count": delta }))
            .send()
            .await?;
        check("balance update", res)?;
        Ok(())
    }

    /// Increment the server-side win counter.
    pub async fn increase_wins(&self, identity: &Identity) -> Result<(), ApiError> {
        let url = format!("{}/increase_wins/{}", self.gateway_base, identity.user_id);
        let res = self.http.post(url).send().await?;
        check("win increment", res)?;
        Ok(())
    }

    /// Current win count for the user.
    pub async fn wins(&self, identity: &Identity) -> Result<u32, ApiError> {
        let url = format!("{}/get_user_wins/{}", self.api_base, identity.user_id);
        let res = self
            .http
            .get(url)
            .query(&[("bot_username", identity.bot_username.as_str())])
            .send()
            .await?;
        let res = check("wins fetch", res)?;
        Ok(res.json::<WinsPayload>().await?.wins)
    }

    /// Whether the user is subscribed to the gated channel.
    pub async fn check_subscription(&self, identity: &Identity) -> Result<bool, ApiError> {
        let url = format!("{}/check_subscription/{}", self.api_base, identity.user_id);
        let res = self
            .http
            .get(url)
            .query(&[("bot_username", identity.bot_username.as_str())])
            .send()
            .await?;
        let res = check("subscription check", res)?;
        Ok(res.json::<bool>().await?)
    }

    /// Metadata of the channel the subscribe modal promotes.
    pub async fn channel(&self, identity: &Identity) -> Result<Channel, ApiError> {
        let url = format!("{}/get_channel", self.api_base);
        let res = self
            .http
            .get(url)
            .query(&[("bot_username", identity.bot_username.as_str())])
            .send()
            .await?;
        let res = check("channel fetch", res)?;
        Ok(res.json::<Channel>().await?)
    }
}

fn check(context: &'static str, res: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        Err(ApiError::Status { context, status })
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_lose_trailing_slashes() {
        assert_eq!(trim_base("http://api.test/"), "http://api.test");
        assert_eq!(trim_base("http://api.test"), "http://api.test");
        assert_eq!(trim_base("http://api.test//"), "http://api.test");
    }

    #[test]
    fn status_errors_name_the_call() {
        let error = ApiError::Status {
            context: "wins fetch",
            status: StatusCode::BAD_GATEWAY,
        };
        assert_eq!(error.to_string(), "wins fetch returned 502 Bad Gateway");
    }
}
