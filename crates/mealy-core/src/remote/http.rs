//! REST client for the hosted status store.

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::store::StatusStore;
use super::types::{parse_members, parse_schedule, Member, ResetRequest};
use crate::error::{ConfigError, RemoteError};
use crate::period::ScheduleConfig;
use crate::storage::credentials::resolve_token;
use crate::storage::Config;

const USERS: &str = "/api/users";
const SCHEDULE: &str = "/api/schedule";
const RESET_EATEN: &str = "/api/users/reset-eaten";
const MARK_EATEN: &str = "/api/users/mark-eaten";
const TOGGLE_AWAY: &str = "/api/users/toggle-away";
const REPORT_FOOD_FINISHED: &str = "/api/report-food-finished";
const UNDO_FOOD_FINISHED: &str = "/api/undo-food-finished";

pub struct HttpStatusStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStatusStore {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "remote.base_url".into(),
            message,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build from config, taking the token from `MEALY_TOKEN` or the keyring.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let token = resolve_token().map(|(token, _)| token);
        if token.is_none() {
            tracing::warn!("no API token configured; requests will be anonymous");
        }
        Self::new(&config.remote.base_url, token, config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str) -> Result<String, RemoteError> {
        let mut request = self
            .client
            .get(self.url(path))
            .header(header::CACHE_CONTROL, "no-cache");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = check(path, request.send().await?).await?;
        Ok(resp.text().await?)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), RemoteError> {
        let mut request = self
            .client
            .post(self.url(path))
            .header(header::CACHE_CONTROL, "no-cache")
            .json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        check(path, request.send().await?).await?;
        Ok(())
    }
}

async fn check(endpoint: &str, resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Unauthorized {
            endpoint: endpoint.to_string(),
        });
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Http {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl StatusStore for HttpStatusStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_members(&self) -> Result<Vec<Member>, RemoteError> {
        parse_members(&self.get_text(USERS).await?)
    }

    async fn fetch_schedule(&self) -> Result<ScheduleConfig, RemoteError> {
        parse_schedule(&self.get_text(SCHEDULE).await?)
    }

    async fn reset_eaten(&self, request: &ResetRequest) -> Result<(), RemoteError> {
        self.post(RESET_EATEN, request.to_json()).await
    }

    async fn mark_eaten(&self) -> Result<(), RemoteError> {
        self.post(MARK_EATEN, json!({})).await
    }

    async fn toggle_away(&self) -> Result<(), RemoteError> {
        self.post(TOGGLE_AWAY, json!({})).await
    }

    async fn report_food_finished(&self) -> Result<(), RemoteError> {
        self.post(REPORT_FOOD_FINISHED, json!({})).await
    }

    async fn undo_food_finished(&self) -> Result<(), RemoteError> {
        self.post(UNDO_FOOD_FINISHED, json!({})).await
    }
}
