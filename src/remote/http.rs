//! HTTP remote store
//!
//! Talks to a cache server speaking the `/utils/cache` envelope protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{RemoteError, RemoteResult};
use crate::models::{ApiResponse, PutRequest};
use crate::remote::RemoteStore;

/// Remote store backed by `{base}/utils/cache` over HTTP.
///
/// One `reqwest::Client` is built up front and reused; every request is
/// bounded by `timeout`. A 401 answer is retried exactly once.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
    timeout: Duration,
}

impl HttpRemoteStore {
    /// Creates a store rooted at `base_url`, e.g. `http://127.0.0.1:3000/api/v2`.
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            auth_token: None,
            timeout,
        })
    }

    /// Builds the store described by `config`, or `None` when no base URL is set.
    pub fn from_config(config: &Config) -> RemoteResult<Option<Self>> {
        let Some(base_url) = config.remote_base_url.as_deref() else {
            return Ok(None);
        };
        let store = Self::new(base_url, config.remote_timeout())?;
        Ok(Some(match &config.remote_auth_token {
            Some(token) => store.with_bearer_token(token.clone()),
            None => store,
        }))
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/utils/cache` or `{base}/utils/cache/{key}` with the key as one
    /// percent-encoded segment.
    fn cache_url(&self, key: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // cannot-be-a-base URLs are rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("utils").push("cache");
            if let Some(key) = key {
                segments.push(key);
            }
        }
        url
    }

    async fn send(&self, method: Method, url: Url, body: Option<&PutRequest>) -> RemoteResult<Response> {
        let mut retried = false;
        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header(CONTENT_TYPE, "application/json");
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, %url, "sending remote cache request");
            let response = request.send().await.map_err(|e| self.classify(e))?;

            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                warn!(%method, %url, "remote cache answered 401, retrying once");
                continue;
            }

            debug!(%url, status = %response.status(), "received remote cache response");
            return Ok(response);
        }
    }

    fn classify(&self, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Transport(error)
        }
    }

    async fn read_envelope(&self, response: Response) -> RemoteResult<ApiResponse> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str::<ApiResponse>(&body).map_err(|e| {
            RemoteError::Malformed(format!("{} | body: {}", e, truncate_body(&body)))
        })
    }

    async fn expect_ack(&self, response: Response) -> RemoteResult<()> {
        let envelope = self.read_envelope(response).await?;
        if envelope.success {
            Ok(())
        } else {
            Err(RemoteError::Rejected(
                envelope.message.unwrap_or_else(|| "no message".to_string()),
            ))
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(&self, key: &str) -> RemoteResult<Option<Value>> {
        let response = self.send(Method::GET, self.cache_url(Some(key)), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope = self.read_envelope(response).await?;
        // a successful envelope without data carries nothing to cache
        if envelope.success && !envelope.data.is_null() {
            Ok(Some(envelope.data))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, key: &str, value: &Value, ttl_seconds: u64) -> RemoteResult<()> {
        let body = PutRequest {
            key: key.to_string(),
            data: value.clone(),
            ttl: Some(ttl_seconds),
        };
        let response = self.send(Method::POST, self.cache_url(None), Some(&body)).await?;
        self.expect_ack(response).await
    }

    async fn delete(&self, key: &str) -> RemoteResult<()> {
        let response = self.send(Method::DELETE, self.cache_url(Some(key)), None).await?;
        // already absent on the remote
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.expect_ack(response).await
    }

    async fn clear(&self) -> RemoteResult<()> {
        let response = self.send(Method::DELETE, self.cache_url(None), None).await?;
        self.expect_ack(response).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 512;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX).collect();
        format!("{}...[truncated]", head)
    }
}
