//! Remote shortening service boundary and its HTTP adapter.
//!
//! The trait is what the orchestrator consumes; `HttpShortenerApi` speaks the
//! service's JSON routes with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::domain::{AppError, Result, Session, ShortenedLink};

/// Operations offered by the remote shortening service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortenerApi: Send + Sync {
    /// Shorten a URL without an account.
    async fn shorten_public(&self, original_url: &str) -> Result<ShortenedLink>;

    /// Shorten a URL on behalf of the token's owner.
    async fn shorten_authenticated(&self, original_url: &str, token: &str)
        -> Result<ShortenedLink>;

    /// Replace the slug of an owned link.
    async fn update_slug(&self, link_id: &str, new_slug: &str, token: &str)
        -> Result<ShortenedLink>;

    /// List the links owned by the token's owner.
    async fn list_history(&self, token: &str) -> Result<Vec<ShortenedLink>>;

    /// Exchange credentials for a session.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account and return its session.
    async fn register(&self, email: &str, password: &str) -> Result<Session>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortenBody<'a> {
    original_url: &'a str,
}

#[derive(Serialize)]
struct SlugBody<'a> {
    slug: &'a str,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// JSON-over-HTTP adapter for the shortening service.
#[derive(Debug, Clone)]
pub struct HttpShortenerApi {
    client: Client,
    base_url: Url,
}

impl HttpShortenerApi {
    /// Build an adapter for the service at `base_url`.
    ///
    /// # Errors
    /// Returns error if the base URL is not absolute or the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| AppError::Config {
            message: format!("Invalid API base URL '{base_url}': {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config {
                message: format!("API base URL must use http or https: {base_url}"),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::transport)?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Route under the base URL. Each segment is percent-encoded, so ids
    /// cannot add path components, a query or a fragment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Config {
                message: format!("API base URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, route: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(route, error = %e, "Request failed to send");
            AppError::transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(route, status = status.as_u16(), "Request succeeded");
            return response.json::<T>().await.map_err(AppError::transport);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(route, status = status.as_u16(), "Service returned an error");

        Err(match server_message(&body) {
            Some(message) => AppError::Server {
                status: status.as_u16(),
                message: Some(message),
            },
            None => AppError::Transport {
                message: format!("HTTP {status}"),
                source: None,
            },
        })
    }
}

/// Extract the service's `message` field from an error body.
///
/// The service sends either a string or a list of strings.
fn server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("message")? {
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

#[async_trait]
impl ShortenerApi for HttpShortenerApi {
    async fn shorten_public(&self, original_url: &str) -> Result<ShortenedLink> {
        let request = self
            .client
            .post(self.endpoint(&["shorten", "public"])?)
            .json(&ShortenBody { original_url });
        self.send("shorten/public", request).await
    }

    async fn shorten_authenticated(
        &self,
        original_url: &str,
        token: &str,
    ) -> Result<ShortenedLink> {
        let request = self
            .client
            .post(self.endpoint(&["shorten"])?)
            .bearer_auth(token)
            .json(&ShortenBody { original_url });
        self.send("shorten", request).await
    }

    async fn update_slug(
        &self,
        link_id: &str,
        new_slug: &str,
        token: &str,
    ) -> Result<ShortenedLink> {
        let request = self
            .client
            .put(self.endpoint(&["urls", link_id])?)
            .bearer_auth(token)
            .json(&SlugBody { slug: new_slug });
        self.send("urls/{id}", request).await
    }

    async fn list_history(&self, token: &str) -> Result<Vec<ShortenedLink>> {
        let request = self.client.get(self.endpoint(&["urls"])?).bearer_auth(token);
        self.send("urls", request).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.endpoint(&["user", "login"])?)
            .json(&CredentialsBody { email, password });
        self.send("user/login", request).await
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .client
            .post(self.endpoint(&["user", "signup"])?)
            .json(&CredentialsBody { email, password });
        self.send("user/signup", request).await
    }
}
