//! REST transport for the domain caches.

use crate::config::{AdminConfig, AuthConfig};
use crate::error::ClientError;
use async_trait::async_trait;
use divvy_cache::{Domain, PageRequest, ResourceKey, Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A domain served by a REST endpoint.
pub trait Endpoint: Domain {
    /// Path of the partition for `key`, starting with `/`.
    fn path(key: ResourceKey) -> String;
}

/// Query parameters for a page. Offsets of zero are left out.
pub fn page_query(page: PageRequest) -> Vec<(&'static str, usize)> {
    let mut query = Vec::with_capacity(2);
    if let Some(limit) = page.limit {
        query.push(("limit", limit));
    }
    if page.offset > 0 {
        query.push(("offset", page.offset));
    }
    query
}

/// GETs partitions from the Divvy backend.
///
/// One client is shared by every domain; `reqwest` pools connections and
/// enforces the configured timeout.
#[derive(Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: String,
    auth_headers: HeaderMap,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestTransport {
    pub fn new(config: &AdminConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let auth_headers = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            auth_headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the partition for `key` in domain `D`.
    pub fn url<D: Endpoint>(&self, key: ResourceKey) -> String {
        format!("{}{}", self.base_url, D::path(key))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        page: PageRequest,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers.clone())
            .query(&page_query(page))
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        parse_response(response).await
    }
}

#[async_trait]
impl<D> Transport<D> for RestTransport
where
    D: Endpoint,
    D::Raw: DeserializeOwned,
{
    async fn fetch(&self, key: ResourceKey, page: PageRequest) -> Result<D::Raw, TransportError> {
        let url = self.url::<D>(key);
        tracing::debug!(domain = D::NAME, %url, limit = ?page.limit, offset = page.offset, "GET");
        self.get_json(url, page).await
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TransportError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| TransportError::network(format!("invalid response body: {}", e)));
    }

    let text = response.text().await.unwrap_or_default();
    Err(http_error(status.as_u16(), status.canonical_reason(), &text))
}

/// Build the error for a non-success response.
///
/// A JSON body is kept for classification; the message is the raw body, or
/// the status reason when the body is empty.
pub fn http_error(status: u16, reason: Option<&str>, text: &str) -> TransportError {
    let body = serde_json::from_str::<Value>(text).ok();
    let message = if text.trim().is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        text.trim().to_string()
    };
    TransportError::http(status, body, message)
}

pub fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = auth.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key.trim()).map_err(|e| ClientError::InvalidHeader {
                header: "x-api-key",
                reason: e.to_string(),
            })?,
        );
    }
    if let Some(jwt) = auth.jwt.as_deref().filter(|jwt| !jwt.trim().is_empty()) {
        let value = format!("Bearer {}", jwt.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ClientError::InvalidHeader {
                header: "authorization",
                reason: e.to_string(),
            })?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::{Activity, Balances, Expenses, Groups, Users};
    use divvy_cache::FailureKind;
    use serde_json::json;

    fn key(value: i64) -> ResourceKey {
        ResourceKey::new(value).unwrap()
    }

    fn config() -> AdminConfig {
        AdminConfig::from_toml(
            r#"
            api_base_url = "https://divvy.example.com/"
            request_timeout_ms = 1000
            [auth]
            api_key = "k-123"
            jwt = "abc.def"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let transport = RestTransport::new(&config()).unwrap();
        assert_eq!(
            transport.url::<Balances>(key(4)),
            "https://divvy.example.com/api/groups/4/balances"
        );
        assert_eq!(
            transport.url::<Expenses>(key(4)),
            "https://divvy.example.com/api/groups/4/expenses"
        );
        assert_eq!(
            transport.url::<Activity>(key(4)),
            "https://divvy.example.com/api/groups/4/activity"
        );
        assert_eq!(
            transport.url::<Users>(key(4)),
            "https://divvy.example.com/api/groups/4/members"
        );
        assert_eq!(
            transport.url::<Groups>(key(9)),
            "https://divvy.example.com/api/users/9/groups"
        );
    }

    #[test]
    fn test_page_query() {
        assert!(page_query(PageRequest::first()).is_empty());
        assert_eq!(page_query(PageRequest::limit(20)), vec![("limit", 20)]);
        assert_eq!(
            page_query(PageRequest::page(20, 40)),
            vec![("limit", 20), ("offset", 40)]
        );
    }

    #[test]
    fn test_auth_headers() {
        let headers = build_auth_headers(&config().auth).unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "k-123");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer abc.def");
    }

    #[test]
    fn test_auth_header_rejects_control_characters() {
        let auth = AuthConfig {
            api_key: Some("bad\nkey".to_string()),
            jwt: None,
        };
        assert!(matches!(
            build_auth_headers(&auth),
            Err(ClientError::InvalidHeader {
                header: "x-api-key",
                ..
            })
        ));
    }

    #[test]
    fn test_http_error_keeps_json_body() {
        let error = http_error(404, Some("Not Found"), r#"{"error":"Group not found"}"#);
        assert_eq!(error.status, Some(404));
        assert_eq!(error.body, Some(json!({"error": "Group not found"})));
        assert_eq!(error.payload_message().as_deref(), Some("Group not found"));

        let classified = divvy_cache::recovery::classify::<Balances>(error);
        assert_eq!(classified.kind(), FailureKind::NotFound);
    }

    #[test]
    fn test_http_error_without_body_uses_reason() {
        let error = http_error(502, Some("Bad Gateway"), "");
        assert_eq!(error.body, None);
        assert_eq!(error.message, "Bad Gateway");
        assert!(error.is_server_error());
    }
}
