use crate::error::HttpError;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::future::Future;

/// Response from a path-based REST call.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Path-based REST collaborator feeding the API reconciliation source.
///
/// Concrete HTTP stacks (connection pooling, TLS, retries) are outside the harness core.
pub trait RestClient
where
    Self: Send + Sync,
{
    fn get(&self, path: &str) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;

    fn post(
        &self,
        path: &str,
        body: String,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;

    fn put(
        &self,
        path: &str,
        body: String,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;

    fn delete(&self, path: &str) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

/// Bearer token with its expiry instant.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor)]
pub struct BearerToken {
    pub token: SmolStr,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Produces bearer tokens for the [`RestClient`]; token caching is the implementor's concern.
pub trait Authenticator
where
    Self: Send + Sync,
{
    fn bearer_token(&self) -> impl Future<Output = Result<BearerToken, HttpError>> + Send;
}

/// [`Authenticator`] returning a fixed, never-refreshed token. Suitable for tests only.
#[derive(Debug, Clone, Constructor)]
pub struct StaticTokenAuthenticator {
    token: BearerToken,
}

impl Authenticator for StaticTokenAuthenticator {
    async fn bearer_token(&self) -> Result<BearerToken, HttpError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::new(200, String::new()).is_success());
        assert!(HttpResponse::new(204, String::new()).is_success());
        assert!(!HttpResponse::new(302, String::new()).is_success());
        assert!(!HttpResponse::new(404, String::new()).is_success());
    }

    #[test]
    fn test_bearer_token_expiry() {
        let now = Utc::now();
        let token = BearerToken::new(SmolStr::new("token"), now + TimeDelta::seconds(60));

        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + TimeDelta::seconds(61)));
    }

    #[tokio::test]
    async fn test_static_authenticator_returns_configured_token() {
        let token = BearerToken::new(SmolStr::new("fixed"), Utc::now());
        let authenticator = StaticTokenAuthenticator::new(token.clone());

        assert_eq!(authenticator.bearer_token().await.unwrap(), token);
    }
}
