//! Credential providers for [`HttpTransport`](crate::HttpTransport).

use async_trait::async_trait;
use http::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use zone_settings::{Authenticator, BoxError};

/// Sends no credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn authenticate(&self, _headers: &mut HeaderMap) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Sets `Authorization: Bearer <token>` on every request.
///
/// The header value is marked sensitive so it is redacted from `Debug`
/// output.
#[derive(Debug)]
pub struct BearerToken {
    token: SecretString,
    header_name: HeaderName,
}

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            header_name: AUTHORIZATION,
        }
    }

    /// Sends the bearer value under a different header name.
    #[must_use]
    pub fn with_header_name(mut self, header_name: HeaderName) -> Self {
        self.header_name = header_name;
        self
    }
}

#[async_trait]
impl Authenticator for BearerToken {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), BoxError> {
        let raw = zeroize::Zeroizing::new(format!("Bearer {}", self.token.expose_secret()));
        let mut value = HeaderValue::from_str(&raw)?;
        value.set_sensitive(true);
        headers.insert(self.header_name.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bearer_sets_sensitive_header() {
        let mut headers = HeaderMap::new();
        BearerToken::new("s3cr3t")
            .authenticate(&mut headers)
            .await
            .unwrap();
        let value = &headers[AUTHORIZATION];
        assert_eq!(value, "Bearer s3cr3t");
        assert!(value.is_sensitive());
        assert!(!format!("{value:?}").contains("s3cr3t"));
    }

    #[tokio::test]
    async fn bearer_replaces_existing_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic old"));
        BearerToken::new("t").authenticate(&mut headers).await.unwrap();
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers[AUTHORIZATION], "Bearer t");
    }

    #[tokio::test]
    async fn custom_header_name() {
        let mut headers = HeaderMap::new();
        BearerToken::new("t")
            .with_header_name(HeaderName::from_static("x-auth-token"))
            .authenticate(&mut headers)
            .await
            .unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers["x-auth-token"], "Bearer t");
    }

    #[tokio::test]
    async fn invalid_token_is_an_error() {
        let mut headers = HeaderMap::new();
        let result = BearerToken::new("line\nbreak").authenticate(&mut headers).await;
        assert!(result.is_err());
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn no_auth_leaves_headers_alone() {
        let mut headers = HeaderMap::new();
        NoAuth.authenticate(&mut headers).await.unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", BearerToken::new("s3cr3t"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
