use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{ServiceBuilder, ServiceExt};
use zone_settings::{
    Authenticator, BoxError, RawResponse, RequestDescriptor, Transport, TransportSettings,
};

use crate::config::{HttpTransportConfig, TransportSecurity};
use crate::error::{HttpError, InvalidUriKind};
use crate::tls;

type InnerService =
    BoxCloneSyncService<http::Request<Full<Bytes>>, http::Response<Incoming>, HttpError>;

/// [`Transport`] over a pooled hyper client with rustls.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    service: InnerService,
    request_timeout: Duration,
    max_body_size: usize,
    transport_security: TransportSecurity,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .field("authenticated", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    #[must_use]
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Builds a transport from the `transport` section of a loaded
    /// [`zone_settings::ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Tls` if TLS initialization fails.
    pub fn from_settings(settings: &TransportSettings) -> Result<Self, HttpError> {
        HttpTransportBuilder::with_config(HttpTransportConfig::from(settings)).build()
    }

    /// Sends one request and reads the whole response body.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` for URL, authentication, network, timeout or body
    /// size failures.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, HttpError> {
        let uri = validate_url(&request.url, self.transport_security)?;

        let mut headers = request.headers;
        if let Some(authenticator) = &self.authenticator {
            authenticator
                .authenticate(&mut headers)
                .await
                .map_err(HttpError::Auth)?;
        }

        let mut http_request = http::Request::new(Full::new(request.body.unwrap_or_default()));
        *http_request.method_mut() = request.method;
        *http_request.uri_mut() = uri;
        *http_request.headers_mut() = headers;

        // One deadline covers both the response head and the body.
        let deadline = tokio::time::Instant::now() + self.request_timeout;
        let response = self.service.clone().oneshot(http_request).await?;
        let status = response.status();

        let body = tokio::time::timeout_at(
            deadline,
            read_body_limited(response.into_body(), self.max_body_size),
        )
        .await
        .map_err(|_| HttpError::Timeout(self.request_timeout))??;

        tracing::debug!(status = %status, bytes = body.len(), "response body read");
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, BoxError> {
        self.execute(request).await.map_err(Into::into)
    }
}

/// Builder for [`HttpTransport`].
pub struct HttpTransportBuilder {
    config: HttpTransportConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl HttpTransportBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: HttpTransportConfig) -> Self {
        Self {
            config,
            authenticator: None,
        }
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the maximum response body size
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set transport security mode
    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Allow insecure HTTP connections (for testing only)
    ///
    /// Only available in debug builds or with the `allow-insecure-http`
    /// feature.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        tracing::warn!(
            target: "zone_settings_http::security",
            "allow_insecure_http() called - HTTP traffic will NOT be encrypted"
        );
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Credentials added to every request after the headers are assembled.
    #[must_use]
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// # Errors
    ///
    /// Returns `HttpError::Tls` if TLS initialization fails.
    pub fn build(self) -> Result<HttpTransport, HttpError> {
        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let timeout = self.config.request_timeout;
        let https = tls::build_https_connector(self.config.transport)?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        // pool_timer is required for pool_idle_timeout to take effect
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .http2_only(false);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .service(hyper_client)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout));

        Ok(HttpTransport {
            service: BoxCloneSyncService::new(service),
            request_timeout: timeout,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
            authenticator: self.authenticator,
        })
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }
    match err.downcast::<hyper_util::client::legacy::Error>() {
        Ok(hyper_err) => HttpError::from(*hyper_err),
        Err(other) => HttpError::Transport(other),
    }
}

/// Checks scheme and authority against the transport security mode.
fn validate_url(url: &str, security: TransportSecurity) -> Result<http::Uri, HttpError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::ParseError,
            reason: e.to_string(),
        })?;

    if uri.authority().is_none() {
        return Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingAuthority,
            reason: "missing host/authority".to_owned(),
        });
    }

    match uri.scheme_str() {
        Some("https") => Ok(uri),
        Some("http") => match security {
            TransportSecurity::AllowInsecureHttp => Ok(uri),
            TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                scheme: "http".to_owned(),
                reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
            }),
        },
        Some(scheme) => Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
            reason: "only http:// and https:// schemes are supported".to_owned(),
        }),
        None => Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingScheme,
            reason: "missing scheme".to_owned(),
        }),
    }
}

async fn read_body_limited<B>(body: B, limit: usize) -> Result<Bytes, HttpError>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| HttpError::Transport(e.into()))?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}
