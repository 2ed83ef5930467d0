//! Seams to the outside world: sending a request and attaching credentials.
//!
//! The core never opens connections itself. A [`Transport`] receives the fully
//! assembled [`RequestDescriptor`] and hands back the status and raw body.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::BoxError;
use crate::request::RequestDescriptor;

/// Raw HTTP response as seen by the envelope decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes HTTP requests.
///
/// Implementations must be safe to call concurrently. Any error returned here
/// is reported to the caller as a transport-stage failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, BoxError>;
}

/// Adds credentials to outgoing requests.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), BoxError>;
}
