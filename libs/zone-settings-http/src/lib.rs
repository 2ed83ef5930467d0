#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for [`zone_settings`]
//!
//! Provides [`HttpTransport`], a [`zone_settings::Transport`] built on a
//! pooled hyper client with:
//! - TLS via rustls and webpki roots (HTTPS only by default)
//! - A per-request timeout covering headers and body
//! - A response body size limit
//! - Optional credentials through [`zone_settings::Authenticator`]
//!
//! Non-2xx responses are handed back to the client unchanged so the
//! envelope decoder can inspect them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zone_settings::{CallOptions, ZoneSettingsClient, catalog};
//! use zone_settings_http::{BearerToken, HttpTransport};
//!
//! let transport = HttpTransport::builder()
//!     .authenticator(Arc::new(BearerToken::new(token)))
//!     .build()?;
//!
//! let client = ZoneSettingsClient::builder()
//!     .base_url("https://api.example.com")
//!     .scope_ids(crn, zone_id)
//!     .transport(Arc::new(transport))
//!     .build()?;
//!
//! let ipv6 = client.get(&catalog::IPV6, &CallOptions::new()).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod tls;
pub mod transport;

pub use auth::{BearerToken, NoAuth};
pub use config::{HttpTransportConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use transport::{HttpTransport, HttpTransportBuilder};
