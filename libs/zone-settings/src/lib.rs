#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed client for the per-zone settings of a remote management API.
//!
//! Every setting is a static [`SettingDescriptor`] in the [`catalog`]. A call
//! goes through one pipeline:
//!
//! 1. pick the resource scope (client-bound or per call),
//! 2. resolve the path template,
//! 3. encode and validate the value against its [`ValueShape`],
//! 4. assemble method, URL, headers and body,
//! 5. hand the request to a [`Transport`],
//! 6. decode the response [`Envelope`] and its typed result.
//!
//! Any failure is reported as an [`OperationError`] tagged with the [`Stage`]
//! it happened in. A response with `success: false` is not an error; it is a
//! normal envelope carrying the server's `errors`.
//!
//! The crate does not open connections. `cf-zone-settings-http` provides a
//! hyper based [`Transport`].
//!
//! ```ignore
//! use zone_settings::{CallOptions, SettingValue, ZoneSettingsClient, catalog};
//!
//! let client = ZoneSettingsClient::builder()
//!     .base_url("https://api.example.com")
//!     .scope_ids("crn:v1:...", "zone-id")
//!     .transport(transport)
//!     .build()?;
//!
//! let envelope = client.get(&catalog::IPV6, &CallOptions::new()).await?;
//! let enabled = envelope
//!     .result
//!     .as_ref()
//!     .and_then(|r| r.value())
//!     .and_then(SettingValue::as_str)
//!     == Some("on");
//! ```

pub mod catalog;
pub mod client;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod path;
pub mod request;
pub mod result;
pub mod scope;
pub mod transport;
pub mod value;

pub use client::{CallOptions, ClientBuildError, ZoneSettingsClient, ZoneSettingsClientBuilder};
pub use codec::CodecError;
pub use config::{ClientConfig, ConfigError, TransportSettings};
pub use descriptor::{HttpMethod, ResultKind, ScopeBinding, SettingDescriptor, Verb};
pub use envelope::{Envelope, EnvelopeError};
pub use error::{BoxError, OperationError, Stage, classify};
pub use path::PathError;
pub use request::{RequestDescriptor, RequestError};
pub use result::{
    CnameFlatteningResult, DnssecResult, LogRetentionResult, SettingRecord, SettingResult,
};
pub use scope::{ResourceScope, ScopeError};
pub use transport::{Authenticator, RawResponse, Transport};
pub use value::{Field, SettingValue, Toggle, ValueShape};
