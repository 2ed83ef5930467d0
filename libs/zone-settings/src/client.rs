use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use thiserror::Error;
use url::Url;

use crate::catalog::{self, CnameFlatteningMode, DnssecStatus};
use crate::codec::encode_body;
use crate::config::ClientConfig;
use crate::descriptor::{ScopeBinding, SettingDescriptor, Verb};
use crate::envelope::{Envelope, decode_envelope};
use crate::error::{OperationError, Stage, classify};
use crate::path::resolve_path;
use crate::request::{DEFAULT_USER_AGENT, RequestError, RequestParts, assemble, parse_header};
use crate::result::{CnameFlatteningResult, DnssecResult, LogRetentionResult, SettingRecord};
use crate::scope::{ResourceScope, ScopeError};
use crate::transport::Transport;
use crate::value::SettingValue;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientBuildError {
    #[error("base URL is required")]
    MissingBaseUrl,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("resource scope is required")]
    MissingScope,

    #[error("invalid resource scope: {0}")]
    Scope(#[from] ScopeError),

    #[error("transport is required")]
    MissingTransport,

    #[error("invalid default header: {0}")]
    Header(#[from] RequestError),
}

/// Per-call options: extra headers and, for settings that take it, the
/// resource scope.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    headers: Vec<(String, String)>,
    scope: Option<ResourceScope>,
}

impl CallOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header. Validated when the request is assembled; an illegal
    /// name or value fails the call at the validation stage.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Scope for settings that require one per call.
    #[must_use]
    pub fn scope(mut self, scope: ResourceScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn resource_scope(&self) -> Option<&ResourceScope> {
        self.scope.as_ref()
    }
}

/// Client for the zone settings API.
///
/// Immutable after construction. Clones share the transport and can be used
/// from any number of tasks at once.
#[derive(Clone)]
pub struct ZoneSettingsClient {
    base_url: Url,
    scope: ResourceScope,
    default_headers: HeaderMap,
    user_agent: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ZoneSettingsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneSettingsClient")
            .field("base_url", &self.base_url.as_str())
            .field("scope", &self.scope)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl ZoneSettingsClient {
    #[must_use]
    pub fn builder() -> ZoneSettingsClientBuilder {
        ZoneSettingsClientBuilder::default()
    }

    /// Builds a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if the configuration does not describe a
    /// usable client.
    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientBuildError> {
        let mut builder = Self::builder()
            .base_url(config.base_url.as_str())
            .scope_ids(config.crn.as_str(), config.zone_identifier.as_str())
            .transport(transport);
        for (name, value) in &config.headers {
            builder = builder.default_header(name.as_str(), value.as_str());
        }
        if let Some(user_agent) = &config.transport.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build()
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }

    /// Reads the current value of a setting.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] classified by the stage that failed.
    pub async fn get(
        &self,
        setting: &SettingDescriptor,
        options: &CallOptions,
    ) -> Result<Envelope<SettingRecord>, OperationError> {
        self.execute(setting, Verb::Get, None, options).await
    }

    /// Changes a setting. `None` sends the request without a body.
    ///
    /// The value is checked against the setting's shape before anything is
    /// sent; a rejected value never reaches the transport.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] classified by the stage that failed.
    pub async fn update(
        &self,
        setting: &SettingDescriptor,
        value: Option<&SettingValue>,
        options: &CallOptions,
    ) -> Result<Envelope<SettingRecord>, OperationError> {
        self.execute(setting, Verb::Update, value, options).await
    }

    /// # Errors
    ///
    /// See [`ZoneSettingsClient::get`].
    pub async fn dnssec(
        &self,
        scope: &ResourceScope,
    ) -> Result<Envelope<DnssecResult>, OperationError> {
        let options = CallOptions::new().scope(scope.clone());
        let envelope = self.get(&catalog::DNSSEC, &options).await?;
        narrow(
            &catalog::DNSSEC,
            Verb::Get,
            envelope,
            SettingRecord::into_dnssec,
        )
    }

    /// # Errors
    ///
    /// See [`ZoneSettingsClient::update`].
    pub async fn update_dnssec(
        &self,
        scope: &ResourceScope,
        status: DnssecStatus,
    ) -> Result<Envelope<DnssecResult>, OperationError> {
        let options = CallOptions::new().scope(scope.clone());
        let value = Some(SettingValue::from(status));
        let envelope = self
            .update(&catalog::DNSSEC, value.as_ref(), &options)
            .await?;
        narrow(
            &catalog::DNSSEC,
            Verb::Update,
            envelope,
            SettingRecord::into_dnssec,
        )
    }

    /// # Errors
    ///
    /// See [`ZoneSettingsClient::get`].
    pub async fn log_retention(
        &self,
        scope: &ResourceScope,
    ) -> Result<Envelope<LogRetentionResult>, OperationError> {
        let options = CallOptions::new().scope(scope.clone());
        let envelope = self.get(&catalog::LOG_RETENTION, &options).await?;
        narrow(
            &catalog::LOG_RETENTION,
            Verb::Get,
            envelope,
            SettingRecord::into_log_retention,
        )
    }

    /// # Errors
    ///
    /// See [`ZoneSettingsClient::update`].
    pub async fn update_log_retention(
        &self,
        scope: &ResourceScope,
        flag: bool,
    ) -> Result<Envelope<LogRetentionResult>, OperationError> {
        let options = CallOptions::new().scope(scope.clone());
        let value = SettingValue::from(flag);
        let envelope = self
            .update(&catalog::LOG_RETENTION, Some(&value), &options)
            .await?;
        narrow(
            &catalog::LOG_RETENTION,
            Verb::Update,
            envelope,
            SettingRecord::into_log_retention,
        )
    }

    /// # Errors
    ///
    /// See [`ZoneSettingsClient::get`].
    pub async fn cname_flattening(
        &self,
    ) -> Result<Envelope<CnameFlatteningResult>, OperationError> {
        let envelope = self
            .get(&catalog::CNAME_FLATTENING, &CallOptions::default())
            .await?;
        narrow(
            &catalog::CNAME_FLATTENING,
            Verb::Get,
            envelope,
            SettingRecord::into_cname_flattening,
        )
    }

    /// # Errors
    ///
    /// See [`ZoneSettingsClient::update`].
    pub async fn update_cname_flattening(
        &self,
        mode: CnameFlatteningMode,
    ) -> Result<Envelope<CnameFlatteningResult>, OperationError> {
        let value = SettingValue::from(mode);
        let options = CallOptions::default();
        let envelope = self
            .update(&catalog::CNAME_FLATTENING, Some(&value), &options)
            .await?;
        narrow(
            &catalog::CNAME_FLATTENING,
            Verb::Update,
            envelope,
            SettingRecord::into_cname_flattening,
        )
    }

    async fn execute(
        &self,
        setting: &SettingDescriptor,
        verb: Verb,
        value: Option<&SettingValue>,
        options: &CallOptions,
    ) -> Result<Envelope<SettingRecord>, OperationError> {
        let operation = setting.operation_name(verb);
        let result = self.run(&operation, setting, verb, value, options).await;
        if let Err(err) = &result {
            tracing::debug!(
                operation = %operation,
                stage = %err.stage(),
                error = %err.cause(),
                "zone settings operation failed"
            );
        }
        result
    }

    async fn run(
        &self,
        operation: &str,
        setting: &SettingDescriptor,
        verb: Verb,
        value: Option<&SettingValue>,
        options: &CallOptions,
    ) -> Result<Envelope<SettingRecord>, OperationError> {
        let scope = self
            .scope_for(setting, options)
            .map_err(|e| classify(Stage::Validation, operation, e))?;

        let path = resolve_path(setting.path_template, &scope.path_params())
            .map_err(|e| classify(e.stage(), operation, e))?;

        let body = match verb {
            Verb::Get => None,
            Verb::Update => encode_body(setting.body_key, setting.value_shape, value)
                .map_err(|e| classify(Stage::Encode, operation, e))?,
        };

        let request = assemble(RequestParts {
            method: setting.method(verb).as_http(),
            base_url: &self.base_url,
            path: &path,
            operation,
            user_agent: &self.user_agent,
            default_headers: &self.default_headers,
            call_headers: options.headers(),
            body,
        })
        .map_err(|e| classify(Stage::Validation, operation, e))?;

        tracing::debug!(
            operation,
            method = %request.method,
            url = %request.url,
            "sending zone settings request"
        );

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| classify(Stage::Transport, operation, e))?;

        tracing::debug!(operation, status = %response.status, "received zone settings response");

        decode_envelope(response.status, &response.body, |json| {
            SettingRecord::decode(setting.result_kind, setting.value_shape, json)
        })
        .map_err(|e| classify(e.stage(), operation, e))
    }

    fn scope_for<'a>(
        &'a self,
        setting: &SettingDescriptor,
        options: &'a CallOptions,
    ) -> Result<&'a ResourceScope, ScopeError> {
        match (setting.scope, options.resource_scope()) {
            (ScopeBinding::Client, None) => Ok(&self.scope),
            (ScopeBinding::Client, Some(_)) => Err(ScopeError::PerCallNotAccepted {
                setting: setting.name,
            }),
            (ScopeBinding::PerCall, Some(scope)) => Ok(scope),
            (ScopeBinding::PerCall, None) => Err(ScopeError::PerCallRequired {
                setting: setting.name,
            }),
        }
    }
}

/// Narrows a generic envelope to the result variant a typed helper expects.
fn narrow<T>(
    setting: &SettingDescriptor,
    verb: Verb,
    envelope: Envelope<SettingRecord>,
    pick: fn(SettingRecord) -> Option<T>,
) -> Result<Envelope<T>, OperationError> {
    envelope.try_map(|record| {
        let kind = record.kind();
        pick(record).ok_or_else(|| {
            classify(
                Stage::Decode,
                &setting.operation_name(verb),
                format!("unexpected result variant {}", kind.as_str()),
            )
        })
    })
}

/// Builder for [`ZoneSettingsClient`].
///
/// Invalid input is captured and reported by [`build`](Self::build).
#[derive(Default)]
pub struct ZoneSettingsClientBuilder {
    base_url: Option<String>,
    scope: Option<ResourceScope>,
    default_headers: HeaderMap,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    error: Option<ClientBuildError>,
}

impl ZoneSettingsClientBuilder {
    /// Base URL of the API. Resolved paths are appended to it unchanged.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: ResourceScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Same as [`scope`](Self::scope), from raw identifiers.
    #[must_use]
    pub fn scope_ids(mut self, crn: impl Into<String>, zone_identifier: impl Into<String>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match ResourceScope::new(crn, zone_identifier) {
            Ok(scope) => self.scope = Some(scope),
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Header sent with every request. Per-call headers of the same name win.
    #[must_use]
    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.default_headers.append(name, value);
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// # Errors
    ///
    /// Returns the first error captured while building, or a
    /// [`ClientBuildError`] for missing or invalid parts.
    pub fn build(self) -> Result<ZoneSettingsClient, ClientBuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let raw_url = self.base_url.ok_or(ClientBuildError::MissingBaseUrl)?;
        let base_url = parse_base_url(&raw_url)?;
        let scope = self.scope.ok_or(ClientBuildError::MissingScope)?;
        let transport = self.transport.ok_or(ClientBuildError::MissingTransport)?;
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());
        parse_header(http::header::USER_AGENT.as_str(), &user_agent)?;

        Ok(ZoneSettingsClient {
            base_url,
            scope,
            default_headers: self.default_headers,
            user_agent,
            transport,
        })
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ClientBuildError> {
    let invalid = |reason: String| ClientBuildError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host".to_owned()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_owned()));
    }
    Ok(url)
}
