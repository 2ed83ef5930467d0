//! The fixed catalog of zone settings.
//!
//! Every entry is a [`SettingDescriptor`]; the client reads and updates any of
//! them through the same pipeline. Most settings live under
//! `/v1/{crn}/zones/{zone_identifier}/settings/<name>` and use GET/PATCH with a
//! `value` body key. The exceptions are spelled out on the entries themselves.

use std::fmt;

use crate::descriptor::{HttpMethod, ResultKind, SettingDescriptor};
use crate::value::{Field, SettingValue, ValueShape};

macro_rules! settings_path {
    ($name:literal) => {
        concat!("/v1/{crn}/zones/{zone_identifier}/settings/", $name)
    };
}

macro_rules! zone_setting {
    ($(#[$meta:meta])* $ident:ident, $name:literal, $shape:expr) => {
        $(#[$meta])*
        pub static $ident: SettingDescriptor =
            SettingDescriptor::new($name, settings_path!($name), $shape);
    };
}

const CHALLENGE_TTLS: &[i64] = &[
    300, 900, 1800, 2700, 3600, 7200, 10_800, 14_400, 28_800, 57_600, 86_400, 604_800, 2_592_000,
    31_536_000,
];

const MAX_UPLOAD_MB: &[i64] = &[
    100, 125, 150, 175, 200, 225, 250, 275, 300, 325, 350, 375, 400, 425, 450, 475, 500,
];

pub const CIPHERS: &[&str] = &[
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-ECDSA-AES128-SHA256",
    "ECDHE-ECDSA-AES128-SHA",
    "ECDHE-RSA-AES128-SHA256",
    "ECDHE-RSA-AES128-SHA",
    "AES128-GCM-SHA256",
    "AES128-SHA256",
    "AES128-SHA",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-AES256-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-SHA384",
    "ECDHE-RSA-AES256-SHA",
    "AES256-GCM-SHA384",
    "AES256-SHA256",
    "AES256-SHA",
    "DES-CBC3-SHA",
];

const MINIFY_FIELDS: &[Field] = &[
    Field::required("css", ValueShape::OffOn),
    Field::required("html", ValueShape::OffOn),
    Field::required("js", ValueShape::OffOn),
];

const STRICT_TRANSPORT_SECURITY_FIELDS: &[Field] = &[
    Field::required("enabled", ValueShape::Boolean),
    Field::required("max_age", ValueShape::Integer(&[])),
    Field::required("include_subdomains", ValueShape::Boolean),
    Field::required("nosniff", ValueShape::Boolean),
];

const SECURITY_HEADER_FIELDS: &[Field] = &[Field::required(
    "strict_transport_security",
    ValueShape::Record(STRICT_TRANSPORT_SECURITY_FIELDS),
)];

const MOBILE_REDIRECT_FIELDS: &[Field] = &[
    Field::required("status", ValueShape::OffOn),
    Field::optional("mobile_subdomain", ValueShape::Text),
    Field::required("strip_uri", ValueShape::Boolean),
];

/// DNSSEC status. Lives outside the `settings/` prefix, sends `status`, and
/// takes its scope per call.
pub static DNSSEC: SettingDescriptor = SettingDescriptor::new(
    "dnssec",
    "/v1/{crn}/zones/{zone_identifier}/dnssec",
    ValueShape::StringEnum(&["active", "disabled"]),
)
.with_body_key("status")
.with_result(ResultKind::Dnssec)
.per_call_scope();

pub static CNAME_FLATTENING: SettingDescriptor = SettingDescriptor::new(
    "cname_flattening",
    settings_path!("cname_flattening"),
    ValueShape::StringEnum(&["flatten_at_root", "flatten_all", "flatten_none"]),
)
.with_result(ResultKind::CnameFlattening);

zone_setting!(
    OPPORTUNISTIC_ENCRYPTION,
    "opportunistic_encryption",
    ValueShape::OffOn
);
zone_setting!(
    /// Seconds a visitor keeps a passed challenge.
    CHALLENGE_TTL,
    "challenge_ttl",
    ValueShape::Integer(CHALLENGE_TTLS)
);
zone_setting!(
    AUTOMATIC_HTTPS_REWRITES,
    "automatic_https_rewrites",
    ValueShape::OffOn
);
zone_setting!(
    TRUE_CLIENT_IP_HEADER,
    "true_client_ip_header",
    ValueShape::OffOn
);
zone_setting!(ALWAYS_USE_HTTPS, "always_use_https", ValueShape::OffOn);
zone_setting!(
    IMAGE_SIZE_OPTIMIZATION,
    "image_size_optimization",
    ValueShape::StringEnum(&["off", "lossless", "lossy"])
);
zone_setting!(
    SCRIPT_LOAD_OPTIMIZATION,
    "script_load_optimization",
    ValueShape::OffOn
);
zone_setting!(
    IMAGE_LOAD_OPTIMIZATION,
    "image_load_optimization",
    ValueShape::OffOn
);
zone_setting!(MINIFY, "minify", ValueShape::Record(MINIFY_FIELDS));
zone_setting!(
    MIN_TLS_VERSION,
    "min_tls_version",
    ValueShape::StringEnum(&["1.0", "1.1", "1.2", "1.3"])
);
zone_setting!(IP_GEOLOCATION, "ip_geolocation", ValueShape::OffOn);
zone_setting!(
    SERVER_SIDE_EXCLUDE,
    "server_side_exclude",
    ValueShape::OffOn
);
zone_setting!(
    /// HSTS configuration, nested one level under `strict_transport_security`.
    SECURITY_HEADER,
    "security_header",
    ValueShape::Record(SECURITY_HEADER_FIELDS)
);
zone_setting!(
    MOBILE_REDIRECT,
    "mobile_redirect",
    ValueShape::Record(MOBILE_REDIRECT_FIELDS)
);
zone_setting!(PREFETCH_PRELOAD, "prefetch_preload", ValueShape::OffOn);
zone_setting!(HTTP2, "http2", ValueShape::OffOn);
zone_setting!(HTTP3, "http3", ValueShape::OffOn);
zone_setting!(IPV6, "ipv6", ValueShape::OffOn);
zone_setting!(WEBSOCKETS, "websockets", ValueShape::OffOn);
zone_setting!(
    PSEUDO_IPV4,
    "pseudo_ipv4",
    ValueShape::StringEnum(&["off", "add_header", "overwrite_header"])
);
zone_setting!(RESPONSE_BUFFERING, "response_buffering", ValueShape::OffOn);
zone_setting!(HOTLINK_PROTECTION, "hotlink_protection", ValueShape::OffOn);
zone_setting!(
    /// Maximum upload size in megabytes.
    MAX_UPLOAD,
    "max_upload",
    ValueShape::Integer(MAX_UPLOAD_MB)
);
zone_setting!(TLS_CLIENT_AUTH, "tls_client_auth", ValueShape::OffOn);
zone_setting!(BROWSER_CHECK, "browser_check", ValueShape::OffOn);
zone_setting!(
    ORIGIN_ERROR_PAGE_PASS_THRU,
    "origin_error_page_pass_thru",
    ValueShape::OffOn
);
zone_setting!(WAF, "waf", ValueShape::OffOn);
zone_setting!(CIPHERS_SETTING, "ciphers", ValueShape::StringList(CIPHERS));
zone_setting!(
    ORIGIN_MAX_HTTP_VERSION,
    "origin_max_http_version",
    ValueShape::StringEnum(&["1", "2"])
);
zone_setting!(
    OPPORTUNISTIC_ONION,
    "opportunistic_onion",
    ValueShape::OffOn
);
zone_setting!(
    /// Seconds to wait for an origin response.
    PROXY_READ_TIMEOUT,
    "proxy_read_timeout",
    ValueShape::Float
);
zone_setting!(EMAIL_OBFUSCATION, "email_obfuscation", ValueShape::OffOn);
zone_setting!(
    REPLACE_INSECURE_JS,
    "replace_insecure_js",
    ValueShape::OffOn
);

/// Lives under `cache/` and is updated with PUT.
pub static ORIGIN_POST_QUANTUM_ENCRYPTION: SettingDescriptor = SettingDescriptor::new(
    "origin_post_quantum_encryption",
    "/v1/{crn}/zones/{zone_identifier}/cache/origin_post_quantum_encryption",
    ValueShape::StringEnum(&["preferred", "supported", "off"]),
)
.with_update_method(HttpMethod::Put);

/// Log retention flag under `logs/`. Updated with POST, sends `flag`, scope
/// per call.
pub static LOG_RETENTION: SettingDescriptor = SettingDescriptor::new(
    "log_retention",
    "/v1/{crn}/zones/{zone_identifier}/logs/retention",
    ValueShape::Boolean,
)
.with_update_method(HttpMethod::Post)
.with_body_key("flag")
.with_result(ResultKind::LogRetention)
.per_call_scope();

/// Every catalog entry, in a stable order.
pub static ALL: [&SettingDescriptor; 37] = [
    &DNSSEC,
    &CNAME_FLATTENING,
    &OPPORTUNISTIC_ENCRYPTION,
    &CHALLENGE_TTL,
    &AUTOMATIC_HTTPS_REWRITES,
    &TRUE_CLIENT_IP_HEADER,
    &ALWAYS_USE_HTTPS,
    &IMAGE_SIZE_OPTIMIZATION,
    &SCRIPT_LOAD_OPTIMIZATION,
    &IMAGE_LOAD_OPTIMIZATION,
    &MINIFY,
    &MIN_TLS_VERSION,
    &IP_GEOLOCATION,
    &SERVER_SIDE_EXCLUDE,
    &SECURITY_HEADER,
    &MOBILE_REDIRECT,
    &PREFETCH_PRELOAD,
    &HTTP2,
    &HTTP3,
    &IPV6,
    &WEBSOCKETS,
    &PSEUDO_IPV4,
    &RESPONSE_BUFFERING,
    &HOTLINK_PROTECTION,
    &MAX_UPLOAD,
    &TLS_CLIENT_AUTH,
    &BROWSER_CHECK,
    &ORIGIN_ERROR_PAGE_PASS_THRU,
    &WAF,
    &CIPHERS_SETTING,
    &ORIGIN_MAX_HTTP_VERSION,
    &OPPORTUNISTIC_ONION,
    &PROXY_READ_TIMEOUT,
    &EMAIL_OBFUSCATION,
    &REPLACE_INSECURE_JS,
    &ORIGIN_POST_QUANTUM_ENCRYPTION,
    &LOG_RETENTION,
];

/// Target state of [`DNSSEC`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnssecStatus {
    Active,
    Disabled,
}

impl DnssecStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DnssecStatus::Active => "active",
            DnssecStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for DnssecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DnssecStatus> for SettingValue {
    fn from(status: DnssecStatus) -> Self {
        SettingValue::Text(status.as_str().to_owned())
    }
}

/// Values of [`CNAME_FLATTENING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CnameFlatteningMode {
    FlattenAtRoot,
    FlattenAll,
    FlattenNone,
}

impl CnameFlatteningMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CnameFlatteningMode::FlattenAtRoot => "flatten_at_root",
            CnameFlatteningMode::FlattenAll => "flatten_all",
            CnameFlatteningMode::FlattenNone => "flatten_none",
        }
    }
}

impl fmt::Display for CnameFlatteningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CnameFlatteningMode> for SettingValue {
    fn from(mode: CnameFlatteningMode) -> Self {
        SettingValue::Text(mode.as_str().to_owned())
    }
}

/// Looks up a catalog entry by setting name.
#[must_use]
pub fn find(name: &str) -> Option<&'static SettingDescriptor> {
    ALL.iter().copied().find(|d| d.name == name)
}
