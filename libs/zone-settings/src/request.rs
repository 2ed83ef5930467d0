//! Request assembly.
//!
//! Header precedence, lowest to highest: protocol headers (`accept`,
//! `content-type`, `user-agent`, the operation marker), client default
//! headers, per-call headers. A header name set by a higher layer replaces
//! every value set for it below; repeated names within one layer are kept.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

/// Header naming the logical operation, e.g. `get_minify`.
pub const OPERATION_HEADER: &str = "x-sdk-operation";

/// Default `user-agent` value.
pub const DEFAULT_USER_AGENT: &str = concat!("cf-zone-settings/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// A fully assembled request, ready for a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RequestError {
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),
    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),
}

/// Parses a raw `(name, value)` pair into typed header parts.
///
/// # Errors
///
/// Returns [`RequestError`] if the name or value is not a legal HTTP header.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), RequestError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RequestError::InvalidHeaderName(name.to_owned()))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| RequestError::InvalidHeaderValue(name.to_owned()))?;
    Ok((header_name, header_value))
}

/// Inputs of [`assemble`].
#[derive(Debug)]
pub struct RequestParts<'a> {
    pub method: Method,
    pub base_url: &'a Url,
    /// Resolved path, appended to `base_url` unchanged.
    pub path: &'a str,
    pub operation: &'a str,
    pub user_agent: &'a str,
    pub default_headers: &'a HeaderMap,
    /// Per-call headers, not yet validated.
    pub call_headers: &'a [(String, String)],
    pub body: Option<Bytes>,
}

/// Builds the request descriptor.
///
/// `content-type` is set only when there is a body.
///
/// # Errors
///
/// Returns [`RequestError`] if a per-call header is not a legal HTTP header.
pub fn assemble(parts: RequestParts<'_>) -> Result<RequestDescriptor, RequestError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON));
    if parts.body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    }
    let (name, value) = parse_header(USER_AGENT.as_str(), parts.user_agent)?;
    headers.insert(name, value);
    let (name, value) = parse_header(OPERATION_HEADER, parts.operation)?;
    headers.insert(name, value);

    overlay(
        &mut headers,
        parts.default_headers.iter().map(|(n, v)| (n.clone(), v.clone())),
    );

    let call_headers = parts
        .call_headers
        .iter()
        .map(|(n, v)| parse_header(n, v))
        .collect::<Result<Vec<_>, _>>()?;
    overlay(&mut headers, call_headers);

    Ok(RequestDescriptor {
        method: parts.method,
        url: join_url(parts.base_url, parts.path),
        headers,
        body: parts.body,
    })
}

/// Applies one precedence layer on top of `headers`.
fn overlay(headers: &mut HeaderMap, layer: impl IntoIterator<Item = (HeaderName, HeaderValue)>) {
    let mut replaced: Vec<HeaderName> = Vec::new();
    for (name, value) in layer {
        if replaced.contains(&name) {
            headers.append(name, value);
        } else {
            headers.insert(name.clone(), value);
            replaced.push(name);
        }
    }
}

fn join_url(base: &Url, path: &str) -> String {
    format!("{}{path}", base.as_str().trim_end_matches('/'))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn parts<'a>(
        base: &'a Url,
        defaults: &'a HeaderMap,
        call: &'a [(String, String)],
        body: Option<Bytes>,
    ) -> RequestParts<'a> {
        RequestParts {
            method: Method::PATCH,
            base_url: base,
            path: "/v1/c/zones/z/settings/minify",
            operation: "update_minify",
            user_agent: DEFAULT_USER_AGENT,
            default_headers: defaults,
            call_headers: call,
            body,
        }
    }

    fn base() -> Url {
        Url::parse("https://api.example.com").unwrap()
    }

    #[test]
    fn sets_protocol_headers() {
        let base = base();
        let defaults = HeaderMap::new();
        let body = Some(Bytes::from_static(b"{}"));
        let req = assemble(parts(&base, &defaults, &[], body)).unwrap();
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(
            req.url,
            "https://api.example.com/v1/c/zones/z/settings/minify"
        );
        assert_eq!(req.headers[ACCEPT], JSON);
        assert_eq!(req.headers[CONTENT_TYPE], JSON);
        assert_eq!(req.headers[OPERATION_HEADER], "update_minify");
        assert!(
            req.headers[USER_AGENT]
                .to_str()
                .unwrap()
                .starts_with("cf-zone-settings/")
        );
    }

    #[test]
    fn no_content_type_without_body() {
        let base = base();
        let defaults = HeaderMap::new();
        let req = assemble(parts(&base, &defaults, &[], None)).unwrap();
        assert!(req.headers.get(CONTENT_TYPE).is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn per_call_headers_win_over_defaults() {
        let base = base();
        let mut defaults = HeaderMap::new();
        defaults.insert("x-correlation-id", HeaderValue::from_static("default"));
        defaults.insert("x-tenant", HeaderValue::from_static("t1"));
        let call = vec![
            ("X-Correlation-ID".to_owned(), "call".to_owned()),
            ("accept".to_owned(), "application/vnd.custom+json".to_owned()),
        ];
        let req = assemble(parts(&base, &defaults, &call, None)).unwrap();
        assert_eq!(req.headers["x-correlation-id"], "call");
        assert_eq!(req.headers.get_all("x-correlation-id").iter().count(), 1);
        assert_eq!(req.headers["x-tenant"], "t1");
        assert_eq!(req.headers[ACCEPT], "application/vnd.custom+json");
    }

    #[test]
    fn repeated_names_in_one_layer_are_kept() {
        let base = base();
        let defaults = HeaderMap::new();
        let call = vec![
            ("x-trace".to_owned(), "a".to_owned()),
            ("x-trace".to_owned(), "b".to_owned()),
        ];
        let req = assemble(parts(&base, &defaults, &call, None)).unwrap();
        let values: Vec<_> = req.headers.get_all("x-trace").iter().collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn invalid_call_header_is_rejected() {
        let base = base();
        let defaults = HeaderMap::new();
        let bad_name = vec![("bad header".to_owned(), "v".to_owned())];
        assert_eq!(
            assemble(parts(&base, &defaults, &bad_name, None)).unwrap_err(),
            RequestError::InvalidHeaderName("bad header".into())
        );
        let bad_value = vec![("x-ok".to_owned(), "line\nbreak".to_owned())];
        assert_eq!(
            assemble(parts(&base, &defaults, &bad_value, None)).unwrap_err(),
            RequestError::InvalidHeaderValue("x-ok".into())
        );
    }

    #[test]
    fn base_url_with_prefix_keeps_it() {
        let base = Url::parse("http://localhost:8080/api/").unwrap();
        let defaults = HeaderMap::new();
        let req = assemble(parts(&base, &defaults, &[], None)).unwrap();
        assert_eq!(
            req.url,
            "http://localhost:8080/api/v1/c/zones/z/settings/minify"
        );
    }
}
