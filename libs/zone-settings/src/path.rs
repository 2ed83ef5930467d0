//! Path template resolution.
//!
//! Templates use `{name}` placeholders, e.g.
//! `/v1/{crn}/zones/{zone_identifier}/settings/minify`. Values are opaque:
//! they are percent-encoded as a single path segment, so an identifier
//! containing `/`, `?` or `#` can never introduce extra segments or a query
//! string. Characters legal inside a segment (`:`, `@`, sub-delims) are kept.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;

use crate::error::Stage;

/// Bytes outside RFC 3986 `pchar`, plus `%` itself. Non-ASCII is always encoded.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PathError {
    /// A placeholder in the template has no value in the parameter set.
    #[error("missing value for path parameter '{0}'")]
    MissingParameter(String),

    /// A placeholder has a value, but it is empty.
    #[error("path parameter '{0}' must not be empty")]
    EmptyParameter(String),

    /// The template itself is not well formed.
    #[error("malformed path template '{template}': {reason}")]
    MalformedTemplate {
        template: String,
        reason: &'static str,
    },
}

impl PathError {
    /// Stage this error is reported under.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            PathError::MissingParameter(_) | PathError::EmptyParameter(_) => Stage::Validation,
            PathError::MalformedTemplate { .. } => Stage::UrlResolution,
        }
    }
}

/// Substitutes every placeholder in `template` with its percent-encoded value.
///
/// Parameters not referenced by the template are ignored. When a name occurs
/// more than once in `params`, the first occurrence wins.
///
/// # Errors
///
/// - [`PathError::MissingParameter`] / [`PathError::EmptyParameter`] when a
///   placeholder has no usable value.
/// - [`PathError::MalformedTemplate`] for unbalanced braces or empty names.
pub fn resolve_path(template: &str, params: &[(&str, &str)]) -> Result<String, PathError> {
    let mut resolved = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        let (literal, tail) = rest.split_at(pos);
        resolved.push_str(literal);

        let (name, after) = split_placeholder(template, tail)?;
        let value = lookup(params, name)?;
        push_segment(&mut resolved, value);
        rest = after;
    }
    resolved.push_str(rest);

    Ok(resolved)
}

/// Lists placeholder names in template order.
///
/// # Errors
///
/// Returns [`PathError::MalformedTemplate`] for unbalanced braces or empty names.
pub fn placeholders(template: &str) -> Result<Vec<&str>, PathError> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        let (name, after) = split_placeholder(template, &rest[pos..])?;
        names.push(name);
        rest = after;
    }

    Ok(names)
}

/// `tail` starts at a brace. Returns the placeholder name and the remainder.
fn split_placeholder<'a>(template: &str, tail: &'a str) -> Result<(&'a str, &'a str), PathError> {
    if tail.starts_with('}') {
        return Err(malformed(template, "unmatched '}'"));
    }
    let Some(close) = tail.find('}') else {
        return Err(malformed(template, "unclosed '{'"));
    };
    let name = &tail[1..close];
    if name.is_empty() {
        return Err(malformed(template, "empty placeholder name"));
    }
    if name.contains('{') {
        return Err(malformed(template, "nested '{'"));
    }
    Ok((name, &tail[close + 1..]))
}

fn lookup<'p>(params: &[(&str, &'p str)], name: &str) -> Result<&'p str, PathError> {
    let value = params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| PathError::MissingParameter(name.to_owned()))?;
    if value.is_empty() {
        return Err(PathError::EmptyParameter(name.to_owned()));
    }
    Ok(value)
}

/// Appends `value` as one path segment. A bare `.` or `..` is escaped.
fn push_segment(out: &mut String, value: &str) {
    match value {
        "." => out.push_str("%2E"),
        ".." => out.push_str("%2E%2E"),
        _ => out.extend(utf8_percent_encode(value, SEGMENT)),
    }
}

fn malformed(template: &str, reason: &'static str) -> PathError {
    PathError::MalformedTemplate {
        template: template.to_owned(),
        reason,
    }
}
