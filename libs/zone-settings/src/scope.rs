use thiserror::Error;

/// Placeholder name for the top-level resource identifier.
pub const CRN_PARAM: &str = "crn";
/// Placeholder name for the zone identifier.
pub const ZONE_PARAM: &str = "zone_identifier";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ScopeError {
    #[error("crn must not be empty")]
    EmptyCrn,
    #[error("zone identifier must not be empty")]
    EmptyZone,
    #[error("setting '{setting}' requires a per-call scope")]
    PerCallRequired { setting: &'static str },
    #[error("setting '{setting}' uses the client scope and does not accept a per-call scope")]
    PerCallNotAccepted { setting: &'static str },
}

/// The pair of identifiers every setting operation is scoped to.
///
/// Both parts are opaque, non-empty strings. A scope never changes after
/// construction and is freely shared between concurrent calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceScope {
    crn: String,
    zone_identifier: String,
}

impl ResourceScope {
    /// # Errors
    ///
    /// Returns [`ScopeError`] if either identifier is empty or whitespace.
    pub fn new(
        crn: impl Into<String>,
        zone_identifier: impl Into<String>,
    ) -> Result<Self, ScopeError> {
        let crn = crn.into();
        let zone_identifier = zone_identifier.into();
        if crn.trim().is_empty() {
            return Err(ScopeError::EmptyCrn);
        }
        if zone_identifier.trim().is_empty() {
            return Err(ScopeError::EmptyZone);
        }
        Ok(Self {
            crn,
            zone_identifier,
        })
    }

    #[must_use]
    pub fn crn(&self) -> &str {
        &self.crn
    }

    #[must_use]
    pub fn zone_identifier(&self) -> &str {
        &self.zone_identifier
    }

    /// Parameter set for [`resolve_path`](crate::path::resolve_path).
    #[must_use]
    pub fn path_params(&self) -> [(&'static str, &str); 2] {
        [(CRN_PARAM, &self.crn), (ZONE_PARAM, &self.zone_identifier)]
    }
}
