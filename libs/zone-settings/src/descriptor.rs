use crate::value::ValueShape;

/// HTTP methods used by settings resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
}

impl HttpMethod {
    #[must_use]
    pub fn as_http(self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Put => http::Method::PUT,
        }
    }
}

/// Read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Update,
}

impl Verb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Update => "update",
        }
    }
}

/// Which result structure the `result` field of the envelope decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// `{id, value, editable, modified_on}`
    Standard,
    /// `{id, value, modified_on}`
    CnameFlattening,
    /// DNSSEC record.
    Dnssec,
    /// `{flag}`
    LogRetention,
}

impl ResultKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Standard => "standard",
            ResultKind::CnameFlattening => "cname_flattening",
            ResultKind::Dnssec => "dnssec",
            ResultKind::LogRetention => "log_retention",
        }
    }
}

/// Where the resource scope of a call comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeBinding {
    /// The scope bound to the client at construction.
    Client,
    /// A scope passed explicitly with every call.
    PerCall,
}

/// Static description of one settings resource.
///
/// Per-setting differences (method, path, body key, value shape, result
/// structure, scope source) are data here; the client has a single code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub path_template: &'static str,
    pub get_method: HttpMethod,
    pub update_method: HttpMethod,
    pub value_shape: ValueShape,
    /// JSON key carrying the value in update bodies.
    pub body_key: &'static str,
    pub result_kind: ResultKind,
    pub scope: ScopeBinding,
}

impl SettingDescriptor {
    /// A regular setting: GET to read, PATCH to update, `value` body key,
    /// standard result, client-bound scope.
    #[must_use]
    pub const fn new(name: &'static str, path_template: &'static str, shape: ValueShape) -> Self {
        Self {
            name,
            path_template,
            get_method: HttpMethod::Get,
            update_method: HttpMethod::Patch,
            value_shape: shape,
            body_key: "value",
            result_kind: ResultKind::Standard,
            scope: ScopeBinding::Client,
        }
    }

    #[must_use]
    pub const fn with_update_method(mut self, method: HttpMethod) -> Self {
        self.update_method = method;
        self
    }

    #[must_use]
    pub const fn with_body_key(mut self, key: &'static str) -> Self {
        self.body_key = key;
        self
    }

    #[must_use]
    pub const fn with_result(mut self, kind: ResultKind) -> Self {
        self.result_kind = kind;
        self
    }

    #[must_use]
    pub const fn per_call_scope(mut self) -> Self {
        self.scope = ScopeBinding::PerCall;
        self
    }

    #[must_use]
    pub fn method(&self, verb: Verb) -> HttpMethod {
        match verb {
            Verb::Get => self.get_method,
            Verb::Update => self.update_method,
        }
    }

    /// `get_<name>` or `update_<name>`.
    #[must_use]
    pub fn operation_name(&self, verb: Verb) -> String {
        format!("{}_{}", verb.as_str(), self.name)
    }
}
