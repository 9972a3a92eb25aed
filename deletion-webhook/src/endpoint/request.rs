//! Normalized inbound request handed to the endpoint by the hosting layer.

use std::collections::HashMap;

/// Query parameter carrying the marketplace challenge.
pub const CHALLENGE_CODE_PARAM: &str = "challenge_code";

/// Query parameter carrying the optional verification token.
pub const VERIFICATION_TOKEN_PARAM: &str = "verification_token";

/// Request method, reduced to the two the endpoint understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    /// GET: verification challenge or health check
    Read,
    /// POST: deletion notification
    Write,
    /// Anything else, keeping the method name for diagnostics
    Other(String),
}

impl RequestMethod {
    /// Map an HTTP method name onto a request method.
    pub fn from_http(method: &str) -> Self {
        match method {
            "GET" => RequestMethod::Read,
            "POST" => RequestMethod::Write,
            other => RequestMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestMethod::Read => "GET",
            RequestMethod::Write => "POST",
            RequestMethod::Other(name) => name,
        }
    }
}

/// Request headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header. Names keep their original casing.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Why the hosting layer could not hand over the body as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRejection {
    /// The body bytes are not valid UTF-8.
    InvalidUtf8,
    /// The body could not be read, or exceeded the size limit.
    Unreadable,
}

/// A request as seen by the endpoint: method, query, headers, raw body.
///
/// `body_rejection` is set when the body arrived but could not be turned
/// into text. Only the notification path looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: RequestMethod,
    pub query: HashMap<String, String>,
    pub headers: Headers,
    pub body: Option<String>,
    pub body_rejection: Option<BodyRejection>,
}

impl InboundRequest {
    pub fn new(method: RequestMethod) -> Self {
        Self {
            method,
            query: HashMap::new(),
            headers: Headers::new(),
            body: None,
            body_rejection: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_body_rejection(mut self, rejection: BodyRejection) -> Self {
        self.body = None;
        self.body_rejection = Some(rejection);
        self
    }

    /// Query parameter value, if present.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The `Host` header, verbatim.
    pub fn host(&self) -> Option<&str> {
        self.headers.get("host")
    }
}
