//! Filter decision types
//!
//! A filter either passes (optionally annotating the eventual response) or
//! terminates the request with a finished response.

use hyper::body::Bytes;
use hyper::StatusCode;

/// Header annotations carried by a pass decision
///
/// Names are lowercase; values are stored unencoded and converted into
/// header values only when the final response is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAnnotations(Vec<(&'static str, String)>);

impl HeaderAnnotations {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Single-header annotation set
    pub fn with(name: &'static str, value: impl Into<String>) -> Self {
        Self(vec![(name, value.into())])
    }

    pub fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    /// Append every annotation of `other`, keeping order
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(n, v)| (*n, v.as_str()))
    }
}

/// A finished response produced by a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalResponse {
    pub status: StatusCode,
    pub headers: HeaderAnnotations,
    pub body: Bytes,
}

impl TerminalResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderAnnotations::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: &'static str) -> Self {
        self.body = Bytes::from_static(body.as_bytes());
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Outcome of one filter for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Defer to the next stage; annotations are merged into the final response
    Pass(HeaderAnnotations),
    /// Stop the chain with this response
    Terminate(TerminalResponse),
}

impl Decision {
    /// Plain pass with nothing to merge
    pub const fn pass() -> Self {
        Self::Pass(HeaderAnnotations::new())
    }

    /// Short label used in debug logs
    pub fn describe(&self) -> String {
        match self {
            Self::Pass(headers) if headers.is_empty() => "pass".to_string(),
            Self::Pass(headers) => {
                let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
                format!("pass +[{}]", names.join(", "))
            }
            Self::Terminate(resp) => format!("terminate {}", resp.status.as_u16()),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Pass(_) => None,
            Self::Terminate(resp) => Some(resp.status.as_u16()),
        }
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        match self {
            Self::Pass(headers) => headers.get(name),
            Self::Terminate(resp) => resp.header_value(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_lookup_is_case_insensitive() {
        let headers = HeaderAnnotations::with("cache-control", "no-store");
        assert_eq!(headers.get("Cache-Control"), Some("no-store"));
        assert_eq!(headers.get("link"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Decision::pass().describe(), "pass");
        let annotated = Decision::Pass(HeaderAnnotations::with("link", "<x>"));
        assert_eq!(annotated.describe(), "pass +[link]");
        let gone = Decision::Terminate(TerminalResponse::new(StatusCode::GONE).body("Gone"));
        assert_eq!(gone.describe(), "terminate 410");
    }
}
