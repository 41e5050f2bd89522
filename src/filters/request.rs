//! Request descriptor handed to filters

use hyper::header::COOKIE;
use hyper::HeaderMap;

/// Everything a filter may inspect about one (possibly re-dispatched) request
#[derive(Debug, Clone)]
pub struct FilterRequest {
    /// Mount prefix the request matched, without trailing slash ("" for `/`)
    pub script_name: String,
    /// URL-decoded path relative to the mount, always starting with `/`
    pub path: String,
    /// Raw query string, empty when absent
    pub query: String,
    pub headers: HeaderMap,
    pub scheme: String,
    /// Host name without port
    pub server_name: String,
    /// Host-owned delegation counter; read-only here
    pub remaining_delegations: u32,
}

impl FilterRequest {
    /// Combined cookie header value, multiple headers joined with `"; "`
    pub fn cookie(&self) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join("; "))
        }
    }

    /// Canonical self-link header value for this resource
    pub fn self_link(&self) -> String {
        format!(
            "<{}://{}{}>; rel=\"self\"",
            self.scheme, self.server_name, self.path
        )
    }
}

#[cfg(test)]
pub mod test_support {
    use super::FilterRequest;
    use hyper::header::{HeaderValue, COOKIE};
    use hyper::HeaderMap;

    /// Root-mounted request on example.com at the given path
    pub fn request(path: &str) -> FilterRequest {
        FilterRequest {
            script_name: String::new(),
            path: path.to_string(),
            query: String::new(),
            headers: HeaderMap::new(),
            scheme: "https".to_string(),
            server_name: "example.com".to_string(),
            remaining_delegations: 4,
        }
    }

    pub fn with_query(mut req: FilterRequest, query: &str) -> FilterRequest {
        req.query = query.to_string();
        req
    }

    pub fn with_cookie(mut req: FilterRequest, cookie: &str) -> FilterRequest {
        req.headers
            .append(COOKIE, HeaderValue::from_str(cookie).unwrap());
        req
    }

    pub const fn with_delegations(mut req: FilterRequest, remaining: u32) -> FilterRequest {
        req.remaining_delegations = remaining;
        req
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[test]
    fn test_cookie_absent() {
        assert_eq!(request("/").cookie(), None);
    }

    #[test]
    fn test_multiple_cookie_headers_are_joined() {
        let req = with_cookie(with_cookie(request("/"), "a=1"), "wheeeee=C");
        assert_eq!(req.cookie().as_deref(), Some("a=1; wheeeee=C"));
    }

    #[test]
    fn test_self_link() {
        assert_eq!(
            request("/foo/").self_link(),
            "<https://example.com/foo/>; rel=\"self\""
        );
    }
}
