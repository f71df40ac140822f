//! Connection target and request URL assembly.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::DkgError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = DkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(DkgError::Uri(format!("unsupported scheme: {other}"))),
        }
    }
}

/// Where the node lives. Shared read-only by every request a client builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Default for ConnectionTarget {
    fn default() -> Self {
        Self::new(Scheme::Http, DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ConnectionTarget {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(Scheme::Http, host, port)
    }

    /// Parse `scheme://host[:port]`. A missing port falls back to the node
    /// default rather than the scheme's well-known port.
    pub fn parse(input: &str) -> Result<Self, DkgError> {
        let url = Url::parse(input).map_err(|e| DkgError::Uri(format!("{input}: {e}")))?;
        let scheme = url.scheme().parse()?;
        let host = url
            .host_str()
            .ok_or_else(|| DkgError::Uri(format!("{input}: missing host")))?;
        // `Url` drops the port when it equals the scheme default.
        let port = match url.port() {
            Some(port) => port,
            None if has_explicit_port(input) => url.port_or_known_default().unwrap_or(DEFAULT_PORT),
            None => DEFAULT_PORT,
        };
        Ok(Self::new(scheme, host, port))
    }

    /// Absolute URL for `segments` joined under the root, plus query pairs.
    ///
    /// Each segment is appended as-is (percent-encoded where needed); blank
    /// query values are skipped and repeated keys are kept in order.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<String, DkgError> {
        let base = format!("{}://{}:{}/", self.scheme.as_str(), self.host, self.port);
        let mut url = Url::parse(&base).map_err(|e| DkgError::Uri(format!("{base}: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| DkgError::Uri(format!("{base}: cannot append path")))?
            .pop_if_empty()
            .extend(segments);

        let params: Vec<_> = query.iter().filter(|(_, v)| !v.trim().is_empty()).collect();
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}

fn has_explicit_port(input: &str) -> bool {
    input
        .split_once("://")
        .map(|(_, rest)| rest.split('/').next().unwrap_or_default())
        .and_then(|authority| authority.rsplit_once(':'))
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ConnectionTarget {
        ConnectionTarget::http("localhost", 8900)
    }

    #[test]
    fn builds_path_without_query() {
        let url = target().url(&["info"], &[]).unwrap();
        assert_eq!(url, "http://localhost:8900/info");
    }

    #[test]
    fn keeps_colon_in_segment() {
        let url = target()
            .url(&["entities:search", "result", "abc"], &[])
            .unwrap();
        assert_eq!(url, "http://localhost:8900/entities:search/result/abc");
    }

    #[test]
    fn repeated_params_are_not_joined() {
        let query = vec![("ids", "abc123".to_string()), ("ids", "def456".to_string())];
        let url = target().url(&["resolve"], &query).unwrap();
        assert_eq!(url, "http://localhost:8900/resolve?ids=abc123&ids=def456");
    }

    #[test]
    fn blank_params_are_skipped() {
        let query = vec![("query", " ".to_string()), ("load", "true".to_string())];
        let url = target().url(&["assertions:search"], &query).unwrap();
        assert_eq!(url, "http://localhost:8900/assertions:search?load=true");
    }

    #[test]
    fn segment_slashes_are_escaped() {
        let url = target().url(&["publish", "result", "a/b"], &[]).unwrap();
        assert_eq!(url, "http://localhost:8900/publish/result/a%2Fb");
    }

    #[test]
    fn same_input_gives_same_url() {
        let query = vec![("query", "some thing".to_string()), ("limit", "5".to_string())];
        let a = target().url(&["entities:search"], &query).unwrap();
        let b = target().url(&["entities:search"], &query).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "http://localhost:8900/entities:search?query=some+thing&limit=5");
    }

    #[test]
    fn invalid_host_is_uri_error() {
        let err = ConnectionTarget::http("bad host", 80).url(&["info"], &[]).unwrap_err();
        assert!(matches!(err, DkgError::Uri(_)));
    }

    #[test]
    fn parse_target() {
        let t = ConnectionTarget::parse("https://node.example.com:8900").unwrap();
        assert_eq!(t, ConnectionTarget::new(Scheme::Https, "node.example.com", 8900));

        let t = ConnectionTarget::parse("http://10.0.0.5").unwrap();
        assert_eq!(t.port, DEFAULT_PORT);

        let t = ConnectionTarget::parse("http://10.0.0.5:80").unwrap();
        assert_eq!(t.port, 80);

        assert!(ConnectionTarget::parse("ftp://host:21").is_err());
        assert_eq!(target().to_string(), "http://localhost:8900");
    }
}
