//! Client configuration, optionally populated from environment variables.

use std::time::Duration;

use crate::error::DkgError;
use crate::http::DEFAULT_TIMEOUT;
use crate::uri::{ConnectionTarget, Scheme, DEFAULT_HOST, DEFAULT_PORT};

/// Connection settings shared by every request a client issues.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `DKG_SCHEME` | `http` | `http` or `https` |
/// | `DKG_HOST` | `localhost` | Node host name or address |
/// | `DKG_PORT` | `8900` | Node API port |
/// | `DKG_TIMEOUT_SECS` | `10` | Connect and per-request timeout |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub target: ConnectionTarget,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: ConnectionTarget::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(target: ConnectionTarget) -> Self {
        Self {
            target,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the variables in the table above, applying defaults where absent.
    pub fn from_env() -> Result<Self, DkgError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DkgError> {
        let scheme: Scheme = match lookup("DKG_SCHEME") {
            Some(value) => value.parse()?,
            None => Scheme::default(),
        };
        let host = lookup("DKG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("DKG_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|e| DkgError::Validation(format!("DKG_PORT must be a TCP port: {e}")))?,
            None => DEFAULT_PORT,
        };
        let timeout = match lookup("DKG_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| DkgError::Validation(format!("DKG_TIMEOUT_SECS must be whole seconds: {e}")))?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            target: ConnectionTarget::new(scheme, host, port),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.target.to_string(), "http://localhost:8900");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("DKG_SCHEME", "https"),
            ("DKG_HOST", "node.example.com"),
            ("DKG_PORT", "443"),
            ("DKG_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.target, ConnectionTarget::new(Scheme::Https, "node.example.com", 443));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_port() {
        let err = ClientConfig::from_lookup(lookup(&[("DKG_PORT", "99999")])).unwrap_err();
        assert!(err.is_validation());
    }
}
