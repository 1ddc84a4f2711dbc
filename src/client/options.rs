//! Connection target options.
//!
//! Describes where the device's WebSocket endpoint lives. The four parts
//! combine into `protocol://hostname:port/endpoint`.
//!
//! # Example
//!
//! ```ignore
//! use pixelix_client::ConnectOptions;
//!
//! let options = ConnectOptions::new("pixelix.local").with_port(8080);
//!
//! let url = options.to_url()?;
//! // ws://pixelix.local:8080/ws
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Only supported URL scheme.
pub const DEFAULT_PROTOCOL: &str = "ws";

/// Port the device serves its web interface on.
pub const DEFAULT_PORT: u16 = 80;

/// Path of the device's WebSocket endpoint.
pub const DEFAULT_ENDPOINT: &str = "/ws";

// ============================================================================
// ConnectOptions
// ============================================================================

/// WebSocket target of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectOptions {
    /// URL scheme. Only `ws` is accepted.
    pub protocol: String,

    /// Device hostname or IP address.
    pub hostname: String,

    /// TCP port.
    pub port: u16,

    /// Endpoint path, starting with `/`.
    pub endpoint: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            hostname: String::new(),
            port: DEFAULT_PORT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectOptions {
    /// Creates options for `hostname` with default protocol, port and
    /// endpoint.
    #[inline]
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Parses options from a URL such as `ws://192.168.1.20/ws`.
    ///
    /// A missing port falls back to the scheme default and an empty path to
    /// `/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTarget`] if the URL does not parse or has no
    /// host.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::invalid_target(format!("{url}: {e}")))?;

        let hostname = parsed
            .host_str()
            .ok_or_else(|| Error::invalid_target(format!("{url}: missing host")))?;

        let options = Self {
            protocol: parsed.scheme().to_string(),
            hostname: hostname.to_string(),
            port: parsed.port_or_known_default().unwrap_or(DEFAULT_PORT),
            endpoint: parsed.path().to_string(),
        };

        options.validate()?;
        Ok(options)
    }

    /// Parses options from JSON with camelCase keys.
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectOptions {
    /// Sets the URL scheme.
    #[inline]
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the hostname.
    #[inline]
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Sets the TCP port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the endpoint path.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ConnectOptions {
    /// Validates the target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTarget`] for a scheme other than `ws`, an
    /// empty hostname, or an endpoint not starting with `/`.
    pub fn validate(&self) -> Result<()> {
        if self.protocol != DEFAULT_PROTOCOL {
            return Err(Error::invalid_target(format!(
                "unsupported protocol '{}', expected '{DEFAULT_PROTOCOL}'",
                self.protocol
            )));
        }

        if self.hostname.is_empty() {
            return Err(Error::invalid_target("hostname must not be empty"));
        }

        if !self.endpoint.starts_with('/') {
            return Err(Error::invalid_target(format!(
                "endpoint '{}' must start with '/'",
                self.endpoint
            )));
        }

        Ok(())
    }

    /// Builds the WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTarget`] if validation fails or the parts do
    /// not form a valid URL.
    pub fn to_url(&self) -> Result<Url> {
        self.validate()?;

        let raw = format!(
            "{}://{}:{}{}",
            self.protocol, self.hostname, self.port, self.endpoint
        );

        Url::parse(&raw).map_err(|e| Error::invalid_target(format!("{raw}: {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let options = ConnectOptions::new("pixelix.local");
        assert_eq!(options.protocol, "ws");
        assert_eq!(options.hostname, "pixelix.local");
        assert_eq!(options.port, 80);
        assert_eq!(options.endpoint, "/ws");
    }

    #[test]
    fn test_builder_chain() {
        let options = ConnectOptions::new("a")
            .with_hostname("192.168.1.20")
            .with_port(8080)
            .with_endpoint("/socket");

        assert_eq!(
            options.to_url().expect("url").as_str(),
            "ws://192.168.1.20:8080/socket"
        );
    }

    #[test]
    fn test_to_url_rejects_other_schemes() {
        let err = ConnectOptions::new("host")
            .with_protocol("wss")
            .to_url()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }

    #[test]
    fn test_to_url_rejects_empty_hostname() {
        let err = ConnectOptions::default().to_url().unwrap_err();
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn test_to_url_rejects_relative_endpoint() {
        let err = ConnectOptions::new("host")
            .with_endpoint("ws")
            .to_url()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }

    #[test]
    fn test_to_url_rejects_unparsable_host() {
        let err = ConnectOptions::new("bad host").to_url().unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }

    #[test]
    fn test_from_url() {
        let options = ConnectOptions::from_url("ws://10.0.0.7:81/ws").expect("parse");
        assert_eq!(options, ConnectOptions::new("10.0.0.7").with_port(81));

        let options = ConnectOptions::from_url("ws://pixelix/ws").expect("parse");
        assert_eq!(options.port, 80);
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(ConnectOptions::from_url("not a url").is_err());
        assert!(ConnectOptions::from_url("http://host/ws").is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options =
            ConnectOptions::from_json(r#"{"hostname":"pixelix","port":8080}"#).expect("json");
        assert_eq!(options.protocol, "ws");
        assert_eq!(options.endpoint, "/ws");
        assert_eq!(options.port, 8080);
    }

    #[test]
    fn test_from_json_malformed() {
        let err = ConnectOptions::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
