//! Session configuration.

use std::time::Duration;

/// Connection parameters for [`TlsSession::connect`](crate::TlsSession::connect).
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port (993 is the conventional implicit-TLS port).
    pub port: u16,
    /// Time allowed for TCP connect plus the TLS handshake.
    pub connect_timeout: Duration,
}

impl Config {
    /// Creates a configuration with a 30 second connect timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builder() {
        let config = Config::new("imap.example.com", 993);
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));

        let config = config.connect_timeout(Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }
}
