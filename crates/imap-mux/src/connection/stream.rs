//! TLS transport establishment.
//!
//! The engine treats the transport as an opaque bidirectional byte stream;
//! this module provides the default binding, TLS over TCP via rustls.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::Result;

/// Creates a TLS connector trusting the bundled webpki root certificates.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Opens a TLS-over-TCP connection to `host:port`.
///
/// # Errors
///
/// Returns an error if the TCP connection, DNS name validation, or TLS
/// handshake fails.
pub async fn connect_tls(host: &str, port: u16) -> Result<TlsStream<TcpStream>> {
    let tcp = TcpStream::connect((host, port)).await?;
    let server_name = ServerName::try_from(host.to_string())?;
    let tls = create_tls_connector().connect(server_name, tcp).await?;
    Ok(tls)
}
