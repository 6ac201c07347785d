//! TLS client setup with the webpki root store.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{self, pki_types::ServerName};
use tokio_rustls::TlsConnector;

use crate::error::ProtocolError;

/// A connector trusting the bundled Mozilla roots, without client auth.
pub(crate) fn connector() -> TlsConnector {
    let roots = rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Run the client handshake over an established TCP stream.
pub(crate) async fn handshake(
    connector: &TlsConnector,
    host: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, ProtocolError> {
    let name = ServerName::try_from(host.to_string())
        .map_err(|_| ProtocolError::InvalidServerName(host.to_string()))?;
    Ok(connector.connect(name, stream).await?)
}
