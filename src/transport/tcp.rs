//! TCP transport.
//!
//! Resolves the configured host, optionally binds a local address first, and
//! connects within the configured timeout. The first resolved address that
//! accepts wins.

use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};
use crate::utils::timeout::with_timeout;

/// Open a TCP connection to the server described by `config`
#[instrument(skip(config), fields(address = %config.address()))]
pub async fn connect(config: &ClientConfig) -> Result<TcpStream> {
    let local = config.local_socket_addr()?;
    let address = config.address();

    with_timeout(config.timeout, async {
        let mut last_error = None;

        for remote in lookup_host(address.as_str()).await? {
            match connect_one(remote, local).await {
                Ok(stream) => {
                    info!(peer = %remote, "Connected");
                    return Ok(stream);
                }
                Err(e) => {
                    warn!(peer = %remote, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.map(ProtocolError::Io).unwrap_or_else(|| {
            ProtocolError::TransportError(format!("No addresses resolved for {address}"))
        }))
    })
    .await
}

async fn connect_one(remote: SocketAddr, local: Option<SocketAddr>) -> std::io::Result<TcpStream> {
    let socket = match remote {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    if let Some(local) = local {
        debug!(local = %local, "Binding local address");
        socket.bind(local)?;
    }

    let stream = socket.connect(remote).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_with_local_bind() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut config = ClientConfig::new("127.0.0.1", port);
        config.local_address = Some("127.0.0.1".to_string());

        let (stream, accepted) = tokio::join!(connect(&config), listener.accept());
        let stream = stream.unwrap();
        let (_, peer) = accepted.unwrap();
        assert_eq!(stream.local_addr().unwrap(), peer);
        assert_eq!(peer.ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_refused_connection_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::new("127.0.0.1", port);
        assert!(matches!(
            connect(&config).await,
            Err(ProtocolError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_local_address_rejected() {
        let mut config = ClientConfig::new("127.0.0.1", 1);
        config.local_address = Some("not-an-ip".to_string());
        assert!(matches!(
            connect(&config).await,
            Err(ProtocolError::ConfigError(_))
        ));
    }
}
