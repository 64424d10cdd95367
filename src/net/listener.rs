//! TCP listener binding.
//!
//! # Responsibilities
//! - Translate the configured listen address into a bindable one
//! - Bind the socket and report failures with the address attempted

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Addresses to try, in order, when binding `listen_addr`.
///
/// A bare `:port` means every interface, as in `":8080"`: the IPv6 wildcard
/// first (dual-stack where the host allows it), then the IPv4 wildcard for
/// hosts without IPv6.
pub fn bind_candidates(listen_addr: &str) -> Vec<String> {
    if listen_addr.starts_with(':') {
        vec![format!("[::]{}", listen_addr), format!("0.0.0.0{}", listen_addr)]
    } else {
        vec![listen_addr.to_string()]
    }
}

/// Bind a TCP listener on the configured address.
///
/// Candidates are tried in order; the error reported is the last one.
pub async fn bind(listen_addr: &str) -> Result<TcpListener, ListenerError> {
    let mut last_err = None;

    for addr in bind_candidates(listen_addr) {
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                if let Ok(local_addr) = listener.local_addr() {
                    tracing::info!(address = %local_addr, "Listener bound");
                }
                return Ok(listener);
            }
            Err(source) => {
                tracing::debug!(address = %addr, error = %source, "Bind attempt failed");
                last_err = Some(ListenerError::Bind { addr, source });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| ListenerError::Bind {
        addr: listen_addr.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no address to bind"),
    }))
}
