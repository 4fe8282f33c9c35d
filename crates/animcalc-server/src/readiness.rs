//! Readiness handshake for embedders.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use animcalc_core::{Error, Result};

use crate::server::connectable;

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Waits until a TCP connection to `addr` succeeds.
///
/// Wildcard addresses are probed through loopback.
///
/// # Errors
///
/// Returns [`Error::Internal`] if nothing accepts within `timeout`.
pub async fn wait_until_ready(addr: SocketAddr, timeout: Duration) -> Result<()> {
    let target = connectable(addr);

    let probe = async {
        loop {
            match TcpStream::connect(target).await {
                Ok(_) => return,
                Err(e) => {
                    tracing::trace!(addr = %target, error = %e, "Server not ready yet");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                },
            }
        }
    };

    tokio::time::timeout(timeout, probe).await.map_err(|_| {
        Error::internal(format!(
            "server at {target} was not ready after {}ms",
            timeout.as_millis()
        ))
    })?;

    tracing::debug!(addr = %target, "Server ready");
    Ok(())
}
