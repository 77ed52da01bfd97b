//! WebSocket server: accept loop and the per-port connection router.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from clients.
//! 3. Binding each connection to one port during the WebSocket handshake.
//!    The port index comes from the request path (`/<port>/ws`); an invalid
//!    index is refused with `404` and a port that already has a client is
//!    refused with `409`, both before the upgrade completes.
//! 4. Running the decode → apply → acknowledge loop for the lifetime of the
//!    connection.
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! # Exclusivity
//!
//! The port is claimed with [`PortRegistry::try_bind`], which moves the
//! gamepad into a [`PortLease`] owned by the session task.  The task is the
//! only code that can reach the device until it ends and the lease is
//! dropped, at which point the port is free for the next client.
//!
//! # Per-event errors
//!
//! A malformed event, an unknown key or a failed device write is logged and
//! the loop moves on to the next frame.  The client only notices the missing
//! acknowledgement.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::{EventDispatcher, EventError, PortError, PortLease, PortRegistry};

/// How often the accept loop wakes up to check the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Routing ───────────────────────────────────────────────────────────────────

/// Reasons a connection is refused during the handshake.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no route for path '{0}' (expected /<port>/ws)")]
    BadPath(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl RouteError {
    /// HTTP status sent back in place of the upgrade.
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::BadPath(_) | RouteError::Port(PortError::InvalidPort { .. }) => {
                StatusCode::NOT_FOUND
            }
            RouteError::Port(PortError::PortBusy(_)) => StatusCode::CONFLICT,
            RouteError::Port(PortError::Closed(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Extracts the port index from `/<port>/ws` or `/<port>`.
///
/// Only plain decimal digits are accepted.
///
/// # Errors
///
/// [`RouteError::BadPath`] for any other shape.
pub fn parse_port_path(path: &str) -> Result<usize, RouteError> {
    let bad = || RouteError::BadPath(path.to_string());
    let rest = path.strip_prefix('/').ok_or_else(bad)?;
    let digits = match rest.split_once('/') {
        Some((digits, "ws")) => digits,
        Some(_) => return Err(bad()),
        None => rest,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    digits.parse().map_err(|_| bad())
}

/// Resolves a request path to an exclusive lease on its port.
///
/// The index is range-checked before the registry is consulted.
///
/// # Errors
///
/// Any [`RouteError`].
pub fn route(registry: &Arc<PortRegistry>, path: &str) -> Result<PortLease, RouteError> {
    let index = parse_port_path(path)?;
    if index >= registry.len() {
        return Err(PortError::InvalidPort {
            index,
            count: registry.len(),
        }
        .into());
    }
    Ok(registry.try_bind(index)?)
}

fn reject(err: &RouteError) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(err.to_string()));
    *response.status_mut() = err.status();
    response
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(
    addr: SocketAddr,
    registry: Arc<PortRegistry>,
    dispatcher: EventDispatcher,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))?;
    info!("joypad bridge listening on {addr}");
    serve(listener, registry, dispatcher, running).await
}

/// Runs the accept loop on an already bound listener.
///
/// Each connection gets its own task.  The loop checks `running` at least
/// every 200 ms.
///
/// # Errors
///
/// Currently infallible once the listener exists; accept errors are logged.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<PortRegistry>,
    dispatcher: EventDispatcher,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let registry = Arc::clone(&registry);
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, registry, dispatcher).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<PortRegistry>,
    dispatcher: EventDispatcher,
) {
    let session = Uuid::new_v4();
    match run_session(stream, peer_addr, session, registry, dispatcher).await {
        Ok(()) => info!("session {session}: {peer_addr} disconnected"),
        Err(e) => warn!("session {session}: {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    session: Uuid,
    registry: Arc<PortRegistry>,
    dispatcher: EventDispatcher,
) -> anyhow::Result<()> {
    // Filled in by the handshake callback once the port has been claimed.
    let mut claimed: Option<PortLease> = None;
    let slot = &mut claimed;
    let callback = |request: &Request, response: Response| {
        let path = request.uri().path();
        match route(&registry, path) {
            Ok(lease) => {
                *slot = Some(lease);
                Ok(response)
            }
            Err(e) => {
                warn!("session {session}: refusing {peer_addr} on '{path}': {e}");
                Err(reject(&e))
            }
        }
    };

    let mut ws = accept_hdr_async(stream, callback)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;
    let Some(mut lease) = claimed else {
        anyhow::bail!("handshake completed without a bound port");
    };

    let port = lease.index();
    info!(
        "session {session}: {peer_addr} connected to port #{port} ('{}')",
        lease.name()
    );

    while let Some(frame) = ws.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => {
                debug!("session {session}: connection closed");
                break;
            }
            Err(e) => {
                warn!("session {session}: read error: {e}");
                break;
            }
        };

        let payload = match frame {
            WsMessage::Text(text) => text.into_bytes(),
            WsMessage::Binary(bytes) => bytes,
            WsMessage::Ping(data) => {
                debug!("session {session}: ping ({} bytes)", data.len());
                continue;
            }
            WsMessage::Pong(_) => {
                debug!("session {session}: pong");
                continue;
            }
            WsMessage::Close(_) => {
                debug!("session {session}: close frame received");
                break;
            }
            WsMessage::Frame(_) => continue,
        };

        let ack = match dispatcher.handle(&mut lease, &payload) {
            Ok(ack) => ack,
            Err(EventError::UnknownKey(key)) => {
                warn!("session {session}: port #{port}: dropping unknown key '{key}'");
                continue;
            }
            Err(e) => {
                warn!("session {session}: port #{port}: {e}");
                continue;
            }
        };

        let body = serde_json::to_string(&ack).context("failed to encode acknowledgement")?;
        if ws.send(WsMessage::Text(body)).await.is_err() {
            debug!("session {session}: acknowledgement send failed (client gone)");
            break;
        }
    }

    drop(lease);
    debug!("session {session}: port #{port} released");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use joypad_core::Capabilities;

    use crate::infrastructure::device::mock::MockDeviceBackend;

    fn registry(count: usize) -> Arc<PortRegistry> {
        let backend = MockDeviceBackend::new();
        Arc::new(
            PortRegistry::initialize(&backend, count, "Joypad", Capabilities::SIMPLE_ANALOG)
                .unwrap(),
        )
    }

    #[test]
    fn test_parse_port_path_with_ws_suffix() {
        assert_eq!(parse_port_path("/0/ws"), Ok(0));
        assert_eq!(parse_port_path("/12/ws"), Ok(12));
    }

    #[test]
    fn test_parse_port_path_without_suffix() {
        assert_eq!(parse_port_path("/3"), Ok(3));
    }

    #[test]
    fn test_parse_port_path_rejects_other_shapes() {
        for path in ["/", "", "/ws", "/-1/ws", "/+1/ws", "/1/other", "/1/ws/extra", "/x/ws", "/1/"] {
            assert!(
                matches!(parse_port_path(path), Err(RouteError::BadPath(_))),
                "path {path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_route_out_of_range_is_not_found() {
        // Arrange
        let ports = registry(2);

        // Act
        let err = route(&ports, "/99/ws").unwrap_err();

        // Assert
        assert_eq!(
            err,
            RouteError::Port(PortError::InvalidPort {
                index: 99,
                count: 2
            })
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_route_bound_port_is_conflict() {
        let ports = registry(1);
        let _first = route(&ports, "/0/ws").unwrap();

        let err = route(&ports, "/0/ws").unwrap_err();

        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_route_frees_port_when_lease_dropped() {
        let ports = registry(1);

        drop(route(&ports, "/0").unwrap());

        assert!(route(&ports, "/0/ws").is_ok());
    }

    #[test]
    fn test_bad_path_is_not_found() {
        let err = RouteError::BadPath("/nope".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_reject_carries_status_and_reason() {
        let response = reject(&RouteError::Port(PortError::PortBusy(1)));
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.body().as_deref().unwrap_or_default().contains("port 1"));
    }
}
