// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket connections to the wrapper process.
//!
//! A [`ConnectionManager`] binds one listener for events and, when the
//! wrapper supports it, one for control messages. The wrapper is launched
//! with their addresses and must connect to each exactly once within the
//! connection timeout.

mod control;
mod event;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use nrpc_core::Statistics;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, warn};

pub use control::ControlConnection;
pub use event::EventConnection;

use crate::broker::ControlMessageBroker;
use crate::logger::FunctionLogger;
use crate::wrapper::{Wrapper, WrapperAddresses};
use crate::RuntimeError;

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Transport used to reach the wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    /// Unix domain socket; the address is the socket file path.
    #[default]
    Unix,
    /// TCP on loopback; the address is the port number.
    Tcp,
}

nrpc_core::simple_display! {
    SocketType {
        Unix => "unix",
        Tcp => "tcp",
    }
}

/// Shared services the read loops report into.
#[derive(Clone)]
pub struct ConnectionContext {
    pub statistics: Arc<Statistics>,
    pub runtime_logger: Arc<dyn FunctionLogger>,
    pub broker: Arc<ControlMessageBroker>,
}

/// Unix socket path for one listener: `<dir>/nuclio-rpc-<id>.sock`.
pub fn socket_path(dir: &Path) -> PathBuf {
    dir.join(format!("nuclio-rpc-{}.sock", uuid::Uuid::new_v4().simple()))
}

enum ListenerKind {
    Unix(UnixListener),
    Tcp(TcpListener),
}

/// A bound listener waiting for the wrapper to connect.
pub(crate) struct PendingListener {
    listener: ListenerKind,
    address: String,
    socket_path: Option<PathBuf>,
}

impl PendingListener {
    pub(crate) fn bind(socket_type: SocketType, socket_dir: &Path) -> Result<Self, RuntimeError> {
        match socket_type {
            SocketType::Unix => {
                let path = socket_path(socket_dir);
                // Remove stale socket from a previous run
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
                let address = path.display().to_string();
                debug!(path = %address, "creating unix listener");
                let listener = UnixListener::bind(&path)
                    .map_err(|source| RuntimeError::Listen { address: address.clone(), source })?;
                Ok(Self { listener: ListenerKind::Unix(listener), address, socket_path: Some(path) })
            }
            SocketType::Tcp => {
                let std_listener = std::net::TcpListener::bind("127.0.0.1:0").map_err(|source| {
                    RuntimeError::Listen { address: "127.0.0.1:0".to_string(), source }
                })?;
                std_listener.set_nonblocking(true)?;
                let port = std_listener.local_addr()?.port();
                let listener = TcpListener::from_std(std_listener)?;
                debug!(port, "creating tcp listener");
                Ok(Self {
                    listener: ListenerKind::Tcp(listener),
                    address: port.to_string(),
                    socket_path: None,
                })
            }
        }
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    /// Accept exactly one connection within `timeout`.
    pub(crate) async fn accept(
        &self,
        timeout: Duration,
    ) -> Result<(BoxedReader, BoxedWriter), RuntimeError> {
        let accept = async {
            match &self.listener {
                ListenerKind::Unix(l) => {
                    let (stream, _) = l.accept().await.map_err(RuntimeError::Accept)?;
                    let (r, w) = stream.into_split();
                    Ok::<_, RuntimeError>(boxed(r, w))
                }
                ListenerKind::Tcp(l) => {
                    let (stream, addr) = l.accept().await.map_err(RuntimeError::Accept)?;
                    debug!(%addr, "accepted tcp connection");
                    stream.set_nodelay(true)?;
                    let (r, w) = stream.into_split();
                    Ok::<_, RuntimeError>(boxed(r, w))
                }
            }
        };
        tokio::time::timeout(timeout, accept)
            .await
            .map_err(|_| RuntimeError::Timeout { timeout, what: "wrapper connection" })?
    }
}

fn boxed<R, W>(reader: R, writer: W) -> (BoxedReader, BoxedWriter)
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    (Box::new(reader), Box::new(writer))
}

/// Owns the listeners and the accepted connections of one wrapper process.
pub struct ConnectionManager {
    event_listener: PendingListener,
    control_listener: Option<PendingListener>,
    event: Option<Arc<EventConnection>>,
    control: Option<Arc<ControlConnection>>,
    socket_paths: Vec<PathBuf>,
}

impl ConnectionManager {
    /// Bind one event listener and, if `with_control`, one control listener.
    pub fn bind(
        socket_type: SocketType,
        with_control: bool,
        socket_dir: &Path,
    ) -> Result<Self, RuntimeError> {
        let event_listener = PendingListener::bind(socket_type, socket_dir)?;
        let mut socket_paths: Vec<PathBuf> = event_listener.socket_path.iter().cloned().collect();

        let control_listener = if with_control {
            match PendingListener::bind(socket_type, socket_dir) {
                Ok(listener) => {
                    socket_paths.extend(listener.socket_path.iter().cloned());
                    Some(listener)
                }
                Err(e) => {
                    remove_files(&socket_paths);
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(Self { event_listener, control_listener, event: None, control: None, socket_paths })
    }

    /// Addresses to hand to the wrapper process.
    pub fn addresses(&self) -> WrapperAddresses {
        WrapperAddresses {
            event: self.event_listener.address().to_string(),
            control: self.control_listener.as_ref().map(|l| l.address().to_string()),
        }
    }

    /// Accept the wrapper's connections and start their read loops.
    ///
    /// Waits for the start frame when the wrapper declares one. The whole
    /// sequence is bounded by `timeout`.
    pub async fn start(
        &mut self,
        wrapper: &dyn Wrapper,
        ctx: ConnectionContext,
        timeout: Duration,
    ) -> Result<(), RuntimeError> {
        let (reader, writer) = self.event_listener.accept(timeout).await?;
        let encoder = wrapper.event_encoder(writer);
        let (event, started) = EventConnection::start(
            reader,
            encoder,
            self.event_listener.address().to_string(),
            ctx.clone(),
        );
        self.event = Some(event);

        if let Some(listener) = &self.control_listener {
            let (reader, writer) = listener.accept(timeout).await?;
            let control =
                ControlConnection::start(reader, listener.address().to_string(), ctx.broker.clone());
            ctx.broker.attach_writer(writer).await;
            self.control = Some(control);
        }

        if wrapper.wait_for_start() {
            debug!("waiting for wrapper start signal");
            tokio::time::timeout(timeout, started)
                .await
                .map_err(|_| RuntimeError::Timeout { timeout, what: "wrapper start signal" })?
                .map_err(|_| RuntimeError::ClientDisconnected)?;
        }

        Ok(())
    }

    /// The sole event connection, once started.
    pub fn allocate(&self) -> Option<Arc<EventConnection>> {
        self.event.clone()
    }

    pub fn control(&self) -> Option<Arc<ControlConnection>> {
        self.control.clone()
    }

    /// Cancel every read loop. Idempotent and non-blocking.
    pub fn stop(&self) {
        if let Some(event) = &self.event {
            event.stop();
        }
        if let Some(control) = &self.control {
            control.stop();
        }
    }

    pub fn socket_paths(&self) -> &[PathBuf] {
        &self.socket_paths
    }

    pub fn remove_socket_files(&self) {
        remove_files(&self.socket_paths);
    }
}

fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove socket file"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
