use crate::constants::*;
use std::{
  net::{IpAddr, SocketAddr},
  path::PathBuf,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};
use tokio::time::Duration;

/// Global object containing the server configuration and the runtime handle.
/// It is immutable and shared among the listener tasks; there is no mutable state in it.
pub struct Globals {
  /// Configuration parameters for listeners and request handlers
  pub server_config: ServerConfig,

  /// Shared context - Async task runtime handler
  pub runtime_handle: tokio::runtime::Handle,
}

/// Configuration parameters for the playground server and the relay
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ServerConfig {
  pub playground_listen_socket: SocketAddr, // when instantiate server
  pub relay_listen_socket: SocketAddr,      // when instantiate server
  pub tcp_listen_backlog: u32,              // when instantiate server

  /// Directory served by the playground server
  pub document_root: PathBuf,

  pub proxy_idle_timeout: Duration, // when serving requests at Proxy
  pub upstream_timeout: Duration,   // when serving requests at the relay
  pub upstream_idle_timeout: Duration,

  pub max_clients: usize,          // per listener
  pub max_concurrent_streams: u32, // when instantiate server
  pub keepalive: bool,             // when instantiate server

  pub max_redirects: usize,
  pub max_request_body_size: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let listen_address: IpAddr = LISTEN_ADDRESS.parse().unwrap_or(IpAddr::from([127, 0, 0, 1]));
    Self {
      playground_listen_socket: SocketAddr::new(listen_address, PLAYGROUND_PORT),
      relay_listen_socket: SocketAddr::new(listen_address, RELAY_PORT),
      tcp_listen_backlog: TCP_LISTEN_BACKLOG,

      document_root: PathBuf::from(DOCUMENT_ROOT),

      proxy_idle_timeout: Duration::from_secs(PROXY_IDLE_TIMEOUT_SEC),
      upstream_timeout: Duration::from_secs(UPSTREAM_TIMEOUT_SEC),
      upstream_idle_timeout: Duration::from_secs(UPSTREAM_IDLE_TIMEOUT_SEC),

      max_clients: MAX_CLIENTS,
      max_concurrent_streams: MAX_CONCURRENT_STREAMS,
      keepalive: true,

      max_redirects: MAX_REDIRECTS,
      max_request_body_size: MAX_REQUEST_BODY_SIZE,
    }
  }
}

#[derive(Debug, Clone, Default)]
/// Counter of connections being served by a listener
pub(crate) struct ConnectionCount(Arc<AtomicUsize>);

impl ConnectionCount {
  pub fn current(&self) -> usize {
    self.0.load(Ordering::Relaxed)
  }

  /// Takes a slot if fewer than `max` connections are in flight.
  /// The slot is given back when the returned guard is dropped.
  pub fn try_acquire(&self, max: usize) -> Option<ConnectionSlot> {
    self
      .0
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| (count < max).then_some(count + 1))
      .ok()
      .map(|_| ConnectionSlot(self.0.clone()))
  }
}

/// A connection slot held for the lifetime of a served connection
pub(crate) struct ConnectionSlot(Arc<AtomicUsize>);

impl Drop for ConnectionSlot {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::AcqRel);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_binds_loopback() {
    let config = ServerConfig::default();
    assert!(config.playground_listen_socket.ip().is_loopback());
    assert!(config.relay_listen_socket.ip().is_loopback());
    assert_eq!(config.playground_listen_socket.port(), 8765);
    assert_eq!(config.relay_listen_socket.port(), 8766);
    assert_eq!(config.upstream_timeout, Duration::from_secs(30));
  }

  #[test]
  fn connection_count_caps_and_releases() {
    let count = ConnectionCount::default();
    let first = count.try_acquire(2);
    let second = count.try_acquire(2);
    assert!(first.is_some() && second.is_some());
    assert!(count.try_acquire(2).is_none());
    assert_eq!(count.current(), 2);

    drop(first);
    assert_eq!(count.current(), 1);
    assert!(count.try_acquire(2).is_some());
    assert_eq!(count.current(), 1);
  }
}
