use crate::{error::*, log::*};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket};

/// Bind TCP socket to the given `SocketAddr` and start listening on it.
/// Only `SO_REUSEADDR` is set, so a port already taken by another listener is reported as an error.
pub(super) fn bind_tcp_listener(listening_on: &SocketAddr, backlog: u32) -> DevRelayResult<TcpListener> {
  let tcp_socket = if listening_on.is_ipv6() {
    TcpSocket::new_v6()
  } else {
    TcpSocket::new_v4()
  }?;
  tcp_socket.set_reuseaddr(true)?;

  tcp_socket.bind(*listening_on).map_err(|e| {
    error!("Failed to bind TCP socket: {}", e);
    DevRelayError::FailedToBindTcpSocket(*listening_on, e)
  })?;

  tcp_socket
    .listen(backlog)
    .map_err(|e| DevRelayError::FailedToBindTcpSocket(*listening_on, e))
}
