use super::socket::bind_tcp_listener;
use crate::{
  error::*,
  globals::{ConnectionCount, Globals},
  hyper_ext::body::ResponseBody,
  log::*,
  message_handler::HandleRequest,
};
use derive_builder::Builder;
use http::{Request, Response};
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
  rt::{TokioExecutor, TokioIo},
  server::conn::auto::Builder as ConnectionBuilder,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Wrapper function to hand a request for HTTP/1.1 and HTTP/2 to the message handler
async fn serve_request<H>(
  req: Request<Incoming>,
  handler: Arc<H>,
  client_addr: SocketAddr,
) -> DevRelayResult<Response<ResponseBody>>
where
  H: HandleRequest + Clone + Send + Sync + 'static,
{
  handler.handle_request(req, client_addr).await
}

#[derive(Builder)]
/// Proxy main object responsible to serve requests received from clients at the given socket address.
/// One instance serves the playground and another one serves the relay.
pub(crate) struct Proxy<H>
where
  H: HandleRequest + Clone + Send + Sync + 'static,
{
  /// name of the served component, used in logs
  pub service_name: &'static str,
  /// global context shared among async tasks
  pub globals: Arc<Globals>,
  /// listen socket address
  pub listening_on: SocketAddr,
  /// hyper connection builder serving http request
  pub connection_builder: Arc<ConnectionBuilder<TokioExecutor>>,
  /// message handler serving incoming http request
  pub message_handler: Arc<H>,
  #[builder(default)]
  /// number of connections currently served
  pub connection_count: ConnectionCount,
}

impl<H> Proxy<H>
where
  H: HandleRequest + Clone + Send + Sync + 'static,
{
  /// Binds the listen socket. This is done before any listener starts serving,
  /// so that a port already in use aborts the startup.
  pub fn bind(&self) -> DevRelayResult<TcpListener> {
    let listener = bind_tcp_listener(&self.listening_on, self.globals.server_config.tcp_listen_backlog)?;
    info!("Bound {} listener on {}", self.service_name, self.listening_on);
    Ok(listener)
  }

  /// Serves requests from clients
  fn serve_connection(&self, stream: TcpStream, peer_addr: SocketAddr) {
    let Some(slot) = self
      .connection_count
      .try_acquire(self.globals.server_config.max_clients)
    else {
      warn!(
        "Too many connections on {}, dropping connection from {}",
        self.service_name, peer_addr
      );
      return;
    };
    trace!(
      "Connection incoming to {}: current # {}",
      self.service_name,
      self.connection_count.current()
    );

    let server_clone = self.connection_builder.clone();
    let message_handler_clone = self.message_handler.clone();
    let connection_count = self.connection_count.clone();
    let service_name = self.service_name;

    self.globals.runtime_handle.spawn(async move {
      let res = server_clone
        .serve_connection(
          TokioIo::new(stream),
          service_fn(move |req: Request<Incoming>| serve_request(req, message_handler_clone.clone(), peer_addr)),
        )
        .await;
      if let Err(e) = res {
        debug!("Connection from {} to {} closed with error: {}", peer_addr, service_name, e);
      }

      drop(slot);
      trace!(
        "Connection processed by {}: current # {}",
        service_name,
        connection_count.current()
      );
    });
  }

  /// Accept loop. It runs until the cancel token is called or accepting fails.
  pub async fn serve(&self, tcp_listener: TcpListener, cancel_token: CancellationToken) -> DevRelayResult<()> {
    info!("Start serving {} on {}", self.service_name, self.listening_on);
    loop {
      tokio::select! {
        accepted = tcp_listener.accept() => {
          match accepted {
            Ok((stream, client_addr)) => self.serve_connection(stream, client_addr),
            Err(e) => {
              error!("Failed to accept connection on {}: {}", self.listening_on, e);
              return Err(DevRelayError::FailedToAccept(self.listening_on, e));
            }
          }
        }
        _ = cancel_token.cancelled() => {
          debug!("Cancel token is called for {} listener", self.service_name);
          return Ok(());
        }
      }
    }
  }
}
