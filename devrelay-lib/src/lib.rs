mod constants;
mod error;
mod forwarder;
mod globals;
mod hyper_ext;
mod log;
mod message_handler;
mod proxy;

use crate::{
  forwarder::Forwarder,
  globals::Globals,
  log::*,
  message_handler::{HandleRequest, RelayHandlerBuilder, StaticFileHandlerBuilder},
  proxy::{connection_builder, Proxy, ProxyBuilder},
};
use futures::future::select_all;
use hyper_util::{rt::TokioExecutor, server::conn::auto::Builder as ConnectionBuilder};
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;

pub use crate::{
  error::{DevRelayError, DevRelayResult},
  globals::ServerConfig,
  message_handler::{HttpError, RelayBody, RelayRequest, RelayResponse},
};

/// Entrypoint that creates and spawns tasks of the playground server and the relay.
/// Both sockets are bound before anything is served, so that a port in use aborts the startup.
/// It returns when the cancel token is called or either listener stops with an error,
/// in which case the other one is stopped as well.
pub async fn entrypoint(
  server_config: &ServerConfig,
  runtime_handle: &tokio::runtime::Handle,
  cancel_token: CancellationToken,
) -> DevRelayResult<()> {
  if !server_config.document_root.is_dir() {
    return Err(DevRelayError::InvalidDocumentRoot(format!(
      "{} is not a directory",
      server_config.document_root.display()
    )));
  }
  info!("Serving files under {}", server_config.document_root.display());
  if !server_config.relay_listen_socket.ip().is_loopback() {
    warn!(
      "Relay listens on non-loopback address {}. Anyone reaching it can send requests on behalf of this host.",
      server_config.relay_listen_socket
    );
  }

  // build global
  let globals = Arc::new(Globals {
    server_config: server_config.clone(),
    runtime_handle: runtime_handle.clone(),
  });
  let connection_builder = connection_builder(&globals);

  // build message handlers, including a request forwarder for the relay
  let static_handler = Arc::new(StaticFileHandlerBuilder::default().globals(globals.clone()).build()?);
  let relay_handler = Arc::new(
    RelayHandlerBuilder::default()
      .forwarder(Arc::new(Forwarder::try_new(&globals)?))
      .globals(globals.clone())
      .build()?,
  );

  let playground = build_proxy(
    "playground",
    &globals,
    globals.server_config.playground_listen_socket,
    &connection_builder,
    static_handler,
  )?;
  let relay = build_proxy(
    "relay",
    &globals,
    globals.server_config.relay_listen_socket,
    &connection_builder,
    relay_handler,
  )?;

  // bind all before serving
  let playground_listener = playground.bind()?;
  let relay_listener = relay.bind()?;

  let child_token = cancel_token.child_token();
  let handles = vec![
    {
      let token = child_token.clone();
      runtime_handle.spawn(async move { playground.serve(playground_listener, token).await })
    },
    {
      let token = child_token.clone();
      runtime_handle.spawn(async move { relay.serve(relay_listener, token).await })
    },
  ];

  // wait for the first listener to stop, then stop and wait for the rest
  let (first, _, rest) = select_all(handles).await;
  child_token.cancel();
  let mut result = first.map_err(DevRelayError::from).and_then(|r| r);
  for handle in rest {
    let res = handle.await.map_err(DevRelayError::from).and_then(|r| r);
    if result.is_ok() {
      result = res;
    }
  }

  if let Err(e) = &result {
    error!("Listener is down: {}", e);
  }
  result
}

fn build_proxy<H>(
  service_name: &'static str,
  globals: &Arc<Globals>,
  listening_on: SocketAddr,
  connection_builder: &Arc<ConnectionBuilder<TokioExecutor>>,
  message_handler: Arc<H>,
) -> DevRelayResult<Proxy<H>>
where
  H: HandleRequest + Clone + Send + Sync + 'static,
{
  ProxyBuilder::default()
    .service_name(service_name)
    .globals(globals.clone())
    .listening_on(listening_on)
    .connection_builder(connection_builder.clone())
    .message_handler(message_handler)
    .build()
    .map_err(|e| DevRelayError::FailedToBuildProxy(service_name, e.to_string()))
}
