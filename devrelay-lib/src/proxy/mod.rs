mod proxy_main;
mod socket;

use crate::globals::Globals;
use hyper_util::{
  rt::{TokioExecutor, TokioTimer},
  server::{self, conn::auto::Builder as ConnectionBuilder},
};
use std::sync::Arc;

pub(crate) use proxy_main::{Proxy, ProxyBuilder};

/// build connection builder shared with both listeners
pub(crate) fn connection_builder(globals: &Arc<Globals>) -> Arc<ConnectionBuilder<TokioExecutor>> {
  let mut http_server = server::conn::auto::Builder::new(TokioExecutor::new());
  http_server
    .http1()
    .keep_alive(globals.server_config.keepalive)
    .header_read_timeout(globals.server_config.proxy_idle_timeout)
    .timer(TokioTimer::new())
    .pipeline_flush(true);
  http_server
    .http2()
    .keep_alive_interval(Some(globals.server_config.proxy_idle_timeout))
    .timer(TokioTimer::new())
    .max_concurrent_streams(globals.server_config.max_concurrent_streams);
  Arc::new(http_server)
}
