use crate::{
  error::{DevRelayError, DevRelayResult},
  globals::Globals,
  log::*,
};
use async_trait::async_trait;
use http::{Request, Response};
use hyper::body::{Body, Incoming};
use hyper_util::{
  client::legacy::{
    connect::{Connect, HttpConnector},
    Client,
  },
  rt::TokioExecutor,
};
use std::sync::Arc;

#[async_trait]
/// Definition of the forwarder that simply sends a request upstream and hands back the response as is.
pub trait ForwardRequest<B1, B2> {
  type Error;
  async fn request(&self, req: Request<B1>) -> Result<Response<B2>, Self::Error>;
}

/// Forwarder http client struct used by the relay
pub struct Forwarder<C, B> {
  inner: Client<C, B>,
}

#[async_trait]
impl<C, B1> ForwardRequest<B1, Incoming> for Forwarder<C, B1>
where
  C: Send + Sync + Connect + Clone + 'static,
  B1: Body + Send + Sync + Unpin + 'static,
  <B1 as Body>::Data: Send,
  <B1 as Body>::Error: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
  type Error = DevRelayError;

  async fn request(&self, req: Request<B1>) -> Result<Response<Incoming>, Self::Error> {
    self
      .inner
      .request(req)
      .await
      .map_err(|e| DevRelayError::FailedToFetchFromUpstream(error_chain(&e)))
  }
}

/// Build forwarder with hyper-rustls, trusting Mozilla WebPKI root certs. Both http and https are allowed.
impl<B1> Forwarder<hyper_rustls::HttpsConnector<HttpConnector>, B1>
where
  B1: Body + Send + Unpin + 'static,
  <B1 as Body>::Data: Send,
  <B1 as Body>::Error: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
  pub fn try_new(globals: &Arc<Globals>) -> DevRelayResult<Self> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_reuse_address(true);
    http.set_keepalive(Some(globals.server_config.upstream_idle_timeout));

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
      .with_webpki_roots()
      .https_or_http()
      .enable_all_versions()
      .wrap_connector(http);
    info!("Mozilla WebPKI root certs with rustls is used for the connection to relay targets");

    let inner = Client::builder(TokioExecutor::new())
      .pool_idle_timeout(globals.server_config.upstream_idle_timeout)
      .build::<_, B1>(connector);

    Ok(Self { inner })
  }
}

/// Flatten an error and its sources into a single line, e.g.,
/// `client error (Connect): tcp connect error: Connection refused (os error 111)`.
pub(crate) fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
  let mut message = e.to_string();
  let mut source = e.source();
  while let Some(inner) = source {
    let inner_message = inner.to_string();
    // some errors repeat the message of their source
    if !message.ends_with(&inner_message) {
      message.push_str(": ");
      message.push_str(&inner_message);
    }
    source = inner.source();
  }
  message
}
