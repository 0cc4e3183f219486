mod handler_relay;
mod handler_static;
mod http_log;
mod http_result;
mod relay_message;
mod synthetic_response;
mod utils_path;
mod utils_upstream;

use crate::{error::DevRelayResult, hyper_ext::body::ResponseBody};
use async_trait::async_trait;
use http::{Request, Response};
use hyper::body::Body;
use std::net::SocketAddr;

pub use {
  handler_relay::{RelayHandlerBuilder, RelayHandlerBuilderError},
  handler_static::{StaticFileHandlerBuilder, StaticFileHandlerBuilderError},
  http_result::HttpError,
  relay_message::{RelayBody, RelayRequest, RelayResponse},
};

#[async_trait]
/// Message handler serving requests accepted by a listener.
/// Failures of a request are turned into a synthetic response; an error is returned only
/// when even that response cannot be built.
pub trait HandleRequest {
  async fn handle_request<B>(&self, req: Request<B>, client_addr: SocketAddr) -> DevRelayResult<Response<ResponseBody>>
  where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>;
}
