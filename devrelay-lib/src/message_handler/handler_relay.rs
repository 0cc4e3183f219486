use super::{
  http_log::HttpMessageLog,
  http_result::{HttpError, HttpResult},
  relay_message::{RelayRequest, RelayResponse},
  synthetic_response::*,
  utils_upstream::UpstreamRequest,
  HandleRequest,
};
use crate::{
  error::*,
  forwarder::{error_chain, ForwardRequest, Forwarder},
  globals::Globals,
  hyper_ext::body::ResponseBody,
  log::*,
};
use async_trait::async_trait;
use derive_builder::Builder;
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use std::{net::SocketAddr, sync::Arc};
use tokio::time::timeout;

#[derive(Clone, Builder)]
/// HTTP message handler of the relay. It performs requests described in JSON on behalf of the browser.
/// Note that the relay is open: any target is reachable by anyone able to reach the listener.
pub struct RelayHandler {
  forwarder: Arc<Forwarder>,
  globals: Arc<Globals>,
}

#[async_trait]
impl HandleRequest for RelayHandler {
  async fn handle_request<B>(&self, req: Request<B>, client_addr: SocketAddr) -> DevRelayResult<Response<ResponseBody>>
  where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    let mut log_data = HttpMessageLog::new("relay", &req);
    log_data.client_addr(&client_addr);

    let method = req.method().clone();
    let res = match method {
      Method::OPTIONS => preflight_response()?,
      Method::POST => match self.relay(req, &mut log_data).await {
        Ok(relay_res) => relay_json_response(StatusCode::OK, &relay_res)?,
        Err(e) => {
          warn!("Relay failed: {}", e);
          let relay_res = RelayResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            body: e.to_string(),
          };
          relay_json_response(StatusCode::INTERNAL_SERVER_ERROR, &relay_res)?
        }
      },
      _ => {
        let e = HttpError::MethodNotAllowed(method);
        relay_method_not_allowed_response(&RelayResponse::from(&e))?
      }
    };

    log_data.status_code(&res.status()).output();
    Ok(res)
  }
}

impl RelayHandler {
  /// Parse the relay request in the body and perform it.
  /// Upstream non-2xx statuses are successes here; only relay-local failures are errors.
  async fn relay<B>(&self, req: Request<B>, log_data: &mut HttpMessageLog) -> HttpResult<RelayResponse>
  where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    let max_body_size = self.globals.server_config.max_request_body_size;
    let body = Limited::new(req.into_body(), max_body_size)
      .collect()
      .await
      .map_err(|e| HttpError::FailedToReadRequestBody(e.to_string()))?
      .to_bytes();

    let relay_req: RelayRequest =
      serde_json::from_slice(&body).map_err(|e| HttpError::InvalidRelayRequest(e.to_string()))?;
    let upstream_req = UpstreamRequest::try_from(relay_req)?;
    log_data.upstream(&upstream_req.uri);
    debug!("Relaying {} {}", upstream_req.method, upstream_req.uri);

    let upstream_timeout = self.globals.server_config.upstream_timeout;
    match timeout(upstream_timeout, self.exchange(upstream_req)).await {
      Ok(res) => res,
      Err(_) => Err(HttpError::UpstreamTimeout(upstream_timeout)),
    }
  }

  /// Send the request upstream, following redirects, and read the whole response body
  async fn exchange(&self, upstream_req: UpstreamRequest) -> HttpResult<RelayResponse> {
    let max_redirects = self.globals.server_config.max_redirects;
    let mut current = upstream_req;
    let mut redirects = 0;

    loop {
      let res = self
        .forwarder
        .request(current.to_request()?)
        .await
        .map_err(|e| match e {
          DevRelayError::FailedToFetchFromUpstream(chain) => HttpError::FailedToGetResponseFromUpstream(chain),
          e => HttpError::FailedToGetResponseFromUpstream(e.to_string()),
        })?;
      let status = res.status();

      // redirects not followed are relayed as they are
      if current.follows_redirect(status) && redirects < max_redirects {
        if let Some(location) = res.headers().get(header::LOCATION) {
          let next = current.redirected(location)?;
          debug!("Upstream {} redirected with {} to {}", current.uri, status, next.uri);
          current = next;
          redirects += 1;
          continue;
        }
      }

      let body = res
        .into_body()
        .collect()
        .await
        .map_err(|e| HttpError::FailedToReadUpstreamBody(error_chain(&e)))?
        .to_bytes();
      return Ok(RelayResponse::from_upstream(status, &body));
    }
  }
}
