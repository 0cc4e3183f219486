use super::{
  http_result::{HttpError, HttpResult},
  relay_message::RelayRequest,
};
use crate::{constants::UPSTREAM_USER_AGENT, hyper_ext::body::UpstreamBody};
use bytes::Bytes;
use http::{
  header::{self, HeaderName, HeaderValue},
  HeaderMap, Method, Request, StatusCode, Uri,
};
use url::Url;

/// Content type assumed for a body sent without one
const DEFAULT_BODY_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Outbound request kept in a replayable form, so that it can be re-issued on redirects
#[derive(Debug, Clone)]
pub(super) struct UpstreamRequest {
  pub method: Method,
  pub uri: Uri,
  pub headers: HeaderMap,
  pub body: Option<Bytes>,
}

impl TryFrom<RelayRequest> for UpstreamRequest {
  type Error = HttpError;

  fn try_from(relay_req: RelayRequest) -> HttpResult<Self> {
    let uri = parse_target_url(&relay_req.url)?;
    let method =
      Method::from_bytes(relay_req.method().as_bytes()).map_err(|_| HttpError::InvalidMethod(relay_req.method().to_string()))?;

    let mut headers = HeaderMap::with_capacity(relay_req.headers.len() + 2);
    for (name, value) in relay_req.headers.iter() {
      let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader(name.clone(), e.to_string()))?;
      let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(name.clone(), e.to_string()))?;
      headers.append(header_name, header_value);
    }
    if !headers.contains_key(header::USER_AGENT) {
      headers.insert(header::USER_AGENT, HeaderValue::from_static(UPSTREAM_USER_AGENT));
    }

    let body = relay_req.body.and_then(|b| b.into_bytes());
    if body.is_some() && !headers.contains_key(header::CONTENT_TYPE) {
      headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_BODY_CONTENT_TYPE));
    }

    Ok(Self {
      method,
      uri,
      headers,
      body,
    })
  }
}

impl UpstreamRequest {
  /// Build a hyper request to be sent by the forwarder
  pub fn to_request(&self) -> HttpResult<Request<UpstreamBody>> {
    let mut builder = Request::builder().method(self.method.clone()).uri(self.uri.clone());
    if let Some(headers) = builder.headers_mut() {
      headers.extend(self.headers.clone());
    }
    builder
      .body(UpstreamBody::new(self.body.clone().unwrap_or_default()))
      .map_err(|e| HttpError::FailedToGenerateUpstreamRequest(e.to_string()))
  }

  /// Whether a redirect with the given status is followed for this request.
  /// `GET` and `HEAD` follow every redirect status, `POST` only 301/302/303.
  /// Any other combination is handed back to the caller as the upstream response.
  pub fn follows_redirect(&self, status: StatusCode) -> bool {
    if !is_redirection(status) {
      return false;
    }
    match self.method {
      Method::GET | Method::HEAD => true,
      Method::POST => matches!(
        status,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
      ),
      _ => false,
    }
  }

  /// Request to be issued after a followed redirect to `location`.
  /// It is a bodiless `GET`, or `HEAD` for a `HEAD` request, without the headers describing the body.
  pub fn redirected(&self, location: &HeaderValue) -> HttpResult<Self> {
    let location_str = location
      .to_str()
      .map_err(|_| HttpError::InvalidRedirectLocation(String::from_utf8_lossy(location.as_bytes()).into_owned()))?;
    let uri = resolve_location(&self.uri, location_str)?;

    let method = if self.method == Method::HEAD {
      Method::HEAD
    } else {
      Method::GET
    };
    let mut headers = self.headers.clone();
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::CONTENT_TYPE);
    Ok(Self {
      method,
      uri,
      headers,
      body: None,
    })
  }
}

/// Whether the status asks the client to follow `Location`
fn is_redirection(status: StatusCode) -> bool {
  matches!(
    status,
    StatusCode::MOVED_PERMANENTLY
      | StatusCode::FOUND
      | StatusCode::SEE_OTHER
      | StatusCode::TEMPORARY_REDIRECT
      | StatusCode::PERMANENT_REDIRECT
  )
}

/// Parse the target url of a relay request. Only absolute http(s) urls with a host are accepted.
fn parse_target_url(url: &str) -> HttpResult<Uri> {
  let parsed = Url::parse(url).map_err(|e| HttpError::InvalidTargetUrl(url.to_string(), e.to_string()))?;
  into_upstream_uri(parsed).map_err(|reason| HttpError::InvalidTargetUrl(url.to_string(), reason))
}

/// Resolve a `Location` header value against the url of the request that got redirected
fn resolve_location(base: &Uri, location: &str) -> HttpResult<Uri> {
  let invalid = || HttpError::InvalidRedirectLocation(location.to_string());
  let base = Url::parse(&base.to_string()).map_err(|_| invalid())?;
  let joined = base.join(location).map_err(|_| invalid())?;
  into_upstream_uri(joined).map_err(|_| invalid())
}

fn into_upstream_uri(mut url: Url) -> Result<Uri, String> {
  match url.scheme() {
    "http" | "https" => (),
    other => return Err(format!("unsupported scheme '{other}'")),
  }
  if url.host_str().map_or(true, |h| h.is_empty()) {
    return Err("missing host".to_string());
  }
  // fragments are never sent
  url.set_fragment(None);
  url.as_str().parse::<Uri>().map_err(|e| e.to_string())
}
