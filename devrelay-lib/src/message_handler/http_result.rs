use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub(crate) type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong while serving a single request
#[derive(Debug, Error)]
pub enum HttpError {
  // relay-local failures, all of them reported to the caller as 500
  #[error("Failed to read request body: {0}")]
  FailedToReadRequestBody(String),
  #[error("Invalid relay request: {0}")]
  InvalidRelayRequest(String),
  #[error("Invalid target url '{0}': {1}")]
  InvalidTargetUrl(String, String),
  #[error("Invalid method '{0}'")]
  InvalidMethod(String),
  #[error("Invalid header '{0}': {1}")]
  InvalidHeader(String, String),
  #[error("Failed to generate upstream request: {0}")]
  FailedToGenerateUpstreamRequest(String),
  #[error("Failed to get response from upstream: {0}")]
  FailedToGetResponseFromUpstream(String),
  #[error("Failed to read upstream response body: {0}")]
  FailedToReadUpstreamBody(String),
  #[error("Upstream did not respond within {0:?}")]
  UpstreamTimeout(Duration),
  #[error("Invalid redirect location '{0}'")]
  InvalidRedirectLocation(String),

  // method errors
  #[error("Method {0} is not allowed")]
  MethodNotAllowed(http::Method),
  #[error("Method {0} is not implemented")]
  MethodNotImplemented(http::Method),

  // static file errors
  #[error("File not found")]
  NoSuchFile,
  #[error("Path escapes the document root")]
  PathTraversal,

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<&HttpError> for StatusCode {
  fn from(e: &HttpError) -> StatusCode {
    match e {
      HttpError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
      HttpError::MethodNotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
      HttpError::NoSuchFile => StatusCode::NOT_FOUND,
      HttpError::PathTraversal => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}
