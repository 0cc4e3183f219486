use std::net::SocketAddr;
use thiserror::Error;

pub type DevRelayResult<T> = std::result::Result<T, DevRelayError>;

/// Describes things that can go wrong in the listeners and their setup
#[derive(Debug, Error)]
pub enum DevRelayError {
  // general errors
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  // startup errors
  #[error("Failed to bind TCP socket {0}: {1}")]
  FailedToBindTcpSocket(SocketAddr, std::io::Error),
  #[error("Invalid document root: {0}")]
  InvalidDocumentRoot(String),
  #[error("Failed to build static file handler: {0}")]
  FailedToBuildStaticFileHandler(#[from] crate::message_handler::StaticFileHandlerBuilderError),
  #[error("Failed to build relay handler: {0}")]
  FailedToBuildRelayHandler(#[from] crate::message_handler::RelayHandlerBuilderError),
  #[error("Failed to build {0} listener: {1}")]
  FailedToBuildProxy(&'static str, String),

  // serving errors
  #[error("Failed to accept TCP connection on {0}: {1}")]
  FailedToAccept(SocketAddr, std::io::Error),
  #[error("Listener task failed: {0}")]
  ListenerTaskFailed(#[from] tokio::task::JoinError),

  // forwarder errors
  #[error("Failed to fetch from upstream: {0}")]
  FailedToFetchFromUpstream(String),

  // http message errors
  #[error("Failed to build http response: {0}")]
  FailedToBuildResponse(#[from] http::Error),
  #[error("Failed to serialize relay response: {0}")]
  FailedToSerializeRelayResponse(#[from] serde_json::Error),
}
