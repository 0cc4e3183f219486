pub const RESPONSE_HEADER_SERVER: &str = concat!("devrelay/", env!("CARGO_PKG_VERSION"));
pub const UPSTREAM_USER_AGENT: &str = concat!("devrelay/", env!("CARGO_PKG_VERSION"));

pub const LISTEN_ADDRESS: &str = "127.0.0.1";
pub const PLAYGROUND_PORT: u16 = 8765;
pub const RELAY_PORT: u16 = 8766;
pub const DOCUMENT_ROOT: &str = ".";

pub const TCP_LISTEN_BACKLOG: u32 = 1024;
pub const PROXY_IDLE_TIMEOUT_SEC: u64 = 20;
pub const UPSTREAM_TIMEOUT_SEC: u64 = 30;
pub const UPSTREAM_IDLE_TIMEOUT_SEC: u64 = 20;
pub const MAX_CLIENTS: usize = 512;
pub const MAX_CONCURRENT_STREAMS: u32 = 64;
/// Number of upstream redirects followed before the redirect itself is returned
pub const MAX_REDIRECTS: usize = 10;
pub const MAX_REQUEST_BODY_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Files tried in order when a directory is requested
pub const INDEX_FILES: &[&str] = &["index.html", "index.htm"];

/// Cross-origin headers attached to every relay response
pub mod cors {
  pub const ALLOW_ORIGIN: &str = "*";
  pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
  pub const ALLOW_HEADERS: &str = "Content-Type";
}

/// Logging event name
pub mod log_event_names {
  /// access log
  pub const ACCESS_LOG: &str = "devrelay::access";
}
