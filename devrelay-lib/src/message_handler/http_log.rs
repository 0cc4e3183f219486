use crate::{constants::log_event_names::ACCESS_LOG, log::*};
use http::header;
use std::net::SocketAddr;

/// Struct to log HTTP messages, one line per served request
#[derive(Debug, Clone)]
pub struct HttpMessageLog {
  pub service: &'static str,
  pub client_addr: String,
  pub method: String,
  pub host: String,
  pub p_and_q: String,
  pub version: http::Version,
  pub ua: String,
  pub status: String,
  pub upstream: String,
}

impl HttpMessageLog {
  pub fn new<T>(service: &'static str, req: &http::Request<T>) -> Self {
    let header_mapper = |v: header::HeaderName| {
      req
        .headers()
        .get(v)
        .map_or_else(|| "", |s| s.to_str().unwrap_or(""))
        .to_string()
    };
    Self {
      service,
      client_addr: "".to_string(),
      method: req.method().to_string(),
      host: header_mapper(header::HOST),
      p_and_q: req.uri().path_and_query().map_or_else(|| "", |v| v.as_str()).to_string(),
      version: req.version(),
      ua: header_mapper(header::USER_AGENT),
      status: "".to_string(),
      upstream: "".to_string(),
    }
  }

  pub fn client_addr(&mut self, client_addr: &SocketAddr) -> &mut Self {
    // ipv4-mapped ipv6 addresses are logged as plain ipv4
    self.client_addr = SocketAddr::new(client_addr.ip().to_canonical(), client_addr.port()).to_string();
    self
  }
  pub fn status_code(&mut self, status_code: &http::StatusCode) -> &mut Self {
    self.status = status_code.to_string();
    self
  }
  pub fn upstream(&mut self, upstream: &http::Uri) -> &mut Self {
    self.upstream = upstream.to_string();
    self
  }

  pub fn output(&self) {
    info!(target: ACCESS_LOG, "{}", self);
  }
}

impl std::fmt::Display for HttpMessageLog {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "[{}] {} <- {} -- {} {} {:?} -- {} \"{}\"",
      self.service, self.host, self.client_addr, self.method, self.p_and_q, self.version, self.status, self.ua,
    )?;
    if !self.upstream.is_empty() {
      write!(f, " -> {}", self.upstream)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn log_line_includes_upstream_only_when_set() {
    let req = http::Request::builder()
      .method("POST")
      .uri("/relay?x=1")
      .header(header::HOST, "localhost:8766")
      .header(header::USER_AGENT, "test-agent")
      .body(())
      .unwrap();
    let mut log = HttpMessageLog::new("relay", &req);
    log
      .client_addr(&"[::ffff:127.0.0.1]:50000".parse().unwrap())
      .status_code(&http::StatusCode::OK);
    let line = log.to_string();
    assert!(line.starts_with("[relay] localhost:8766 <- 127.0.0.1:50000 -- POST /relay?x=1"));
    assert!(line.contains("-- 200 OK \"test-agent\""));
    assert!(!line.contains("->"));

    log.upstream(&"http://example.com/api".parse().unwrap());
    assert!(log.to_string().ends_with("-> http://example.com/api"));
  }
}
