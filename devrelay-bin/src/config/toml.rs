use crate::error::{anyhow, ensure, Context};
use devrelay_lib::ServerConfig;
use serde::Deserialize;
use std::{fs, net::IpAddr, path::PathBuf};
use tokio::time::Duration;

/// Contents of the config file. Every key is optional; missing ones keep the defaults.
#[derive(Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
  pub listen_address: Option<String>,
  pub playground_port: Option<u16>,
  pub relay_port: Option<u16>,
  pub document_root: Option<String>,
  pub upstream_timeout_sec: Option<u64>,
  pub max_redirects: Option<usize>,
  pub max_request_body_size: Option<usize>,
  pub max_clients: Option<usize>,
}

impl TryInto<ServerConfig> for &ConfigToml {
  type Error = anyhow::Error;

  fn try_into(self) -> std::result::Result<ServerConfig, Self::Error> {
    let mut server_config = ServerConfig::default();

    // listen address and ports
    if let Some(addr) = &self.listen_address {
      let ip = addr
        .parse::<IpAddr>()
        .map_err(|e| anyhow!("Invalid listen_address '{addr}': {e}"))?;
      server_config.playground_listen_socket.set_ip(ip);
      server_config.relay_listen_socket.set_ip(ip);
    }
    if let Some(port) = self.playground_port {
      server_config.playground_listen_socket.set_port(port);
    }
    if let Some(port) = self.relay_port {
      server_config.relay_listen_socket.set_port(port);
    }
    ensure!(
      server_config.playground_listen_socket.port() != server_config.relay_listen_socket.port(),
      "playground_port and relay_port must be different"
    );

    // document root
    if let Some(root) = &self.document_root {
      server_config.document_root = PathBuf::from(root);
    }
    ensure!(
      server_config.document_root.is_dir(),
      "document_root {} is not an existing directory",
      server_config.document_root.display()
    );

    // relay limits
    if let Some(timeout) = self.upstream_timeout_sec {
      ensure!(timeout > 0, "upstream_timeout_sec must be positive");
      server_config.upstream_timeout = Duration::from_secs(timeout);
    }
    if let Some(max_redirects) = self.max_redirects {
      server_config.max_redirects = max_redirects;
    }
    if let Some(size) = self.max_request_body_size {
      ensure!(size > 0, "max_request_body_size must be positive");
      server_config.max_request_body_size = size;
    }
    if let Some(max_clients) = self.max_clients {
      ensure!(max_clients > 0, "max_clients must be positive");
      server_config.max_clients = max_clients;
    }

    Ok(server_config)
  }
}

impl ConfigToml {
  pub fn new(config_file: &str) -> std::result::Result<Self, anyhow::Error> {
    let config_str =
      fs::read_to_string(config_file).with_context(|| format!("Failed to read config file {config_file}"))?;

    toml::from_str(&config_str).map_err(|e| anyhow!(e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(s: &str) -> ConfigToml {
    toml::from_str(s).unwrap()
  }

  #[test]
  fn empty_config_keeps_defaults() {
    let server_config: ServerConfig = (&ConfigToml::default()).try_into().unwrap();
    assert_eq!(server_config, ServerConfig::default());
    assert_eq!(server_config.playground_listen_socket.to_string(), "127.0.0.1:8765");
    assert_eq!(server_config.relay_listen_socket.to_string(), "127.0.0.1:8766");
  }

  #[test]
  fn values_override_defaults() {
    let root = std::env::temp_dir();
    let config = parse(&format!(
      r#"
listen_address = "::1"
playground_port = 9000
relay_port = 9001
document_root = "{}"
upstream_timeout_sec = 5
max_redirects = 0
max_request_body_size = 1024
max_clients = 8
"#,
      root.display()
    ));
    let server_config: ServerConfig = (&config).try_into().unwrap();
    assert_eq!(server_config.playground_listen_socket.to_string(), "[::1]:9000");
    assert_eq!(server_config.relay_listen_socket.to_string(), "[::1]:9001");
    assert_eq!(server_config.document_root, root);
    assert_eq!(server_config.upstream_timeout, Duration::from_secs(5));
    assert_eq!(server_config.max_redirects, 0);
    assert_eq!(server_config.max_request_body_size, 1024);
    assert_eq!(server_config.max_clients, 8);
  }

  #[test]
  fn same_ports_are_rejected() {
    let config = parse("playground_port = 9000\nrelay_port = 9000\n");
    let res: Result<ServerConfig, _> = (&config).try_into();
    assert!(res.is_err());

    // the relay default collides as well
    let config = parse("playground_port = 8766\n");
    let res: Result<ServerConfig, _> = (&config).try_into();
    assert!(res.is_err());
  }

  #[test]
  fn invalid_values_are_rejected() {
    for s in [
      "listen_address = \"localhost:80\"\n",
      "document_root = \"/nonexistent/devrelay/root\"\n",
      "upstream_timeout_sec = 0\n",
    ] {
      let res: Result<ServerConfig, _> = (&parse(s)).try_into();
      assert!(res.is_err(), "{s}");
    }
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(toml::from_str::<ConfigToml>("listen_port = 8080\n").is_err());
  }
}
