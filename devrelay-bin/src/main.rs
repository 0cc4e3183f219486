#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod config;
mod constants;
mod error;
mod log;

use crate::{
  config::{build_settings, parse_opts},
  constants::RUNTIME_THREAD_NAME,
  error::Context,
  log::*,
};
use devrelay_lib::{entrypoint, ServerConfig};
use tokio_util::sync::CancellationToken;

fn main() {
  init_logger();

  let parsed_opts = match parse_opts() {
    Ok(opts) => opts,
    Err(e) => {
      // --help and --version end up here as well
      if let Some(clap_error) = e.downcast_ref::<clap::Error>() {
        clap_error.exit();
      }
      error!("Invalid options: {e}");
      std::process::exit(1);
    }
  };

  let server_config = match build_settings(parsed_opts.config_file_path.as_deref()) {
    Ok(v) => v,
    Err(e) => {
      error!("Invalid configuration: {e:#}");
      std::process::exit(1);
    }
  };

  let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
  runtime_builder.enable_all();
  runtime_builder.thread_name(RUNTIME_THREAD_NAME);
  let runtime = match runtime_builder.build().context("Failed to build tokio runtime") {
    Ok(runtime) => runtime,
    Err(e) => {
      error!("{e:#}");
      std::process::exit(1);
    }
  };

  runtime.block_on(async {
    if let Err(e) = devrelay_service(&server_config, runtime.handle().clone()).await {
      error!("devrelay service exited: {e:#}");
      std::process::exit(1);
    }
  });
}

async fn devrelay_service(server_config: &ServerConfig, runtime_handle: tokio::runtime::Handle) -> Result<(), anyhow::Error> {
  info!("Start devrelay service");
  info!("Playground: http://{}/", server_config.playground_listen_socket);
  info!("Relay:      http://{}/", server_config.relay_listen_socket);

  let cancel_token = CancellationToken::new();
  let service = entrypoint(server_config, &runtime_handle, cancel_token.clone());
  tokio::pin!(service);

  tokio::select! {
    res = &mut service => res.map_err(|e| anyhow::anyhow!(e)),
    _ = tokio::signal::ctrl_c() => {
      info!("Received Ctrl-C, shutting down");
      cancel_token.cancel();
      service.await.map_err(|e| anyhow::anyhow!(e))
    }
  }
}
