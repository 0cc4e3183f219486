use super::toml::ConfigToml;
use clap::Arg;
use devrelay_lib::ServerConfig;

/// Parsed options
pub struct Opts {
  pub config_file_path: Option<String>,
}

/// Parse arg values passed from cli
pub fn parse_opts() -> Result<Opts, anyhow::Error> {
  let _ = include_str!("../../Cargo.toml");
  let options = clap::command!().arg(
    Arg::new("config_file")
      .long("config")
      .short('c')
      .value_name("FILE")
      .help("Configuration file path like ./config.toml. Without it, built-in defaults are used"),
  );
  let matches = options.try_get_matches()?;

  ///////////////////////////////////
  let config_file_path = matches.get_one::<String>("config_file").cloned();

  Ok(Opts { config_file_path })
}

/// Build the server configuration from the optional config file
pub fn build_settings(config_file_path: Option<&str>) -> Result<ServerConfig, anyhow::Error> {
  let config_toml = match config_file_path {
    Some(path) => ConfigToml::new(path)?,
    None => ConfigToml::default(),
  };
  (&config_toml).try_into()
}
