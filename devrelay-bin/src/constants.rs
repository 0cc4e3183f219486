/// Thread name prefix of the tokio runtime
pub const RUNTIME_THREAD_NAME: &str = "devrelay";
