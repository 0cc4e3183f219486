mod body_type;

pub(crate) mod body {
  pub(crate) use super::body_type::{empty, full, ResponseBody, UpstreamBody};
}
