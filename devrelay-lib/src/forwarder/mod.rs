mod client;

use crate::hyper_ext::body::UpstreamBody;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;

/// Forwarder used by the relay: plaintext http or https via rustls to any host
pub(crate) type Forwarder = client::Forwarder<HttpsConnector<HttpConnector>, UpstreamBody>;

pub(crate) use client::{error_chain, ForwardRequest};
