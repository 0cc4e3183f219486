use http_body_util::{combinators, BodyExt, Empty, Full};
use hyper::body::Bytes;

/// Type for bodies of responses generated by the playground server and the relay
pub(crate) type ResponseBody = combinators::BoxBody<Bytes, hyper::Error>;

/// Type for bodies of requests sent to upstream by the relay. They are always fully buffered.
pub(crate) type UpstreamBody = Full<Bytes>;

/// helper function to build a empty body
pub(crate) fn empty() -> ResponseBody {
  Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// helper function to build a full body
pub(crate) fn full(body: impl Into<Bytes>) -> ResponseBody {
  Full::new(body.into()).map_err(|never| match never {}).boxed()
}
