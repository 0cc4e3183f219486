use super::relay_message::RelayResponse;
use crate::{
  constants::{cors, RESPONSE_HEADER_SERVER},
  error::*,
  hyper_ext::body::{empty, full, ResponseBody},
};
use http::{header, response::Builder, Response, StatusCode, Uri};

/// Response builder with the headers shared by every response
pub(super) fn response_builder(status_code: StatusCode) -> Builder {
  Response::builder()
    .status(status_code)
    .header(header::SERVER, RESPONSE_HEADER_SERVER)
}

/////////////////////////////////////////
// Relay responses, all carrying CORS headers

/// Attach the permissive cross-origin headers
fn with_cors_headers(builder: Builder) -> Builder {
  builder
    .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, cors::ALLOW_ORIGIN)
    .header(header::ACCESS_CONTROL_ALLOW_METHODS, cors::ALLOW_METHODS)
    .header(header::ACCESS_CONTROL_ALLOW_HEADERS, cors::ALLOW_HEADERS)
}

/// Response to a CORS preflight: 200 with headers only
pub(super) fn preflight_response() -> DevRelayResult<Response<ResponseBody>> {
  let res = with_cors_headers(response_builder(StatusCode::OK)).body(empty())?;
  Ok(res)
}

/// Response carrying a serialized `{status, body}` object
pub(super) fn relay_json_response(
  status_code: StatusCode,
  relay_res: &RelayResponse,
) -> DevRelayResult<Response<ResponseBody>> {
  let json = serde_json::to_vec(relay_res)?;
  let res = with_cors_headers(response_builder(status_code))
    .header(header::CONTENT_TYPE, "application/json")
    .body(full(json))?;
  Ok(res)
}

/// Response to a method the relay does not serve
pub(super) fn relay_method_not_allowed_response(relay_res: &RelayResponse) -> DevRelayResult<Response<ResponseBody>> {
  let mut res = relay_json_response(StatusCode::METHOD_NOT_ALLOWED, relay_res)?;
  res
    .headers_mut()
    .insert(header::ALLOW, header::HeaderValue::from_static("OPTIONS, POST"));
  Ok(res)
}

/////////////////////////////////////////
// Playground responses

/// build http response with status code of 4xx and 5xx
pub(super) fn synthetic_error_response(status_code: StatusCode) -> DevRelayResult<Response<ResponseBody>> {
  let message = format!(
    "{} {}\n",
    status_code.as_u16(),
    status_code.canonical_reason().unwrap_or("Error")
  );
  let res = response_builder(status_code)
    .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
    .body(full(message))?;
  Ok(res)
}

/// Generate a redirection to the same path with a trailing slash, for directories requested without it
pub(super) fn directory_redirection_response(uri: &Uri) -> DevRelayResult<Response<ResponseBody>> {
  let location = match uri.query() {
    Some(q) => format!("{}/?{}", uri.path(), q),
    None => format!("{}/", uri.path()),
  };
  let res = response_builder(StatusCode::MOVED_PERMANENTLY)
    .header(header::LOCATION, location)
    .header(header::CONTENT_LENGTH, 0)
    .body(empty())?;
  Ok(res)
}

/// 304 for a conditional request whose copy is still fresh
pub(super) fn not_modified_response() -> DevRelayResult<Response<ResponseBody>> {
  let res = response_builder(StatusCode::NOT_MODIFIED).body(empty())?;
  Ok(res)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_cors_headers<B>(res: &Response<B>) {
    let headers = res.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
      headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
      "GET, POST, OPTIONS"
    );
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "Content-Type");
  }

  #[test]
  fn relay_responses_carry_cors_headers() {
    let preflight = preflight_response().unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);
    assert_cors_headers(&preflight);

    let relay_res = RelayResponse {
      status: 500,
      body: "boom".to_string(),
    };
    let json = relay_json_response(StatusCode::INTERNAL_SERVER_ERROR, &relay_res).unwrap();
    assert_eq!(json.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert_cors_headers(&json);

    let not_allowed = relay_method_not_allowed_response(&relay_res).unwrap();
    assert_eq!(not_allowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(not_allowed.headers().get(header::ALLOW).unwrap(), "OPTIONS, POST");
    assert_cors_headers(&not_allowed);
  }

  #[test]
  fn directory_redirection_keeps_query() {
    let uri: Uri = "/docs?lang=en".parse().unwrap();
    let res = directory_redirection_response(&uri).unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/docs/?lang=en");

    let uri: Uri = "/docs".parse().unwrap();
    let res = directory_redirection_response(&uri).unwrap();
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/docs/");
  }
}
