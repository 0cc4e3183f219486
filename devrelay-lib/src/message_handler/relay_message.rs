use super::http_result::HttpError;
use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Request described by the browser in the body of a `POST` to the relay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayRequest {
  pub url: String,
  #[serde(default)]
  pub method: Option<String>,
  #[serde(default, deserialize_with = "deserialize_header_values")]
  pub headers: HashMap<String, String>,
  #[serde(default)]
  pub body: Option<RelayBody>,
}

impl RelayRequest {
  /// Method of the outbound request, `GET` when not given
  pub fn method(&self) -> &str {
    self.method.as_deref().unwrap_or("GET")
  }
}

/// Header values may be given as strings, numbers or booleans. The latter two are sent in their JSON text form.
fn deserialize_header_values<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = HashMap::<String, Value>::deserialize(deserializer)?;
  raw
    .into_iter()
    .map(|(name, value)| match value {
      Value::String(s) => Ok((name, s)),
      Value::Number(n) => Ok((name, n.to_string())),
      Value::Bool(b) => Ok((name, b.to_string())),
      other => Err(de::Error::custom(format!(
        "header '{name}' must be a string, number or boolean, got {other}"
      ))),
    })
    .collect()
}

/// Outbound body, either text or raw bytes given as an array of integers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RelayBody {
  Text(String),
  Binary(Vec<u8>),
}

impl RelayBody {
  /// Bytes to be sent upstream. Text is encoded as UTF-8. An empty body counts as no body.
  pub fn into_bytes(self) -> Option<Bytes> {
    let bytes = match self {
      RelayBody::Text(text) => Bytes::from(text),
      RelayBody::Binary(bin) => Bytes::from(bin),
    };
    (!bytes.is_empty()).then_some(bytes)
  }
}

/// Status and body returned to the browser, either from upstream or from a relay-local failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
  pub status: u16,
  pub body: String,
}

impl RelayResponse {
  /// Builds the response from an upstream reply. Bytes that are not valid UTF-8 are replaced.
  pub fn from_upstream(status: http::StatusCode, body: &[u8]) -> Self {
    Self {
      status: status.as_u16(),
      body: String::from_utf8_lossy(body).into_owned(),
    }
  }
}

impl From<&HttpError> for RelayResponse {
  fn from(e: &HttpError) -> Self {
    Self {
      status: http::StatusCode::from(e).as_u16(),
      body: e.to_string(),
    }
  }
}
