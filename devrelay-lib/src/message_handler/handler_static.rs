use super::{
  http_log::HttpMessageLog,
  http_result::{HttpError, HttpResult},
  synthetic_response::*,
  utils_path::{render_directory_listing, resolve_path, ListingEntry},
  HandleRequest,
};
use crate::{
  constants::INDEX_FILES,
  error::*,
  globals::Globals,
  hyper_ext::body::{empty, full, ResponseBody},
  log::*,
};
use async_trait::async_trait;
use derive_builder::Builder;
use http::{header, request::Parts, HeaderMap, Method, Request, Response, StatusCode};
use hyper::body::Body;
use std::{
  fs::Metadata,
  net::SocketAddr,
  path::Path,
  sync::Arc,
  time::{SystemTime, UNIX_EPOCH},
};

#[derive(Clone, Builder)]
/// HTTP message handler serving files of the document root, i.e., the playground
pub struct StaticFileHandler {
  globals: Arc<Globals>,
}

#[async_trait]
impl HandleRequest for StaticFileHandler {
  async fn handle_request<B>(&self, req: Request<B>, client_addr: SocketAddr) -> DevRelayResult<Response<ResponseBody>>
  where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    let mut log_data = HttpMessageLog::new("playground", &req);
    log_data.client_addr(&client_addr);
    // request bodies are ignored by the playground
    let (parts, _) = req.into_parts();

    let res = match self.serve(&parts).await {
      Ok(res) => res,
      Err(e) => {
        debug!("Playground request for {} failed: {}", parts.uri.path(), e);
        synthetic_error_response(StatusCode::from(&e))?
      }
    };
    log_data.status_code(&res.status()).output();
    Ok(res)
  }
}

impl StaticFileHandler {
  async fn serve(&self, req: &Parts) -> HttpResult<Response<ResponseBody>> {
    let head_only = match req.method {
      Method::GET => false,
      Method::HEAD => true,
      _ => return Err(HttpError::MethodNotImplemented(req.method.clone())),
    };

    let uri_path = req.uri.path();
    let path = resolve_path(&self.globals.server_config.document_root, uri_path)?;
    let metadata = tokio::fs::metadata(&path).await.map_err(|_| HttpError::NoSuchFile)?;

    if !metadata.is_dir() {
      return serve_file(&path, &metadata, &req.headers, head_only).await;
    }

    if !uri_path.ends_with('/') {
      return directory_redirection_response(&req.uri).map_err(|e| HttpError::Other(e.into()));
    }
    for index in INDEX_FILES {
      let index_path = path.join(index);
      if let Ok(index_metadata) = tokio::fs::metadata(&index_path).await {
        if index_metadata.is_file() {
          return serve_file(&index_path, &index_metadata, &req.headers, head_only).await;
        }
      }
    }
    serve_directory_listing(&path, uri_path, head_only).await
  }
}

/// Serve the exact content of a file, or 304 when the copy of the client is fresh
async fn serve_file(
  path: &Path,
  metadata: &Metadata,
  req_headers: &HeaderMap,
  head_only: bool,
) -> HttpResult<Response<ResponseBody>> {
  let modified = metadata.modified().ok();

  if let (Some(modified), Some(since)) = (modified, if_modified_since(req_headers)) {
    if unix_secs(modified) <= unix_secs(since) {
      return not_modified_response().map_err(|e| HttpError::Other(e.into()));
    }
  }

  let content = if head_only {
    Vec::new()
  } else {
    tokio::fs::read(path).await.map_err(|e| {
      warn!("Failed to read {}: {}", path.display(), e);
      HttpError::NoSuchFile
    })?
  };
  let content_length = if head_only {
    metadata.len()
  } else {
    content.len() as u64
  };
  let mime = mime_guess::from_path(path).first_or_octet_stream();

  let mut builder = response_builder(StatusCode::OK)
    .header(header::CONTENT_TYPE, mime.as_ref())
    .header(header::CONTENT_LENGTH, content_length);
  if let Some(modified) = modified {
    builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
  }
  let body = if head_only { empty() } else { full(content) };
  builder.body(body).map_err(|e| HttpError::Other(e.into()))
}

/// Serve a html listing of a directory without index file
async fn serve_directory_listing(dir: &Path, uri_path: &str, head_only: bool) -> HttpResult<Response<ResponseBody>> {
  let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|_| HttpError::NoSuchFile)?;
  let mut entries = Vec::new();
  while let Some(entry) = read_dir.next_entry().await.map_err(|_| HttpError::NoSuchFile)? {
    let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
    entries.push(ListingEntry {
      name: entry.file_name().to_string_lossy().into_owned(),
      is_dir,
    });
  }

  let html = render_directory_listing(uri_path, entries);
  let builder = response_builder(StatusCode::OK)
    .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
    .header(header::CONTENT_LENGTH, html.len());
  let body = if head_only { empty() } else { full(html) };
  builder.body(body).map_err(|e| HttpError::Other(e.into()))
}

fn if_modified_since(req_headers: &HeaderMap) -> Option<SystemTime> {
  let value = req_headers.get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
  httpdate::parse_http_date(value).ok()
}

/// Http dates have a resolution of a second
fn unix_secs(t: SystemTime) -> u64 {
  t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::globals::ServerConfig;
  use http_body_util::{BodyExt, Empty};
  use hyper::body::Bytes;
  use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
  };

  static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

  /// Fresh document root under the temp dir with a few files
  fn document_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!(
      "devrelay-static-{}-{}",
      std::process::id(),
      DIR_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::create_dir_all(root.join("assets")).unwrap();
    std::fs::write(root.join("index.html"), "<h1>playground</h1>").unwrap();
    std::fs::write(root.join("app.js"), "console.log(\"hi\");\n").unwrap();
    std::fs::write(root.join("docs").join("index.htm"), "docs").unwrap();
    std::fs::write(root.join("assets").join("logo.bin"), [0u8, 1, 2, 255]).unwrap();
    std::fs::write(root.join("assets").join("style.css"), "body {}").unwrap();
    root
  }

  fn handler(root: PathBuf) -> StaticFileHandler {
    let globals = Arc::new(Globals {
      server_config: ServerConfig {
        document_root: root,
        ..Default::default()
      },
      runtime_handle: tokio::runtime::Handle::current(),
    });
    StaticFileHandlerBuilder::default().globals(globals).build().unwrap()
  }

  fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
    Request::builder().method(method).uri(uri).body(Empty::new()).unwrap()
  }

  async fn send(handler: &StaticFileHandler, req: Request<Empty<Bytes>>) -> (Response<()>, Bytes) {
    let res = handler
      .handle_request(req, "127.0.0.1:40000".parse().unwrap())
      .await
      .unwrap();
    let (parts, body) = res.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (Response::from_parts(parts, ()), bytes)
  }

  #[tokio::test]
  async fn existing_file_is_served_byte_identical() {
    let root = document_root();
    let handler = handler(root.clone());

    let (res, body) = send(&handler, request(Method::GET, "/assets/logo.bin")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body.as_ref(), &[0u8, 1, 2, 255]);
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "4");
    assert!(res.headers().get(header::LAST_MODIFIED).is_some());

    let (res, body) = send(&handler, request(Method::GET, "/app.js")).await;
    assert_eq!(body, std::fs::read(root.join("app.js")).unwrap());
    assert!(res
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap()
      .contains("javascript"));

    let (res, _) = send(&handler, request(Method::GET, "/assets/style.css?v=3")).await;
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");
  }

  #[tokio::test]
  async fn missing_or_escaping_paths_are_not_found() {
    let handler = handler(document_root());
    for uri in ["/nope.html", "/assets/missing/deeper", "/../etc/passwd", "/assets/%2e%2e/%2e%2e/x"] {
      let (res, _) = send(&handler, request(Method::GET, uri)).await;
      assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
  }

  #[tokio::test]
  async fn root_serves_index_and_directories_redirect() {
    let handler = handler(document_root());

    let (res, body) = send(&handler, request(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body.as_ref(), b"<h1>playground</h1>");
    assert!(res
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap()
      .starts_with("text/html"));

    let (res, _) = send(&handler, request(Method::GET, "/docs")).await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/docs/");

    let (res, body) = send(&handler, request(Method::GET, "/docs/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body.as_ref(), b"docs");
  }

  #[tokio::test]
  async fn directory_without_index_is_listed() {
    let handler = handler(document_root());
    let (res, body) = send(&handler, request(Method::GET, "/assets/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Directory listing for /assets/"));
    assert!(html.contains("<a href=\"logo.bin\">logo.bin</a>"));
    assert!(html.contains("<a href=\"style.css\">style.css</a>"));
  }

  #[tokio::test]
  async fn head_has_headers_but_no_body() {
    let handler = handler(document_root());
    let (res, body) = send(&handler, request(Method::HEAD, "/app.js")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(res.headers().get(header::CONTENT_LENGTH).unwrap(), "19");
  }

  #[tokio::test]
  async fn fresh_copy_gets_not_modified() {
    let handler = handler(document_root());
    let (res, _) = send(&handler, request(Method::GET, "/app.js")).await;
    let last_modified = res.headers().get(header::LAST_MODIFIED).unwrap().clone();

    let req = Request::builder()
      .uri("/app.js")
      .header(header::IF_MODIFIED_SINCE, last_modified)
      .body(Empty::new())
      .unwrap();
    let (res, body) = send(&handler, req).await;
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    assert!(body.is_empty());

    let req = Request::builder()
      .uri("/app.js")
      .header(header::IF_MODIFIED_SINCE, "Thu, 01 Jan 1970 00:00:00 GMT")
      .body(Empty::new())
      .unwrap();
    let (res, _) = send(&handler, req).await;
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn other_methods_are_not_implemented() {
    let handler = handler(document_root());
    let (res, _) = send(&handler, request(Method::POST, "/index.html")).await;
    assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);
  }
}
