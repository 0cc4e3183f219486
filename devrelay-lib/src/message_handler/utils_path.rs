use super::http_result::{HttpError, HttpResult};
use std::{
  fmt::Write,
  path::{Component, Path, PathBuf},
};

/// Map the path of a request uri to a file system path under the document root.
/// The path is percent-decoded, and empty or `.` segments are skipped.
/// A segment that is not a plain file name, e.g. `..`, is rejected.
pub(super) fn resolve_path(document_root: &Path, uri_path: &str) -> HttpResult<PathBuf> {
  let decoded = urlencoding::decode(uri_path).map_err(|_| HttpError::NoSuchFile)?;

  let mut path = document_root.to_path_buf();
  for segment in decoded.split('/') {
    if segment.is_empty() || segment == "." {
      continue;
    }
    if segment.contains('\0') {
      return Err(HttpError::PathTraversal);
    }
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
      (Some(Component::Normal(name)), None) => path.push(name),
      _ => return Err(HttpError::PathTraversal),
    }
  }
  Ok(path)
}

/// Entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ListingEntry {
  pub name: String,
  pub is_dir: bool,
}

/// Render a html page listing the given entries of the directory at `uri_path`
pub(super) fn render_directory_listing(uri_path: &str, mut entries: Vec<ListingEntry>) -> String {
  entries.sort_by_key(|e| e.name.to_lowercase());

  let display_path = urlencoding::decode(uri_path).map_or_else(|_| uri_path.to_string(), |p| p.into_owned());
  let title = format!("Directory listing for {}", html_escape(&display_path));

  let mut html = String::new();
  html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
  let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>");
  for entry in entries.iter() {
    let suffix = if entry.is_dir { "/" } else { "" };
    let _ = writeln!(
      html,
      "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>",
      urlencoding::encode(&entry.name),
      html_escape(&entry.name),
    );
  }
  html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
  html
}

fn html_escape(s: &str) -> String {
  let mut escaped = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#x27;"),
      _ => escaped.push(c),
    }
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_paths_resolve_under_root() {
    let root = Path::new("/srv/playground");
    assert_eq!(resolve_path(root, "/").unwrap(), root);
    assert_eq!(resolve_path(root, "/index.html").unwrap(), root.join("index.html"));
    assert_eq!(
      resolve_path(root, "/css//./style.css").unwrap(),
      root.join("css").join("style.css")
    );
    assert_eq!(
      resolve_path(root, "/my%20file.txt").unwrap(),
      root.join("my file.txt")
    );
  }

  #[test]
  fn parent_segments_are_rejected() {
    let root = Path::new("/srv/playground");
    for p in ["/../etc/passwd", "/a/../../b", "/%2e%2e/secret", "/a/%2E%2E/b", "/nul%00byte"] {
      assert!(
        matches!(resolve_path(root, p), Err(HttpError::PathTraversal)),
        "{p} must be rejected"
      );
    }
  }

  #[test]
  fn listing_is_sorted_escaped_and_linked() {
    let entries = vec![
      ListingEntry {
        name: "b.txt".to_string(),
        is_dir: false,
      },
      ListingEntry {
        name: "A dir".to_string(),
        is_dir: true,
      },
      ListingEntry {
        name: "<script>.js".to_string(),
        is_dir: false,
      },
    ];
    let html = render_directory_listing("/sub%20dir/", entries);
    assert!(html.contains("<title>Directory listing for /sub dir/</title>"));
    let a = html.find("<li><a href=\"A%20dir/\">A dir/</a></li>").unwrap();
    let b = html.find("<li><a href=\"b.txt\">b.txt</a></li>").unwrap();
    let s = html
      .find("<li><a href=\"%3Cscript%3E.js\">&lt;script&gt;.js</a></li>")
      .unwrap();
    // '<' sorts before letters
    assert!(s < a && a < b);
  }
}
