use hyper::http::Uri;

use crate::error::{Error, ErrorType};

/// Produce the canonical absolute form of a forwarded request path: `//`
/// runs collapse, `.` and `..` segments resolve against a virtual root, the
/// trailing slash survives iff the input carried one. The rule patterns can
/// therefore assume a leading `/`, no `..` and no empty segments.
///
/// # Errors
///
/// Returns `MalformedPath` when the input is not a parseable URI reference.
pub fn normalize_path(raw: &str) -> Result<String, Error> {
    let uri: Uri = raw.parse().map_err(|_| ErrorType::MalformedPath {
        path: raw.to_string(),
    })?;
    let path = uri.path();

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    normalized.push('/');
    normalized.push_str(&segments.join("/"));
    if path.ends_with('/') && normalized.len() > 1 {
        normalized.push('/');
    }

    Ok(normalized)
}
