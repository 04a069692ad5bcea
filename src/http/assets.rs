//! Static asset serving.
//!
//! # Responsibilities
//! - Serve alias files and mount contents
//! - Refuse paths that climb out of a mount root
//! - Keep directory redirects inside the mount's URL space
//!
//! # Design Decisions
//! - File streaming, content types and conditional requests come from `tower-http`
//! - Files are opened per request and closed when the body is dropped
//! - Unreadable files answer 404, the same as missing ones

use axum::{
    body::Body,
    http::{header, uri::PathAndQuery, HeaderValue, Request, Uri},
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::http::response::{forbidden, not_found};
use crate::routing::{Alias, Mount, StaticTarget};

/// Serve a request that classified as static.
pub async fn serve(target: StaticTarget<'_>, req: Request<Body>) -> Response {
    match target {
        StaticTarget::Alias(alias) => serve_alias(alias, req).await,
        StaticTarget::Mount { mount, remainder } => serve_mount(mount, remainder, req).await,
    }
}

async fn serve_alias(alias: &Alias, req: Request<Body>) -> Response {
    match ServeFile::new(alias.file()).oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

async fn serve_mount(mount: &Mount, remainder: &str, mut req: Request<Body>) -> Response {
    if !is_contained(remainder) {
        tracing::warn!(
            path = %req.uri().path(),
            mount = mount.prefix(),
            "Rejected path escaping mount root"
        );
        return forbidden();
    }

    // `/uv` for the `/uv/` mount: relative URLs in the index only resolve
    // against the slash form.
    if remainder.is_empty() && !req.uri().path().ends_with('/') {
        if mount.indexable() {
            return Redirect::permanent(mount.prefix()).into_response();
        }
        return not_found();
    }

    let local = match local_uri(remainder, req.uri().query()) {
        Some(uri) => uri,
        None => return forbidden(),
    };
    *req.uri_mut() = local;

    let service = ServeDir::new(mount.root()).append_index_html_on_directories(mount.indexable());
    let mut response = match service.oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status().is_redirection() {
        remount_location(&mut response, mount.prefix());
    }
    response
}

/// True if `remainder` stays inside the mount root once decoded.
pub fn is_contained(remainder: &str) -> bool {
    let Ok(decoded) = percent_decode_str(remainder).decode_utf8() else {
        return false;
    };
    if decoded.contains('\\') || decoded.contains('\0') {
        return false;
    }
    !decoded.split('/').any(|segment| segment == "..")
}

fn local_uri(remainder: &str, query: Option<&str>) -> Option<Uri> {
    let path_and_query = match query {
        Some(query) => format!("/{}?{}", remainder, query),
        None => format!("/{}", remainder),
    };
    let path_and_query = PathAndQuery::try_from(path_and_query).ok()?;
    Uri::builder().path_and_query(path_and_query).build().ok()
}

/// `ServeDir` redirects relative to the stripped path; put the prefix back.
fn remount_location(response: &mut Response, prefix: &str) {
    let Some(location) = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
    else {
        return;
    };
    if !location.starts_with('/') {
        return;
    }

    let remounted = format!("{}{}", prefix.trim_end_matches('/'), location);
    if let Ok(value) = HeaderValue::from_str(&remounted) {
        response.headers_mut().insert(header::LOCATION, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn containment() {
        assert!(is_contained("uv.bundle.js"));
        assert!(is_contained("nested/dir/file.js"));
        assert!(is_contained(""));
        assert!(is_contained("..hidden"));
        assert!(!is_contained("../secret"));
        assert!(!is_contained("a/../../secret"));
        assert!(!is_contained("%2e%2e/secret"));
        assert!(!is_contained("a/%2E%2E/b"));
        assert!(!is_contained("..%5csecret"));
        assert!(!is_contained("file%00.js"));
        assert!(!is_contained("%ff"));
    }

    #[test]
    fn local_uri_keeps_query() {
        let uri = local_uri("dir/file.js", Some("v=2")).unwrap();
        assert_eq!(uri, "/dir/file.js?v=2");
    }

    #[test]
    fn redirect_location_gets_prefix() {
        let mut response = Redirect::permanent("/sub/").into_response();
        remount_location(&mut response, "/uv/");
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/uv/sub/");

        let mut response = Redirect::permanent("/sub/").into_response();
        remount_location(&mut response, "/");
        assert_eq!(response.headers()[header::LOCATION], "/sub/");
    }
}
