//! Liveness endpoint.

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};

pub const HEALTHZ_ROUTE: &str = "/healthz";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// `GET` answers `ok`, anything but `GET`/`HEAD` is 405.
///
/// `HEAD` shares the `GET` response; the router strips the body and keeps
/// the headers, `content-length` included.
pub async fn healthz(method: Method) -> Response {
    match method {
        Method::GET | Method::HEAD => ([(header::CONTENT_TYPE, TEXT_PLAIN)], "ok\n").into_response(),
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            [
                (header::ALLOW, "GET, HEAD"),
                (header::CONTENT_TYPE, TEXT_PLAIN),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            "method not allowed\n",
        )
            .into_response(),
    }
}
