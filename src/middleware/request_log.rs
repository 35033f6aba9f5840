use std::time::Instant;

use axum::{
    body::{Body, HttpBody, to_bytes},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

/// Largest error body copied into the log.
const LOGGED_BODY_LIMIT: usize = 1024;

pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let elapsed = started.elapsed();

    if !status.is_server_error() {
        info!("{} {} -> {} in {:?}", method, path, status, elapsed);
        return response;
    }

    // Only bodies of a known, small size are buffered; the rest pass through.
    let loggable = response
        .body()
        .size_hint()
        .exact()
        .is_some_and(|len| len <= LOGGED_BODY_LIMIT as u64);
    if !loggable {
        error!(
            "{} {} -> {} in {:?}, body too large to log",
            method, path, status, elapsed
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, LOGGED_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            error!("{} {} -> {}, unreadable body: {}", method, path, status, e);
            return Response::from_parts(parts, Body::empty());
        }
    };
    error!(
        "{} {} -> {} in {:?}, body: {}",
        method,
        path,
        status,
        elapsed,
        String::from_utf8_lossy(&bytes)
    );

    // body is rebuilt below, let hyper recompute the length
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
