use axum::extract::Request;
use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::middleware::Next;
use axum::response::Response;

/// Middleware that stamps the response-header contract onto every reply:
/// no caching of API responses, plus the fixed CORS trio.
pub async fn response_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );

    response
}

/// Handler dispatch deadline. An elapsed handler renders the internal
/// error envelope instead of stalling the connection.
pub async fn dispatch_deadline(request: Request, next: Next) -> Response {
    use axum::response::IntoResponse;

    use crate::error::AppError;
    use crate::server::DISPATCH_TIMEOUT;

    match tokio::time::timeout(DISPATCH_TIMEOUT, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!("handler exceeded the dispatch deadline");
            AppError::internal("handler deadline exceeded").into_response()
        }
    }
}
