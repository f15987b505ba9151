//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body logged at the `debug` level. Password fields in JSON
/// bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    let is_json = headers.headers.get(CONTENT_TYPE)
        == Some(&"application/json".parse().expect("valid header value"));
    if is_json {
        let display_text = redact_json_field(&body_text, "password");
        let display_text = redact_json_field(&display_text, "currentPassword");
        let display_text = redact_json_field(&display_text, "newPassword");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the string value of `field_name` in a JSON body with asterisks.
///
/// This is a textual redaction, not a JSON parse; a value containing an
/// escaped quote is truncated at the escape, which is fine for logging.
fn redact_json_field(body: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");
    let Some(field_start) = body.find(&needle) else {
        return body.to_owned();
    };

    let rest = &body[field_start + needle.len()..];
    let Some(colon) = rest.find(':') else {
        return body.to_owned();
    };
    let after_colon = &rest[colon + 1..];
    let Some(quote) = after_colon.find('"') else {
        return body.to_owned();
    };
    let value_start = field_start + needle.len() + colon + 1 + quote + 1;
    let Some(value_length) = body[value_start..].find('"') else {
        return body.to_owned();
    };

    format!(
        "{}********{}",
        &body[..value_start],
        &body[value_start + value_length..]
    )
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}
