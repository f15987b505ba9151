//! The JSON envelope that every endpoint wraps its responses in.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The envelope for successful responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    data: T,
    message: String,
    success: bool,
}

/// The envelope for failed responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiFailure {
    status_code: u16,
    message: String,
    success: bool,
}

/// Wrap `data` in the success envelope and render it as a JSON response.
pub fn render_json<T: Serialize>(status_code: StatusCode, data: T, message: &str) -> Response {
    (
        status_code,
        Json(ApiResponse {
            status_code: status_code.as_u16(),
            data,
            message: message.to_owned(),
            success: true,
        }),
    )
        .into_response()
}

/// Wrap an error `message` in the failure envelope and render it as a JSON response.
pub fn render_failure(status_code: StatusCode, message: &str) -> Response {
    (
        status_code,
        Json(ApiFailure {
            status_code: status_code.as_u16(),
            message: message.to_owned(),
            success: false,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod envelope_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use super::{render_failure, render_json};

    async fn response_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");

        serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
    }

    #[tokio::test]
    async fn success_envelope_has_camel_case_fields() {
        let response = render_json(StatusCode::CREATED, [1, 2, 3], "Created.");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_body(response).await;
        assert_eq!(
            body,
            json!({
                "statusCode": 201,
                "data": [1, 2, 3],
                "message": "Created.",
                "success": true,
            })
        );
    }

    #[tokio::test]
    async fn failure_envelope_has_no_data() {
        let response = render_failure(StatusCode::BAD_REQUEST, "nope");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_body(response).await;
        assert_eq!(
            body,
            json!({
                "statusCode": 400,
                "message": "nope",
                "success": false,
            })
        );
    }
}
