//! Admin authentication middleware.
//!
//! The admin and scanner surfaces share one static passcode presented in the
//! `X-Admin-Key` header. Presented and expected values are compared by their
//! sha-256 digests.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;

/// Header carrying the admin passcode.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Middleware that requires the admin passcode.
///
/// Rejects requests without a matching `X-Admin-Key` header with `401`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if shared::crypto::secrets_match(key, &state.config.admin.passcode) => {
            next.run(req).await
        }
        _ => unauthorized_response("Invalid or missing admin key"),
    }
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message,
            "details": null
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Invalid or missing admin key");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unauthorized_response_empty_message() {
        let response = unauthorized_response("");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_admin_key_header_name() {
        assert_eq!(ADMIN_KEY_HEADER, "X-Admin-Key");
    }
}
