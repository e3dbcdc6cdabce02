use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = %self, "Request failed");

        let code = self.code();
        match self {
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, Some(msg)),
            AppError::InvalidProof(_) => error_resp(StatusCode::UNAUTHORIZED, code, None),
            AppError::NoSession | AppError::InvalidSession(_) | AppError::Revoked => {
                error_resp(StatusCode::UNAUTHORIZED, code, None)
            }
            AppError::ProviderUnavailable(_) => {
                error_resp(StatusCode::SERVICE_UNAVAILABLE, code, None)
            }
            AppError::Configuration(_) | AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code, "message": msg }),
        None => serde_json::json!({ "code": code }),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_input_is_400_with_message() {
        let response = AppError::InvalidInput("idToken is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_INPUT");
        assert_eq!(body["message"], "idToken is required");
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let response = AppError::Configuration("private key unreadable".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_provider_outage_is_503() {
        let response = AppError::ProviderUnavailable("timeout".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
