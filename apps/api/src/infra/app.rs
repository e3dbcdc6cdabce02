use axum::{Router, http};
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::adapters::{self, http::app_state::AppState};

/// Credentialed CORS for the root domain and its direct subdomains.
///
/// Disallowed origins get no `Access-Control-Allow-*` headers at all, so the
/// browser blocks the response.
fn cors_layer(app_state: &AppState) -> CorsLayer {
    let policy = app_state.session_authority.origin_policy().clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &http::HeaderValue, _parts: &http::request::Parts| {
                origin.to_str().is_ok_and(|o| policy.is_allowed(o))
            },
        ))
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn create_app(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state);

    Router::new()
        .nest("/api", adapters::http::routes::router())
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                        let request_id = Uuid::new_v4();
                        tracing::info_span!(
                            "http-request",
                            method = %request.method(),
                            uri = %request.uri(),
                            version = ?request.version(),
                            request_id = %request_id
                        )
                    }),
                )
                .layer(SetResponseHeaderLayer::overriding(
                    CACHE_CONTROL,
                    http::HeaderValue::from_static("no-store"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    http::header::X_CONTENT_TYPE_OPTIONS,
                    http::HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    http::header::X_FRAME_OPTIONS,
                    http::HeaderValue::from_static("DENY"),
                ))
                .layer(cors),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use axum_test::TestServer;

    use super::*;
    use crate::test_utils::TestAppStateBuilder;

    fn server(app_state: AppState) -> TestServer {
        TestServer::new(create_app(app_state)).unwrap()
    }

    #[tokio::test]
    async fn test_allowed_origin_gets_credentialed_cors_headers() {
        let server = server(TestAppStateBuilder::new().build());

        let response = server
            .get("/api/session/status")
            .add_header(http::header::ORIGIN, HeaderValue::from_static("https://a.root.tld"))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.headers().get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://a.root.tld"))
        );
        assert_eq!(
            response
                .headers()
                .get(http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );
    }

    #[tokio::test]
    async fn test_lookalike_origin_gets_no_cors_headers() {
        let server = server(TestAppStateBuilder::new().build());

        let response = server
            .get("/api/session/status")
            .add_header(
                http::header::ORIGIN,
                HeaderValue::from_static("https://root.tld.evil.com"),
            )
            .await;

        assert!(
            response
                .headers()
                .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin_succeeds() {
        let server = server(TestAppStateBuilder::new().build());

        let response = server
            .method(http::Method::OPTIONS, "/api/session/login")
            .add_header(http::header::ORIGIN, HeaderValue::from_static("https://root.tld"))
            .add_header(
                http::header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .await;

        assert!(response.status_code().is_success());
        assert_eq!(
            response.headers().get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://root.tld"))
        );
    }

    #[tokio::test]
    async fn test_localhost_origin_only_in_dev_mode() {
        let prod = server(TestAppStateBuilder::new().build());
        let response = prod
            .get("/api/session/status")
            .add_header(http::header::ORIGIN, HeaderValue::from_static("http://localhost:3000"))
            .await;
        assert!(
            response
                .headers()
                .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );

        let dev = server(TestAppStateBuilder::new().with_localhost().build());
        let response = dev
            .get("/api/session/status")
            .add_header(http::header::ORIGIN, HeaderValue::from_static("http://localhost:3000"))
            .await;
        assert_eq!(
            response.headers().get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:3000"))
        );
    }

    #[tokio::test]
    async fn test_responses_are_never_cached() {
        let server = server(TestAppStateBuilder::new().build());

        let response = server.get("/api/session/status").await;

        assert_eq!(
            response.headers().get(CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        assert_eq!(
            response.headers().get(http::header::X_CONTENT_TYPE_OPTIONS),
            Some(&HeaderValue::from_static("nosniff"))
        );
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let server = server(TestAppStateBuilder::new().build());

        let response = server.get("/api/session/login").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

        let response = server.post("/api/session/status").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
