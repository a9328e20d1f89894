use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_link_handler, delete_link_handler, health_handler, list_links_handler,
    preview_link_handler, redirect_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/v1/links", post(create_link_handler).get(list_links_handler))
            .route(
                "/v1/links/{code}",
                get(preview_link_handler).delete(delete_link_handler),
            )
            // Single-segment catch-all; static routes above take precedence.
            .route("/{code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use snaplink_cache::MemoryCache;
    use snaplink_generator::RandomGenerator;
    use snaplink_service::ShortenerService;
    use snaplink_storage::InMemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    type TestService = ShortenerService<InMemoryStore, MemoryCache, RandomGenerator>;

    fn test_app() -> (Router, TestService) {
        let service = ShortenerService::new(
            InMemoryStore::new(),
            MemoryCache::new(),
            RandomGenerator::default(),
        );
        let state = AppState::new(Arc::new(service.clone()), "https://snap.link");
        (App::router(state), service)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete_req(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn create(app: &Router, body: Value) -> (StatusCode, Value) {
        send(app, post_json("/v1/links", body)).await
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = test_app();

        let (status, body) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_returns_201_with_short_url() {
        let (app, _) = test_app();

        let (status, body) = create(&app, json!({"long_url": "https://example.com"})).await;
        assert_eq!(status, StatusCode::CREATED);

        let code = body["short_code"].as_str().unwrap();
        assert_eq!(code.len(), 7);
        assert_eq!(
            body["short_url"].as_str().unwrap(),
            format!("https://snap.link/{code}")
        );
        assert_eq!(body["long_url"], "https://example.com");
    }

    #[tokio::test]
    async fn create_with_custom_code() {
        let (app, _) = test_app();

        let (status, body) = create(
            &app,
            json!({"long_url": "https://example.com", "custom_code": "promo"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["short_code"], "promo");
    }

    #[tokio::test]
    async fn create_rejects_invalid_url() {
        let (app, _) = test_app();

        let (status, body) = create(&app, json!({"long_url": "not-a-url"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid url"));
    }

    #[tokio::test]
    async fn create_rejects_malformed_custom_code() {
        let (app, _) = test_app();

        let (status, _) = create(
            &app,
            json!({"long_url": "https://example.com", "custom_code": "bad code!"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_unparsable_expiration() {
        let (app, _) = test_app();

        let (status, _) = create(
            &app,
            json!({"long_url": "https://example.com", "expires_at": "next tuesday"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_duplicate_custom_code_conflicts() {
        let (app, _) = test_app();

        let (status, _) = create(
            &app,
            json!({"long_url": "https://a.test", "custom_code": "promo"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = create(
            &app,
            json!({"long_url": "https://b.test", "custom_code": "promo"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("promo"));
    }

    #[tokio::test]
    async fn redirect_answers_302_with_location() {
        let (app, _) = test_app();

        let (_, body) = create(&app, json!({"long_url": "https://example.com"})).await;
        let code = body["short_code"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(get_req(&format!("/{code}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn redirect_unknown_code_is_404() {
        let (app, _) = test_app();

        let (status, _) = send(&app, get_req("/nope123")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn redirect_expired_link_is_404() {
        let (app, _) = test_app();

        let (status, body) = create(
            &app,
            json!({
                "long_url": "https://x.test",
                "expires_at": "2000-01-01T00:00:00Z"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let code = body["short_code"].as_str().unwrap();
        let (status, _) = send(&app, get_req(&format!("/{code}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preview_reports_clicks_without_recording_one() {
        let (app, service) = test_app();

        let (_, body) = create(&app, json!({"long_url": "https://example.com"})).await;
        let code = body["short_code"].as_str().unwrap().to_string();

        // Two redirects, then a flush, then a preview.
        send(&app, get_req(&format!("/{code}"))).await;
        send(&app, get_req(&format!("/{code}"))).await;
        service.clicks().flush().await;

        let (status, body) = send(&app, get_req(&format!("/v1/links/{code}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["long_url"], "https://example.com");
        assert_eq!(body["clicks"], 2);

        // The preview itself did not count.
        service.clicks().flush().await;
        let (_, body) = send(&app, get_req(&format!("/v1/links/{code}"))).await;
        assert_eq!(body["clicks"], 2);
    }

    #[tokio::test]
    async fn preview_unknown_code_is_404() {
        let (app, _) = test_app();

        let (status, _) = send(&app, get_req("/v1/links/nope123")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_redirect_is_404() {
        let (app, _) = test_app();

        let (_, body) = create(&app, json!({"long_url": "https://example.com"})).await;
        let code = body["short_code"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(delete_req(&format!("/v1/links/{code}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, _) = send(&app, get_req(&format!("/{code}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_unknown_code_is_404() {
        let (app, _) = test_app();

        let (status, _) = send(&app, delete_req("/v1/links/nope123")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleted_code_can_be_recreated() {
        let (app, _) = test_app();

        create(
            &app,
            json!({"long_url": "https://a.test", "custom_code": "promo"}),
        )
        .await;
        send(&app, delete_req("/v1/links/promo")).await;

        let (status, _) = create(
            &app,
            json!({"long_url": "https://b.test", "custom_code": "promo"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, get_req("/v1/links/promo")).await;
        assert_eq!(body["long_url"], "https://b.test");
        assert_eq!(body["clicks"], 0);
    }

    #[tokio::test]
    async fn listing_returns_recent_links_newest_first() {
        let (app, _) = test_app();

        create(
            &app,
            json!({"long_url": "https://a.test", "custom_code": "first-1"}),
        )
        .await;
        create(
            &app,
            json!({"long_url": "https://b.test", "custom_code": "second2"}),
        )
        .await;

        let (status, body) = send(&app, get_req("/v1/links?limit=5")).await;
        assert_eq!(status, StatusCode::OK);

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["short_code"], "second2");
        assert_eq!(items[1]["short_code"], "first-1");
    }
}
