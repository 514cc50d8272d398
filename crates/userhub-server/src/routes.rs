//! HTTP router.

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(handlers::register::register))
        .route("/login", post(handlers::login::login))
        .route("/logout", get(handlers::logout::logout))
        .route("/me", get(handlers::me::who_am_i))
        .route("/users", get(handlers::users::users))
        .route("/update", patch(handlers::update::update))
        .route("/delete", delete(handlers::delete::delete_user))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;
    use userhub_auth::{AuthService, LoginCache, SessionCache, TokenCodec};
    use userhub_storage::{MemoryUserStore, UserStore};

    use super::*;
    use crate::handlers::EXPIRES_AFTER;

    fn test_app() -> (Router, Arc<AuthService>, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let service = Arc::new(AuthService::new(
            store.clone(),
            Arc::new(TokenCodec::generate().unwrap()),
            SessionCache::new_memory(),
            LoginCache::new(Duration::from_secs(60), 100),
        ));
        let app = build_router(AppState::new(service.clone()));
        (app, service, store)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_alice(app: &Router) -> (String, String) {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                serde_json::json!({
                    "username": "alice",
                    "email": "alice@example.com",
                    "password": "correcthorse1",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(EXPIRES_AFTER));

        let body = body_json(response).await;
        (
            body["userId"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_login_me_logout_roundtrip() {
        let (app, _service, _store) = test_app();
        let (user_id, _) = register_alice(&app).await;

        // Login
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                serde_json::json!({ "username": "alice", "password": "correcthorse1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["userId"], user_id);
        let token = body["token"].as_str().unwrap().to_string();

        // Me
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/me", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(body.get("password_hash").is_none());

        // Logout
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/logout", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["userId"], user_id);
        assert_ne!(body["token"], token);

        // The revoked token no longer authenticates.
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/me", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_404() {
        let (app, _service, _store) = test_app();
        register_alice(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                serde_json::json!({ "username": "alice", "password": "wronghorse" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_credentials");
    }

    #[tokio::test]
    async fn test_login_blank_fields_is_400() {
        let (app, _service, _store) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                serde_json::json!({ "username": "", "password": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_request");
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_409() {
        let (app, _service, _store) = test_app();
        register_alice(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                serde_json::json!({
                    "username": "alice",
                    "email": "other@example.com",
                    "password": "password123",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "duplicate_key");
    }

    #[tokio::test]
    async fn test_me_without_token_is_401() {
        let (app, _service, _store) = test_app();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "unauthorized");
    }

    #[tokio::test]
    async fn test_users_requires_filter() {
        let (app, _service, _store) = test_app();
        let (_, token) = register_alice(&app).await;

        // No filter at all
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/users", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Blank filter value
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/users?username=", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Matching filter
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/users?username=alice", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["username"], "alice");

        // Filter with no matches
        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/users?username=nobody", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_changes_password() {
        let (app, _service, _store) = test_app();
        let (user_id, token) = register_alice(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/update")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "password": "newhorse22" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(EXPIRES_AFTER));
        let body = body_json(response).await;
        assert_eq!(body["userId"], user_id);
        assert_ne!(body["token"], token);

        // Old password no longer logs in.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                serde_json::json!({ "username": "alice", "password": "correcthorse1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_empty_body_is_404() {
        let (app, _service, _store) = test_app();
        let (_, token) = register_alice(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/update")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let (app, service, store) = test_app();
        let (admin_id, admin_token) = register_alice(&app).await;

        // Promote alice to admin directly in the store.
        let mut admin = service.get_by_id(&admin_id).await.unwrap();
        admin.admin = true;
        store.update(&admin).await.unwrap();

        // Register a target user.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                serde_json::json!({
                    "username": "bob",
                    "email": "bob@example.com",
                    "password": "password123",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Self-delete is rejected.
        let response = app
            .clone()
            .oneshot(bearer_request(
                "DELETE",
                "/delete?username=alice",
                &admin_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unknown target.
        let response = app
            .clone()
            .oneshot(bearer_request(
                "DELETE",
                "/delete?username=nobody",
                &admin_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Successful delete.
        let response = app
            .clone()
            .oneshot(bearer_request(
                "DELETE",
                "/delete?username=bob",
                &admin_token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "User deleted successfully");
    }

    #[tokio::test]
    async fn test_delete_requires_admin() {
        let (app, _service, _store) = test_app();
        let (_, token) = register_alice(&app).await;

        let response = app
            .clone()
            .oneshot(bearer_request("DELETE", "/delete?username=bob", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
