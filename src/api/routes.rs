//! API Routes
//!
//! Configures the Axum router with all flag service endpoints.

use axum::{
    routing::{get, patch, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_flag_handler, delete_flag_handler, delete_override_handler, evaluate_handler,
    get_flag_handler, health_handler, list_flags_handler, list_overrides_handler,
    set_override_handler, stats_handler, toggle_flag_handler, update_flag_handler, AppState,
};

/// Routes served under the API prefix.
fn api_routes() -> Router<AppState> {
    Router::new()
        // Static segment wins over :flag_id
        .route("/flags/evaluate", get(evaluate_handler))
        .route("/flags", get(list_flags_handler).post(create_flag_handler))
        .route(
            "/flags/:flag_id",
            get(get_flag_handler)
                .patch(update_flag_handler)
                .delete(delete_flag_handler),
        )
        .route("/flags/:flag_id/toggle", patch(toggle_flag_handler))
        .route("/flags/:flag_id/users", get(list_overrides_handler))
        .route(
            "/flags/:flag_id/users/:user_id",
            put(set_override_handler).delete(delete_override_handler),
        )
        .route("/cache/stats", get(stats_handler))
}

/// Creates the main router with all endpoints configured.
///
/// `/health` is served at the root; everything else under `api_prefix`
/// (an empty prefix mounts the API at the root).
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState, api_prefix: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new().route("/health", get(health_handler));
    let router = if api_prefix.is_empty() {
        router.merge(api_routes())
    } else {
        router.nest(api_prefix, api_routes())
    };

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvaluationCache;
    use crate::db::Database;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app(prefix: &str) -> Router {
        let state = AppState::new(
            Database::open_in_memory().unwrap(),
            EvaluationCache::new(100, Duration::from_secs(60)),
        );
        create_router(state, prefix)
    }

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app("/api/v1");
        assert_eq!(status_of(app, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_routes_are_prefixed() {
        let app = create_test_app("/api/v1");
        assert_eq!(status_of(app.clone(), "/api/v1/flags").await, StatusCode::OK);
        assert_eq!(status_of(app.clone(), "/api/v1/cache/stats").await, StatusCode::OK);
        assert_eq!(status_of(app, "/flags").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_prefix_mounts_at_root() {
        let app = create_test_app("");
        assert_eq!(status_of(app, "/flags").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_evaluate_is_not_a_flag_id() {
        let app = create_test_app("/api/v1");
        let status = status_of(app, "/api/v1/flags/evaluate?flag_name=nope&user_id=u").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_flag_id() {
        let app = create_test_app("/api/v1");
        let status = status_of(app, "/api/v1/flags/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
