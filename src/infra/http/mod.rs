mod activities;
mod error;
mod middleware;
mod notifications;
mod portfolio;
mod roadmaps;
mod skills;
mod state;
mod stream;

pub use error::ApiError;
pub use middleware::CurrentUser;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Router, extract::State, middleware as axum_middleware};

use crate::application::error::ErrorReport;

use middleware::{log_responses, require_auth, set_request_context};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/portfolio",
            get(portfolio::list_items).post(portfolio::create_item),
        )
        .route(
            "/portfolio/{id}",
            get(portfolio::get_item)
                .put(portfolio::update_item)
                .delete(portfolio::delete_item),
        )
        .route("/skills", get(skills::list_skills).post(skills::create_skill))
        .route("/skills/{id}", delete(skills::delete_skill))
        .route("/skills/{id}/progress", put(skills::update_progress))
        .route("/skills/{id}/quiz", post(skills::complete_quiz))
        .route(
            "/roadmaps",
            get(roadmaps::list_roadmaps).post(roadmaps::create_roadmap),
        )
        .route(
            "/roadmaps/{id}",
            get(roadmaps::get_roadmap)
                .put(roadmaps::update_roadmap)
                .delete(roadmaps::delete_roadmap),
        )
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route(
            "/activities",
            get(activities::list_activities).post(activities::record_activity),
        )
        .route("/stream", get(stream::open_stream))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .nest("/api/v1", api)
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use time::OffsetDateTime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::application::activities::ActivityService;
    use crate::application::auth::{AuthService, hash_token};
    use crate::application::effects::WriteEffects;
    use crate::application::notifications::NotificationService;
    use crate::application::portfolio::PortfolioService;
    use crate::application::roadmaps::RoadmapService;
    use crate::application::skills::SkillService;
    use crate::application::testing::InMemoryRepos;
    use crate::cache::{CacheConfig, CacheStore, CachedReads};
    use crate::domain::entities::UserRecord;
    use crate::infra::db::PostgresRepositories;
    use crate::realtime::{EventBroker, RealtimeConfig};

    use super::*;

    const TOKEN: &str = "test-token";

    fn test_state() -> (Arc<InMemoryRepos>, Uuid, AppState) {
        let repos = Arc::new(InMemoryRepos::new());
        let user_id = Uuid::new_v4();
        repos.users.lock().unwrap().push(UserRecord {
            id: user_id,
            display_name: "Test User".to_string(),
            token_hash: hash_token(TOKEN),
            created_at: OffsetDateTime::now_utc(),
        });

        let cache_config = CacheConfig::default();
        let cache = Arc::new(CacheStore::new(&cache_config));
        let broker = Arc::new(EventBroker::new(RealtimeConfig::default()));
        let reads = CachedReads::new(cache.clone(), cache_config);
        let effects = WriteEffects::new(cache, broker.clone());

        // Never connected; only the health route would touch it.
        let pool = PostgresRepositories::connect_lazy("postgres://localhost/folio_test")
            .expect("lazy pool");

        let state = AppState {
            portfolio: PortfolioService::new(repos.clone(), reads.clone(), effects.clone()),
            skills: SkillService::new(
                repos.clone(),
                repos.clone(),
                reads.clone(),
                effects.clone(),
            ),
            roadmaps: RoadmapService::new(repos.clone(), reads.clone(), effects.clone()),
            notifications: NotificationService::new(repos.clone(), reads.clone(), effects.clone()),
            activities: ActivityService::new(repos.clone(), reads, effects),
            auth: AuthService::new(repos.clone()),
            broker,
            realtime: RealtimeConfig::default(),
            db: Arc::new(PostgresRepositories::new(pool)),
        };
        (repos, user_id, state)
    }

    fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
        request.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/portfolio")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/portfolio")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_and_list_portfolio_items() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(
                authed(Request::builder().method("POST").uri("/api/v1/portfolio"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"title":"Ray tracer","summary":"a weekend ray tracer"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                authed(Request::builder().uri("/api/v1/portfolio"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let items: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Ray tracer");
    }

    #[tokio::test]
    async fn invalid_body_is_a_client_error() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                authed(Request::builder().method("POST").uri("/api/v1/portfolio"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"   ","summary":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                authed(Request::builder().uri(format!("/api/v1/portfolio/{}", Uuid::new_v4())))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stream_endpoint_declares_event_stream_and_no_buffering() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                authed(Request::builder().uri("/api/v1/stream?types=notification"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");
    }

    #[tokio::test]
    async fn mark_read_round_trip() {
        let (_, _, state) = test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(
                authed(Request::builder().method("POST").uri("/api/v1/notifications"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"Welcome!"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(
                authed(
                    Request::builder()
                        .method("POST")
                        .uri(format!("/api/v1/notifications/{id}/read")),
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
