use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{api, health_check, pages};
use crate::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/events", post(api::create_event))
        .route("/events/:id", get(api::get_event))
        .route("/events/:id/days", get(api::get_days))
        .route(
            "/events/:id/availability",
            get(api::list_availability).put(api::save_availability),
        )
        .layer(create_cors_layer(&config.allowed_origins));

    Router::new()
        .route("/", get(pages::landing))
        .route(
            "/create-event",
            get(pages::create_event_page).post(pages::create_event),
        )
        .route(
            "/join-event",
            get(pages::join_event_page).post(pages::join_event),
        )
        .route(
            "/event/:id",
            get(pages::event_page).post(pages::save_availability),
        )
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .fallback(pages::not_found)
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config.production))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::models::{Availability, Event, NewEvent};
    use crate::store::{EventStore, MemoryEventStore, Store, StoreError};
    use crate::views::Views;

    /// Reads go to memory unless `reads_fail`; writes always fail.
    #[derive(Debug, Default)]
    struct UnreachableStore {
        memory: MemoryEventStore,
        reads_fail: bool,
    }

    impl UnreachableStore {
        fn refused() -> StoreError {
            StoreError::Transport("connection refused".to_string())
        }
    }

    #[async_trait]
    impl EventStore for UnreachableStore {
        async fn insert_event(&self, _event: &NewEvent) -> Result<Event, StoreError> {
            Err(Self::refused())
        }

        async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
            if self.reads_fail {
                return Err(Self::refused());
            }
            self.memory.get_event(id).await
        }

        async fn save_availability(
            &self,
            _event_id: Uuid,
            _participant: &str,
            _days: &[NaiveDate],
        ) -> Result<Availability, StoreError> {
            Err(Self::refused())
        }

        async fn list_availability(&self, event_id: Uuid) -> Result<Vec<Availability>, StoreError> {
            if self.reads_fail {
                return Err(Self::refused());
            }
            self.memory.list_availability(event_id).await
        }
    }

    fn team_sync() -> NewEvent {
        NewEvent {
            name: "Team Sync".to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        }
    }

    struct TestApp {
        state: AppState,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            Self::with_store(Arc::new(MemoryEventStore::new()))
        }

        fn with_store(backend: Arc<dyn EventStore>) -> Self {
            let config = Config::from_lookup(|_| None).unwrap();
            let state = AppState {
                store: Store::new(backend, CancellationToken::new(), Duration::from_secs(5)),
                views: Views::new().unwrap(),
            };
            let router = create_routes(state.clone(), &config);
            Self { state, router }
        }

        async fn seed(&self) -> Event {
            self.state.store.insert_event(&team_sync()).await.unwrap()
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn post_form(&self, uri: &str, form: &str) -> Response {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
            self.send(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        serde_json::from_str(&text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_landing_links_to_both_flows() {
        let app = TestApp::new();
        let response = app.get("/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::X_CONTENT_TYPE_OPTIONS));
        let html = text(response).await;
        assert!(html.contains("href=\"/create-event\""));
        assert!(html.contains("href=\"/join-event\""));
    }

    #[tokio::test]
    async fn test_created_event_is_immediately_joinable() {
        let app = TestApp::new();

        let response = app
            .post_form(
                "/create-event",
                "event_name=Team+Sync&date_from=2024-01-01&date_to=2024-01-03",
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let html = text(response).await;
        let id = html
            .split("<code>")
            .nth(1)
            .and_then(|rest| rest.split("</code>").next())
            .unwrap()
            .to_string();

        let response = app
            .post_form("/join-event", &format!("event_id={id}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("/event/{id}").as_str()
        );
    }

    #[tokio::test]
    async fn test_create_rejects_short_name_inline() {
        let app = TestApp::new();

        let response = app
            .post_form(
                "/create-event",
                "event_name=A&date_from=2024-01-01&date_to=2024-01-03",
            )
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = text(response).await;
        assert!(html.contains("Event name must be at least 2 characters."));
        // what was typed survives the round trip
        assert!(html.contains("value=\"2024-01-03\""));
    }

    #[tokio::test]
    async fn test_create_rejects_overlong_range() {
        let app = TestApp::new();

        let response = app
            .post_form(
                "/create-event",
                "event_name=Huge&date_from=0001-01-01&date_to=9999-12-31",
            )
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(text(response)
            .await
            .contains("Events can cover at most 366 days."));
    }

    #[tokio::test]
    async fn test_create_failure_keeps_form_for_retry() {
        let app = TestApp::with_store(Arc::new(UnreachableStore::default()));

        let response = app
            .post_form(
                "/create-event",
                "event_name=Team+Sync&date_from=2024-01-01&date_to=2024-01-03",
            )
            .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = text(response).await;
        assert!(html.contains("notice destructive"));
        assert!(html.contains("Something went wrong"));
        assert!(!html.contains("<code>"));
        assert!(html.contains("value=\"Team Sync\""));
        assert!(html.contains("value=\"2024-01-01\""));
        assert!(html.contains("value=\"2024-01-03\""));
    }

    #[tokio::test]
    async fn test_join_transport_failure_is_not_reported_as_missing() {
        let app = TestApp::with_store(Arc::new(UnreachableStore {
            reads_fail: true,
            ..UnreachableStore::default()
        }));
        let id = Uuid::new_v4();

        let response = app
            .post_form("/join-event", &format!("event_id={id}"))
            .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(header::LOCATION).is_none());
        let html = text(response).await;
        assert!(html.contains("notice destructive"));
        assert!(html.contains("Something went wrong"));
        assert!(!html.contains("Event not found"));
        assert!(html.contains(&format!("value=\"{id}\"")));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_selection_for_retry() {
        let memory = MemoryEventStore::new();
        let event = memory.insert_event(&team_sync()).await.unwrap();
        let app = TestApp::with_store(Arc::new(UnreachableStore {
            memory,
            reads_fail: false,
        }));

        let response = app
            .post_form(
                &format!("/event/{}", event.id),
                "participant=mina&days=2024-01-01,2024-01-03",
            )
            .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = text(response).await;
        assert!(html.contains("notice destructive"));
        assert!(html.contains("Saving your days failed."));
        assert!(html.contains("value=\"mina\""));
        assert!(html.contains("name=\"days\" value=\"2024-01-01,2024-01-03\""));
    }

    #[tokio::test]
    async fn test_join_unknown_id_shows_notice_without_redirect() {
        let app = TestApp::new();

        let response = app.post_form("/join-event", "event_id=zzz").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::LOCATION).is_none());
        let html = text(response).await;
        assert!(html.contains("Event not found"));
        assert!(html.contains("notice destructive"));
    }

    #[tokio::test]
    async fn test_join_requires_an_id() {
        let app = TestApp::new();

        let response = app.post_form("/join-event", "event_id=").await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(text(response).await.contains("Enter an event ID."));
    }

    #[tokio::test]
    async fn test_event_page_lists_every_day() {
        let app = TestApp::new();
        let event = app.seed().await;

        let response = app.get(&format!("/event/{}", event.id)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = text(response).await;
        assert!(html.contains("Team Sync"));
        assert_eq!(html.matches(" available</small>").count(), 3);
        assert!(html.contains("Mon Jan 1"));
        assert!(html.contains("Wed Jan 3"));
    }

    #[tokio::test]
    async fn test_event_page_toggles_selection() {
        let app = TestApp::new();
        let event = app.seed().await;

        let html = text(
            app.get(&format!(
                "/event/{}?selected=2024-01-01&toggle=2024-01-02",
                event.id
            ))
            .await,
        )
        .await;
        assert!(html.contains("value=\"2024-01-01,2024-01-02\""));

        // toggling a selected day removes it; days outside the event are ignored
        let html = text(
            app.get(&format!(
                "/event/{}?selected=2024-01-01,2023-12-31&toggle=2024-01-01",
                event.id
            ))
            .await,
        )
        .await;
        assert!(html.contains("name=\"days\" value=\"\""));
    }

    #[tokio::test]
    async fn test_unknown_event_page_is_not_found() {
        let app = TestApp::new();

        let response = app.get("/event/zzz").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(text(response).await.contains("Event not found"));
    }

    #[tokio::test]
    async fn test_saving_availability_persists_and_replaces() {
        let app = TestApp::new();
        let event = app.seed().await;
        let uri = format!("/event/{}", event.id);

        let response = app
            .post_form(&uri, "participant=mina&days=2024-01-01,2024-01-02")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("Selection saved"));

        app.post_form(&uri, "participant=mina&days=2024-01-03")
            .await;

        let entries = app.state.store.list_availability(event.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].days.len(), 1);
        assert_eq!(entries[0].days[0].to_string(), "2024-01-03");
    }

    #[tokio::test]
    async fn test_saving_without_name_is_rejected() {
        let app = TestApp::new();
        let event = app.seed().await;

        let response = app
            .post_form(&format!("/event/{}", event.id), "participant=&days=2024-01-01")
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = text(response).await;
        assert!(html.contains("Enter your name."));
        assert!(html.contains("value=\"2024-01-01\""));
    }

    #[tokio::test]
    async fn test_api_create_then_read_days() {
        let app = TestApp::new();

        let response = app
            .send_json(
                "POST",
                "/api/events",
                json!({
                    "name": "Team Sync",
                    "start_date": "2024-01-01T00:00:00Z",
                    "end_date": "2024-01-03T00:00:00Z",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let body = json_body(app.get(&format!("/api/events/{id}/days")).await).await;
        assert_eq!(
            body["data"]["days"],
            json!(["2024-01-01", "2024-01-02", "2024-01-03"])
        );
    }

    #[tokio::test]
    async fn test_api_validation_and_not_found_are_distinct() {
        let app = TestApp::new();

        let response = app
            .send_json(
                "POST",
                "/api/events",
                json!({
                    "name": "A",
                    "start_date": "2024-01-03T00:00:00Z",
                    "end_date": "2024-01-01T00:00:00Z",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["details"]["name"].is_string());
        assert!(body["error"]["details"]["end_date"].is_string());

        let response = app.get("/api/events/zzz").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_api_availability_round() {
        let app = TestApp::new();
        let event = app.seed().await;
        let uri = format!("/api/events/{}/availability", event.id);

        let response = app
            .send_json(
                "PUT",
                &uri,
                json!({ "participant": "alex", "days": ["2024-01-05"] }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send_json(
                "PUT",
                &uri,
                json!({ "participant": "alex", "days": ["2024-01-02"] }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(app.get(&uri).await).await;
        assert_eq!(
            body["data"],
            json!([{
                "event_id": event.id,
                "participant": "alex",
                "days": ["2024-01-02"],
            }])
        );
    }

    #[tokio::test]
    async fn test_health_and_fallback() {
        let app = TestApp::new();

        assert_eq!(app.get("/health").await.status(), StatusCode::OK);
        assert_eq!(app.get("/nowhere").await.status(), StatusCode::NOT_FOUND);
    }
}
