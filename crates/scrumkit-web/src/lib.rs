//! Scrumkit Web Server
//!
//! Axum-based REST API and WebSocket change feed.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Auth
        .route("/auth/signup", post(routes::auth::sign_up))
        .route("/auth/signin", post(routes::auth::sign_in))
        .route("/auth/oauth", post(routes::auth::sign_in_with_oauth))
        .route("/auth/signout", post(routes::auth::sign_out))
        .route("/me", get(routes::auth::me))
        // Projects
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/projects/{id}/archive", post(routes::projects::archive_project))
        .route("/projects/{id}/restore", post(routes::projects::restore_project))
        // Project-scoped collections
        .route(
            "/projects/{id}/epics",
            get(routes::epics::list_epics).post(routes::epics::create_epic),
        )
        .route(
            "/projects/{id}/stories",
            get(routes::stories::list_stories).post(routes::stories::create_story),
        )
        .route(
            "/projects/{id}/sprints",
            get(routes::sprints::list_sprints).post(routes::sprints::create_sprint),
        )
        .route(
            "/projects/{id}/team",
            get(routes::team::list_members).post(routes::team::add_member),
        )
        // Canvases
        .route("/projects/{id}/canvases", get(routes::canvases::canvas_status))
        .route("/projects/{id}/canvases/vsm/metrics", get(routes::canvases::vsm_metrics))
        .route(
            "/projects/{id}/canvases/{kind}",
            get(routes::canvases::get_canvas)
                .put(routes::canvases::save_canvas)
                .delete(routes::canvases::delete_canvas),
        )
        // Epics
        .route(
            "/epics/{id}",
            get(routes::epics::get_epic)
                .put(routes::epics::update_epic)
                .delete(routes::epics::delete_epic),
        )
        .route("/epics/{id}/progress", get(routes::epics::epic_progress))
        .route("/epics/{id}/archive", post(routes::epics::archive_epic))
        .route("/epics/{id}/restore", post(routes::epics::restore_epic))
        // Stories
        .route(
            "/stories/{id}",
            get(routes::stories::get_story)
                .put(routes::stories::update_story)
                .delete(routes::stories::delete_story),
        )
        .route("/stories/{id}/sprint", put(routes::stories::set_sprint))
        .route("/stories/{id}/status", put(routes::stories::set_status))
        // Sprints
        .route(
            "/sprints/{id}",
            get(routes::sprints::get_sprint)
                .put(routes::sprints::update_sprint)
                .delete(routes::sprints::delete_sprint),
        )
        .route("/sprints/{id}/start", post(routes::sprints::start_sprint))
        .route("/sprints/{id}/complete", post(routes::sprints::complete_sprint))
        .route("/sprints/{id}/summary", get(routes::sprints::sprint_summary))
        // Team
        .route(
            "/team/{id}",
            put(routes::team::update_member).delete(routes::team::remove_member),
        )
        .with_state(state.clone());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use scrumkit_store::MemoryStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::with_store(Arc::new(MemoryStore::new())))
    }

    async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ));
        (status, value)
    }

    async fn signed_up(app: &Router, email: &str) -> String {
        let (status, session) = call(
            app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": email, "password": "secret1", "displayName": "Ada"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        session["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let app = app();
        let (status, _) = call(&app, "GET", "/api/projects", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, "GET", "/api/projects", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let app = app();
        let token = signed_up(&app, "ada@example.com").await;
        let token = Some(token.as_str());

        let (status, _) = call(&app, "POST", "/api/projects", token, Some(json!({"name": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, project) = call(&app, "POST", "/api/projects", token, Some(json!({"name": "Apollo"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = project["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, "POST", &format!("/api/projects/{}/archive", id), token, None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, active) = call(&app, "GET", "/api/projects", token, None).await;
        assert_eq!(active.as_array().unwrap().len(), 0);
        let (_, archived) = call(&app, "GET", "/api/projects?archived=true", token, None).await;
        assert_eq!(archived.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "GET", "/api/projects/missing", token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sprint_update_guards_dates_and_lifecycle() {
        let app = app();
        let token = signed_up(&app, "ada@example.com").await;
        let token = Some(token.as_str());
        let (_, project) = call(&app, "POST", "/api/projects", token, Some(json!({"name": "Apollo"}))).await;
        let (status, sprint) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/sprints", project["id"].as_str().unwrap()),
            token,
            Some(json!({"name": "S1", "startDate": "2024-03-01", "endDate": "2024-03-14"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/sprints/{}", sprint["id"].as_str().unwrap());

        let (status, _) = call(&app, "PUT", &uri, token, Some(json!({"endDate": "2024-01-01"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "PUT", &uri, token, Some(json!({"status": "completed", "velocity": 99}))).await;
        assert!(status.is_client_error());

        let (_, stored) = call(&app, "GET", &uri, token, None).await;
        assert_eq!(stored["endDate"], "2024-03-14");
        assert_eq!(stored["status"], "planned");
        assert_eq!(stored["velocity"], Value::Null);

        let (status, completed) = call(&app, "POST", &format!("{}/complete", uri), token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(completed["status"], "completed");
        assert_eq!(completed["velocity"], 0);
    }

    #[tokio::test]
    async fn test_change_feed_requires_sign_in() {
        let app = app();
        let (status, _) = call(&app, "GET", "/ws", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Signed in but not a WebSocket handshake: past auth, rejected by the upgrade.
        let token = signed_up(&app, "ada@example.com").await;
        let (status, _) = call(&app, "GET", &format!("/ws?access_token={}", token), None, None).await;
        assert_ne!(status, StatusCode::UNAUTHORIZED);
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_other_users_projects_are_hidden() {
        let app = app();
        let owner = signed_up(&app, "owner@example.com").await;
        let other = signed_up(&app, "other@example.com").await;

        let (_, project) = call(&app, "POST", "/api/projects", Some(&owner), Some(json!({"name": "Private"}))).await;
        let uri = format!("/api/projects/{}/epics", project["id"].as_str().unwrap());
        let (status, _) = call(&app, "GET", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_canvas_upsert_and_metrics() {
        let app = app();
        let token = signed_up(&app, "ada@example.com").await;
        let token = Some(token.as_str());
        let (_, project) = call(&app, "POST", "/api/projects", token, Some(json!({"name": "Apollo"}))).await;
        let base = format!("/api/projects/{}/canvases", project["id"].as_str().unwrap());

        let (_, empty) = call(&app, "GET", &format!("{}/vsm", base), token, None).await;
        assert_eq!(empty, Value::Null);

        let map = json!({"name": "Flow", "steps": [
            {"name": "Build", "processTime": 30.0, "waitTime": 10.0, "valueAdding": true},
            {"name": "Review", "processTime": 10.0, "waitTime": 50.0, "valueAdding": false}
        ]});
        let (status, first) = call(&app, "PUT", &format!("{}/vsm", base), token, Some(map.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = call(&app, "PUT", &format!("{}/vsm", base), token, Some(map)).await;
        assert_eq!(first["id"], second["id"]);
        assert!(!second["steps"][0]["id"].as_str().unwrap().is_empty());

        let (_, metrics) = call(&app, "GET", &format!("{}/vsm/metrics", base), token, None).await;
        assert_eq!(metrics["leadTime"], 100.0);
        assert_eq!(metrics["bottleneck"]["name"], "Review");

        let (_, status) = call(&app, "GET", &base, token, None).await;
        assert_eq!(status["valueStream"], true);
        assert_eq!(status["businessModel"], false);

        let (code, _) = call(&app, "GET", &format!("{}/swot", base), token, None).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }
}
