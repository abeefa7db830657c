//! 路由组装

use std::sync::Arc;

use axum::Router;
use secrecy::ExposeSecret;
use tower_http::trace::TraceLayer;
use tracing::info;
use webcrud::{Action, CrudRoutes, CrudSettings, PermissionMap, RegistrationError, Role};
use webcrud_auth_core::{BearerAuthHandler, TokenService};
use webcrud_config::AppConfig;

use crate::{auth, notes::NoteStore, routing};

const NOTES_ONE_SLUG: &str = "/api/notes/{id}";
const NOTES_ALL_SLUG: &str = "/api/notes";

/// 未配置时的默认权限：Admin 全部，User 只读
fn default_note_permissions() -> PermissionMap {
    PermissionMap::new()
        .grant(Role::ADMIN, Action::ALL)
        .grant(Role::USER, [Action::ReadOne, Action::ReadAll])
}

pub fn token_service(config: &AppConfig) -> TokenService {
    TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
    )
}

pub fn build_app(config: &AppConfig, store: Arc<NoteStore>) -> Result<Router, RegistrationError> {
    let tokens = token_service(config);
    let settings = Arc::new(CrudSettings::from_config(&config.crud));

    let (one_slug, all_slug, permissions) = match config.crud.resources.get("notes") {
        Some(resource) => (
            resource.one_slug.as_str(),
            resource.all_slug.as_str(),
            PermissionMap::from(resource.permissions.clone()),
        ),
        None => (NOTES_ONE_SLUG, NOTES_ALL_SLUG, default_note_permissions()),
    };
    info!(one_slug, all_slug, "Registering notes resource");

    let mut app = CrudRoutes::new(
        one_slug,
        all_slug,
        store,
        Arc::new(BearerAuthHandler::new(tokens.clone())),
    )
    .permissions(permissions)
    .settings(settings.clone())
    .register(Router::new())?
    .merge(routing::api_routes());

    if config.is_development() {
        app = app.merge(auth::auth_routes(tokens));
    }

    Ok(app
        .layer(TraceLayer::new_for_http())
        .layer(settings.cors_layer()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use secrecy::Secret;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use webcrud_config::{CrudConfig, JwtConfig, ServerConfig, TelemetryConfig};

    use crate::auth::TokenResponse;

    fn test_config(app_env: &str) -> AppConfig {
        AppConfig {
            app_name: "notes".to_string(),
            app_env: app_env.to_string(),
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
            crud: CrudConfig::default(),
            jwt: JwtConfig {
                secret: Secret::new("gateway_test_secret_with_32_bytes!".to_string()),
                expires_in: 600,
                issuer: "webcrud".to_string(),
                audience: "webcrud-api".to_string(),
            },
        }
    }

    fn app() -> Router {
        build_app(&test_config("development"), Arc::new(NoteStore::new())).unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        if bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn token(app: &Router, role: &str) -> String {
        let req = Request::post("/api/auth/token")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "role": role }).to_string()))
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: TokenResponse = serde_json::from_value(json(response).await).unwrap();
        body.access_token
    }

    fn call(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_admin_crud_flow() {
        let app = app();
        let admin = token(&app, "Admin").await;
        let id = uuid::Uuid::now_v7();
        let one = format!("/api/notes/{}", id);

        let created = app
            .clone()
            .oneshot(call("POST", &one, &admin, Some(json!({ "title": "groceries" }))))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let updated = app
            .clone()
            .oneshot(call("PUT", &one, &admin, Some(json!({ "body": "milk" }))))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);

        let read = app.clone().oneshot(call("GET", &one, &admin, None)).await.unwrap();
        let note = json(read).await;
        assert_eq!(note["title"], "groceries");
        assert_eq!(note["body"], "milk");

        let deleted = app
            .clone()
            .oneshot(call("DELETE", &one, &admin, None))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = app.oneshot(call("GET", &one, &admin, None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_operations() {
        let app = app();
        let admin = token(&app, "Admin").await;

        let created = app
            .clone()
            .oneshot(call(
                "POST",
                "/api/notes",
                &admin,
                Some(json!([{ "title": "alpha" }, { "title": "beta" }])),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = json(created).await;
        let ids: Vec<Value> = created
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].clone())
            .collect();

        let listed = app
            .clone()
            .oneshot(call("GET", "/api/notes?q=ALP", &admin, None))
            .await
            .unwrap();
        assert_eq!(json(listed).await.as_array().unwrap().len(), 1);

        let rejected = app
            .clone()
            .oneshot(call(
                "PUT",
                "/api/notes",
                &admin,
                Some(json!([{ "id": ids[0], "title": "" }])),
            ))
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let deleted = app
            .clone()
            .oneshot(call("DELETE", "/api/notes", &admin, Some(json!({ "ids": ids }))))
            .await
            .unwrap();
        assert_eq!(json(deleted).await["affected"], 2);
    }

    #[tokio::test]
    async fn test_user_is_read_only_and_denials_are_silent() {
        let app = app();
        let admin = token(&app, "Admin").await;
        let user = token(&app, "User").await;
        let one = format!("/api/notes/{}", uuid::Uuid::now_v7());

        app.clone()
            .oneshot(call("POST", &one, &admin, Some(json!({ "title": "keep me" }))))
            .await
            .unwrap();

        let denied = app
            .clone()
            .oneshot(call("DELETE", &one, &user, None))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::OK);
        assert_eq!(json(denied).await, Value::Null);

        let read = app.oneshot(call("GET", &one, &user, None)).await.unwrap();
        assert_eq!(json(read).await["title"], "keep me");
    }

    #[tokio::test]
    async fn test_missing_token_and_bad_method() {
        let app = app();

        let req = Request::get("/api/notes").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let req = Request::patch("/api/notes").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_token_endpoint_only_in_development() {
        for app_env in ["production", "staging"] {
            let app = build_app(&test_config(app_env), Arc::new(NoteStore::new())).unwrap();
            let req = Request::post("/api/auth/token")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "role": "Admin" }).to_string()))
                .unwrap();
            let response = app.oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{app_env}");
        }
    }
}
