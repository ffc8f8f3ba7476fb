// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, scope::scope_guard},
};

pub fn router(app_state: AppState) -> Router {
    // Rotas protegidas: token -> escopo -> handler
    let protected_routes = Router::new()
        .route("/me/scope", get(handlers::me::get_my_scope))
        .route("/tickets", get(handlers::tickets::list_tickets))
        .route("/permissions", get(handlers::rbac::list_permissions))
        .route("/roles", post(handlers::rbac::create_role))
        .route(
            "/roles/assignable-permissions",
            get(handlers::rbac::list_assignable_permissions),
        )
        .route("/roles/delegation", get(handlers::rbac::get_delegation_page))
        .route(
            "/roles/{id}/permissions",
            put(handlers::rbac::update_role_permissions),
        )
        // A última camada roda primeiro
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), scope_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", protected_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::Settings,
        db::{identity_repo::memory::MemoryIdentityStore, IdentityStore},
        middleware::auth::test_tokens,
    };

    const SECRET: &str = "segredo-de-teste";

    fn app(store: &Arc<MemoryIdentityStore>) -> Router {
        let settings = Settings::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/scope_test".to_string()),
            "JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap();
        // Nunca conecta: as rotas testadas aqui não chegam ao banco de tickets
        let pool = PgPoolOptions::new().connect_lazy(&settings.database_url).unwrap();
        let store: Arc<dyn IdentityStore> = store.clone();
        router(AppState::build(&settings, store, pool).unwrap())
    }

    fn request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", test_tokens::issue(user, SECRET)));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_or_invalid_token_is_401() {
        let store = Arc::new(MemoryIdentityStore::default());
        let app = app(&store);

        let response = app.clone().oneshot(request(Method::GET, "/api/me/scope", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let garbage = Request::builder()
            .uri("/api/me/scope")
            .header(header::AUTHORIZATION, "Bearer nao-e-um-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(garbage).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_principal_is_401() {
        let store = Arc::new(MemoryIdentityStore::default());
        let response = app(&store)
            .oneshot(request(Method::GET, "/api/me/scope", Some(Uuid::new_v4()), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_scope_returns_resolved_scope() {
        let store = Arc::new(MemoryIdentityStore::default());
        let filiale = store.add_filiale(false);
        let department = store.add_department(filiale, false);
        let role = store.add_role(None, &["tickets.view_own", "tickets.create"]);
        let user = store.add_user(Some(role), Some(department));

        let response = app(&store)
            .oneshot(request(Method::GET, "/api/me/scope", Some(user), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["userId"], json!(user));
        assert_eq!(body["permissions"], json!(["tickets.view_own", "tickets.create"]));
        assert_eq!(body["filialeId"], json!(filiale));
        assert_eq!(body["isResolver"], json!(false));
    }

    #[tokio::test]
    async fn tickets_without_any_view_permission_is_403() {
        let store = Arc::new(MemoryIdentityStore::default());
        let role = store.add_role(None, &["tickets.create"]);
        let user = store.add_user(Some(role), None);

        let response = app(&store)
            .oneshot(request(Method::GET, "/api/tickets", Some(user), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn role_creation_is_gated_and_checked_for_escalation() {
        let store = Arc::new(MemoryIdentityStore::default());
        store.set_catalog(&[
            ("tickets.view_own", false),
            ("tickets.create", false),
            ("tickets.delete", false),
            ("roles.delegate_permissions", true),
        ]);
        let filiale = store.add_filiale(false);
        let department = store.add_department(filiale, false);
        let plain = store.add_user(Some(store.add_role(None, &["tickets.view_own"])), Some(department));
        let delegator_role = store.add_role(None, &["tickets.view_own", "tickets.create", "roles.delegate_permissions"]);
        let delegator = store.add_user(Some(delegator_role), Some(department));
        let app = app(&store);

        let payload = json!({ "name": "Auxiliar", "permissions": ["tickets.view_own"] });
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/roles", Some(plain), Some(payload.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let escalation = json!({ "name": "Auxiliar", "permissions": ["tickets.delete"] });
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/roles", Some(delegator), Some(escalation)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let empty_name = json!({ "name": "", "permissions": [] });
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/roles", Some(delegator), Some(empty_name)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/roles", Some(delegator), Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["createdBy"], json!(delegator));
        assert_eq!(body["permissions"], json!(["tickets.view_own"]));

        let response = app
            .oneshot(request(Method::GET, "/api/roles/assignable-permissions", Some(delegator), None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!(["tickets.view_own", "tickets.create"]));
    }

    #[tokio::test]
    async fn updating_unknown_role_is_404() {
        let store = Arc::new(MemoryIdentityStore::default());
        let user = store.add_user(Some(store.add_role(None, &["roles.delegate_permissions"])), None);

        let uri = format!("/api/roles/{}/permissions", Uuid::new_v4());
        let response = app(&store)
            .oneshot(request(Method::PUT, &uri, Some(user), Some(json!({ "permissions": [] }))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn openapi_document_is_public() {
        let store = Arc::new(MemoryIdentityStore::default());
        let response = app(&store)
            .oneshot(request(Method::GET, "/api/openapi.json", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["paths"]["/api/tickets"].is_object());
    }
}
