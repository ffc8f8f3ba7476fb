// src/middleware/scope.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::Principal,
    scope::QueryScope,
};

// Resolve o escopo uma única vez por requisição. Roda depois do auth_guard.
pub async fn scope_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Principal(user_id) = request
        .extensions()
        .get::<Principal>()
        .copied()
        .ok_or(AppError::InvalidToken)?;

    let scope = app_state.scope_resolver.resolve(user_id).await?;

    request.extensions_mut().insert(scope);
    Ok(next.run(request).await)
}

/// Extrator do escopo da requisição. Sem escopo resolvido, a rota não roda:
/// nunca existe um escopo padrão.
pub struct Scope(pub QueryScope);

impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<QueryScope>()
            .cloned()
            .map(Scope)
            .ok_or(AppError::InvalidToken)
    }
}
