// src/handlers/me.rs

use axum::Json;

use crate::{middleware::scope::Scope, scope::QueryScope};

// GET /api/me/scope
#[utoipa::path(
    get,
    path = "/api/me/scope",
    tag = "Scope",
    responses(
        (status = 200, description = "Escopo resolvido do usuário autenticado", body = QueryScope),
        (status = 401, description = "Token ausente, inválido ou usuário inativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_scope(Scope(scope): Scope) -> Json<QueryScope> {
    Json(scope)
}
