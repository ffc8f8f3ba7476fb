// src/handlers/rbac.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{PermDelegateRoles, PermViewDelegation, RequirePermission},
        scope::Scope,
    },
    models::rbac::{
        CreateRolePayload, DelegationPageQuery, DelegationRoleView, RoleResponse,
        UpdateRolePermissionsPayload,
    },
    scope::{permission::CatalogEntry, Permission},
};

// GET /api/permissions (Para o frontend saber o que mostrar na tela de criação)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Catálogo de permissões", body = Vec<CatalogEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let platform = app_state.platform.snapshot().await?;
    let entries = platform.catalog.entries().into_iter().cloned().collect();
    Ok(Json(entries))
}

// GET /api/roles/assignable-permissions
#[utoipa::path(
    get,
    path = "/api/roles/assignable-permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Permissões que o usuário pode conceder", body = Vec<String>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_assignable_permissions(
    State(app_state): State<AppState>,
    Scope(scope): Scope,
) -> Result<Json<Vec<String>>, AppError> {
    let assignable = app_state.delegation_service.assignable_for(&scope).await?;
    Ok(Json(assignable.iter().map(Permission::code).collect()))
}

// GET /api/roles/delegation
#[utoipa::path(
    get,
    path = "/api/roles/delegation",
    tag = "RBAC",
    params(DelegationPageQuery),
    responses(
        (status = 200, description = "Cargos próprios (editáveis) e cargos em uso na filial", body = Vec<DelegationRoleView>),
        (status = 403, description = "Sem permissão de delegação")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_delegation_page(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermViewDelegation>,
    Scope(scope): Scope,
    Query(params): Query<DelegationPageQuery>,
) -> Result<Json<Vec<DelegationRoleView>>, AppError> {
    let page = app_state
        .delegation_service
        .delegation_page_for(&scope, params.filiale_id)
        .await?;
    Ok(Json(page))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Cargo delegado criado", body = RoleResponse),
        (status = 400, description = "Dados inválidos ou permissão desconhecida"),
        (status = 403, description = "Permissão acima das do usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermDelegateRoles>,
    Scope(scope): Scope,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .delegation_service
        .create_delegated_role(
            &scope,
            &payload.name,
            payload.description.as_deref(),
            &payload.permissions,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// PUT /api/roles/{id}/permissions
#[utoipa::path(
    put,
    path = "/api/roles/{id}/permissions",
    tag = "RBAC",
    request_body = UpdateRolePermissionsPayload,
    params(
        ("id" = Uuid, Path, description = "ID do cargo")
    ),
    responses(
        (status = 200, description = "Permissões substituídas", body = RoleResponse),
        (status = 403, description = "Cargo não editável ou permissão acima das do usuário"),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role_permissions(
    State(app_state): State<AppState>,
    Scope(scope): Scope,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRolePermissionsPayload>,
) -> Result<Json<RoleResponse>, AppError> {
    let response = app_state
        .delegation_service
        .update_role_permissions(&scope, role_id, &payload.permissions)
        .await?;
    Ok(Json(response))
}
