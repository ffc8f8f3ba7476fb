// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Escopo informativo do cargo (não participa da filtragem)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "role_scope_tag", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoleScopeTag {
    Global,
    Filiale,
    Department,
}

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Técnico N1")]
    pub name: String,

    pub description: Option<String>,

    // Nulo = cargo de sistema
    pub created_by: Option<Uuid>,

    pub scope_tag: RoleScopeTag,

    // Soft-delete: cargo em uso nunca é apagado de fato
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: Option<DateTime<Utc>>,
}

// O que sai do banco (Tabela Permissions)
#[derive(Debug, Clone, FromRow)]
pub struct PermissionRow {
    pub code: String,
    pub description: String,
    pub non_delegatable: bool,
}

// Cargo + códigos, como o frontend consome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["tickets.view_own", "tickets.create"]))]
    pub permissions: Vec<String>,
}

// Linha da tela de delegação: cargos próprios (editáveis) e cargos em uso
// na filial (somente leitura, para contexto)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRoleView {
    #[serde(flatten)]
    pub role: Role,
    pub editable: bool,
}

// O Payload para criar um cargo delegado
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 120, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "Auxiliar de Suporte")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = json!(["tickets.view_own", "tickets.create"]))]
    pub permissions: Vec<String>,
}

// O Payload para substituir as permissões de um cargo
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePermissionsPayload {
    #[schema(example = json!(["tickets.view_own"]))]
    pub permissions: Vec<String>,
}

// Filtro da tela de delegação; sem filial = a do próprio usuário
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct DelegationPageQuery {
    pub filiale_id: Option<Uuid>,
}
