// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    scope::{gate, Level, Permission, QueryScope, Resource},
};

/// 1. O Trait que define o que é uma exigência de permissão (basta uma da lista)
pub trait PermissionDef: Send + Sync + 'static {
    fn any_of() -> &'static [Permission];
}

/// 2. O Extractor (Guardião grosso, antes de qualquer consulta)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o escopo (o scope_guard já rodou)
        let scope = parts
            .extensions
            .get::<QueryScope>()
            .ok_or(AppError::InvalidToken)?;

        // B. Verifica em memória, sem ir ao banco
        let required = T::any_of();
        if !gate::holds_any(scope, required) {
            let codes: Vec<String> = required.iter().map(Permission::code).collect();
            tracing::debug!(user_id = %scope.user_id(), required = ?codes, "Portão de permissão negou");
            return Err(AppError::Forbidden(codes.join(" | ")));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

const DELEGATE: Permission = Permission::new(Resource::Roles, Level::DelegatePermissions);
const ROLES_VIEW_ALL: Permission = Permission::new(Resource::Roles, Level::ViewAll);

pub struct PermDelegateRoles;
impl PermissionDef for PermDelegateRoles {
    fn any_of() -> &'static [Permission] {
        const REQUIRED: &[Permission] = &[DELEGATE];
        REQUIRED
    }
}

// Tela de delegação: quem delega ou quem gerencia cargos globalmente
pub struct PermViewDelegation;
impl PermissionDef for PermViewDelegation {
    fn any_of() -> &'static [Permission] {
        const REQUIRED: &[Permission] = &[DELEGATE, ROLES_VIEW_ALL];
        REQUIRED
    }
}
