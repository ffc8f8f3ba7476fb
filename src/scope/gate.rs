// src/scope/gate.rs

// Predicados de admissão "grossa", usados pelos handlers antes de qualquer
// acesso a dados. Nunca consultam o banco e nunca falham: código que não
// faz parse é simplesmente "não possui".

use super::{permission::Permission, query_scope::QueryScope};

pub fn has_permission(scope: &QueryScope, code: &str) -> bool {
    code.parse::<Permission>()
        .is_ok_and(|perm| scope.permissions().contains(&perm))
}

/// Mesma semântica de `has_permission`; o nome marca um ponto de corte do handler.
pub fn require_permission(scope: &QueryScope, code: &str) -> bool {
    has_permission(scope, code)
}

pub fn require_any_permission<S: AsRef<str>>(scope: &QueryScope, codes: &[S]) -> bool {
    codes.iter().any(|code| has_permission(scope, code.as_ref()))
}

// Variantes tipadas, para quem já tem a constante em mãos.
pub fn holds(scope: &QueryScope, permission: Permission) -> bool {
    scope.permissions().contains(&permission)
}

pub fn holds_any(scope: &QueryScope, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| holds(scope, *p))
}
