// src/scope/hint.rs

// Dica de apresentação para listas/dashboards ("Você está vendo: tickets do
// seu departamento"). Roda DEPOIS da filtragem e nunca decide acesso.

use serde::Serialize;
use utoipa::ToSchema;

use super::{
    filter::{EntityKind, ScopeDecision, ScopeRegistry, Visibility},
    query_scope::QueryScope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScopeHint {
    Own,
    Department,
    Filiale,
    All,
}

impl ScopeHint {
    /// Mesma prioridade da cascata. O ramo do resolver é mostrado como
    /// "filiale": o usuário vê o que foi direcionado à filial dele.
    pub fn from_decision(decision: &ScopeDecision) -> Option<ScopeHint> {
        match decision.visibility {
            Visibility::All => Some(ScopeHint::All),
            Visibility::Filiale(_) => Some(ScopeHint::Filiale),
            _ if decision.resolver_filiale.is_some() => Some(ScopeHint::Filiale),
            Visibility::Department(_) => Some(ScopeHint::Department),
            Visibility::Own(_) => Some(ScopeHint::Own),
            Visibility::Nothing => None,
        }
    }
}

/// Devolve o escopo anotado com o nível efetivamente exercido para `kind`.
pub fn annotate(registry: &ScopeRegistry, kind: EntityKind, scope: QueryScope) -> QueryScope {
    let hint = ScopeHint::from_decision(&registry.decide(kind, &scope));
    scope.with_dashboard_hint(hint)
}
