// src/scope/query_scope.rs

use std::collections::BTreeSet;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    hint::ScopeHint,
    permission::{Level, Permission, Resource},
};

/// Contexto de autorização resolvido para uma requisição.
///
/// Construído uma única vez pelo `ScopeResolver` e descartado no fim da
/// requisição. Os campos são privados: nenhum caminho de código altera
/// permissões, departamento ou filial depois da construção. A única
/// anotação posterior é a dica de dashboard, aplicada por valor
/// (`with_dashboard_hint`), e ela nunca participa da filtragem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryScope {
    user_id: Uuid,
    #[schema(value_type = Vec<String>, example = json!(["tickets.view_own"]))]
    permissions: BTreeSet<Permission>,
    department_id: Option<Uuid>,
    filiale_id: Option<Uuid>,
    is_resolver: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard_scope_hint: Option<ScopeHint>,
}

impl QueryScope {
    pub fn new(
        user_id: Uuid,
        permissions: impl IntoIterator<Item = Permission>,
        department_id: Option<Uuid>,
        filiale_id: Option<Uuid>,
        is_resolver: bool,
    ) -> Self {
        Self {
            user_id,
            permissions: permissions.into_iter().collect(),
            department_id,
            filiale_id,
            is_resolver,
            dashboard_scope_hint: None,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    pub fn department_id(&self) -> Option<Uuid> {
        self.department_id
    }

    pub fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }

    pub fn is_resolver(&self) -> bool {
        self.is_resolver
    }

    pub fn dashboard_scope_hint(&self) -> Option<ScopeHint> {
        self.dashboard_scope_hint
    }

    /// Pertinência exata no conjunto. A hierarquia só é aplicada pelos filtros.
    pub fn holds(&self, resource: Resource, level: Level) -> bool {
        self.permissions.contains(&Permission::new(resource, level))
    }

    pub(crate) fn with_dashboard_hint(mut self, hint: Option<ScopeHint>) -> Self {
        self.dashboard_scope_hint = hint;
        self
    }
}
