// src/services/delegation_service.rs

use std::{collections::BTreeSet, sync::Arc};

use uuid::Uuid;

use crate::{
    db::IdentityStore,
    models::rbac::{DelegationRoleView, Role, RoleResponse, RoleScopeTag},
    scope::{gate, Level, Permission, PermissionCatalog, QueryScope, Resource, ScopeError},
    services::{platform_cache::PlatformCache, scope_resolver::ScopeResolver},
};

const DELEGATE: Permission = Permission::new(Resource::Roles, Level::DelegatePermissions);
const ROLES_UPDATE: Permission = Permission::new(Resource::Roles, Level::Update);
const ROLES_VIEW_ALL: Permission = Permission::new(Resource::Roles, Level::ViewAll);

/// Delegação de permissões: um usuário só concede o que ele mesmo possui,
/// menos o que o catálogo marca como não-delegável.
#[derive(Clone)]
pub struct DelegationService {
    store: Arc<dyn IdentityStore>,
    resolver: ScopeResolver,
    platform: PlatformCache,
}

impl DelegationService {
    pub fn new(store: Arc<dyn IdentityStore>, resolver: ScopeResolver, platform: PlatformCache) -> Self {
        Self { store, resolver, platform }
    }

    pub async fn assignable_permissions(&self, user_id: Uuid) -> Result<BTreeSet<Permission>, ScopeError> {
        let scope = self.resolver.resolve(user_id).await?;
        self.assignable_for(&scope).await
    }

    /// Mesmo cálculo, para quem já tem o escopo da requisição em mãos.
    pub async fn assignable_for(&self, scope: &QueryScope) -> Result<BTreeSet<Permission>, ScopeError> {
        let platform = self.platform.snapshot().await?;
        Ok(assignable(scope, &platform.catalog))
    }

    pub async fn get_for_delegation_page(
        &self,
        user_id: Uuid,
        filiale_id: Option<Uuid>,
    ) -> Result<Vec<DelegationRoleView>, ScopeError> {
        let scope = self.resolver.resolve(user_id).await?;
        self.delegation_page_for(&scope, filiale_id).await
    }

    pub async fn delegation_page_for(
        &self,
        scope: &QueryScope,
        filiale_id: Option<Uuid>,
    ) -> Result<Vec<DelegationRoleView>, ScopeError> {
        // 1. Cargos criados pelo usuário (editáveis)
        let own = self.store.roles_created_by(scope.user_id()).await?;
        let own_ids: BTreeSet<Uuid> = own.iter().map(|r| r.id).collect();

        // 2. Cargos em uso na filial (somente leitura). Fora da própria filial,
        //    só com permissão global de cargos.
        let in_use = if gate::holds(scope, ROLES_VIEW_ALL) {
            self.store.roles_in_use(filiale_id).await?
        } else {
            match filiale_id.or(scope.filiale_id()) {
                Some(requested) if Some(requested) == scope.filiale_id() => {
                    self.store.roles_in_use(Some(requested)).await?
                }
                _ => Vec::new(),
            }
        };

        let mut page: Vec<DelegationRoleView> = own
            .into_iter()
            .map(|role| DelegationRoleView { role, editable: true })
            .collect();
        page.extend(
            in_use
                .into_iter()
                .filter(|role| !own_ids.contains(&role.id))
                .map(|role| DelegationRoleView { role, editable: false }),
        );
        Ok(page)
    }

    pub async fn create_delegated_role(
        &self,
        actor: &QueryScope,
        name: &str,
        description: Option<&str>,
        codes: &[String],
    ) -> Result<RoleResponse, ScopeError> {
        if !gate::holds(actor, DELEGATE) {
            tracing::warn!(user_id = %actor.user_id(), "Criação de cargo sem permissão de delegação");
            return Err(ScopeError::PrivilegeEscalationDenied { code: DELEGATE.code() });
        }

        let granted = self.check_grant(actor, codes).await?;
        let stored: Vec<String> = granted.iter().map(Permission::code).collect();

        let role = self
            .store
            .create_role_with_permissions(name, description, actor.user_id(), scope_tag_for(&granted), &stored)
            .await?;

        tracing::info!(user_id = %actor.user_id(), role_id = %role.id, permissions = stored.len(), "Cargo delegado criado");

        Ok(RoleResponse { role, permissions: stored })
    }

    /// Troca o conjunto inteiro de permissões do cargo. Qualquer código
    /// não-atribuível rejeita a operação toda antes de qualquer escrita.
    pub async fn update_role_permissions(
        &self,
        actor: &QueryScope,
        role_id: Uuid,
        codes: &[String],
    ) -> Result<RoleResponse, ScopeError> {
        let role = self
            .store
            .find_role(role_id)
            .await?
            .ok_or(ScopeError::RoleNotFound(role_id))?;

        if !can_edit(actor, &role) {
            return Err(ScopeError::RoleNotEditable(role_id));
        }

        let granted = self.check_grant(actor, codes).await?;
        let stored: Vec<String> = granted.iter().map(Permission::code).collect();

        self.store.replace_role_permissions(role_id, &stored).await?;

        tracing::info!(user_id = %actor.user_id(), role_id = %role_id, permissions = stored.len(), "Permissões do cargo atualizadas");

        Ok(RoleResponse { role, permissions: stored })
    }

    async fn check_grant(&self, actor: &QueryScope, codes: &[String]) -> Result<BTreeSet<Permission>, ScopeError> {
        let requested = codes
            .iter()
            .map(|code| code.parse::<Permission>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let allowed = self.assignable_for(actor).await?;
        if let Some(denied) = requested.iter().find(|p| !allowed.contains(p)) {
            tracing::warn!(user_id = %actor.user_id(), code = %denied, "Tentativa de conceder permissão não possuída");
            return Err(ScopeError::PrivilegeEscalationDenied { code: denied.code() });
        }
        Ok(requested)
    }
}

fn assignable(scope: &QueryScope, catalog: &PermissionCatalog) -> BTreeSet<Permission> {
    scope
        .permissions()
        .iter()
        .filter(|p| catalog.is_delegatable(p))
        .copied()
        .collect()
}

fn can_edit(actor: &QueryScope, role: &Role) -> bool {
    role.created_by == Some(actor.user_id())
        || (gate::holds(actor, ROLES_UPDATE) && gate::holds(actor, ROLES_VIEW_ALL))
}

// Rótulo informativo: o nível de visibilidade mais amplo concedido.
fn scope_tag_for(granted: &BTreeSet<Permission>) -> RoleScopeTag {
    match granted.iter().filter_map(|p| p.level.visibility_rank()).max() {
        Some(3) => RoleScopeTag::Global,
        Some(2) => RoleScopeTag::Filiale,
        _ => RoleScopeTag::Department,
    }
}
