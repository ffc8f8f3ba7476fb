// src/services/scope_resolver.rs

use std::{collections::BTreeSet, sync::Arc};

use uuid::Uuid;

use crate::{
    db::IdentityStore,
    scope::{Permission, QueryScope, ScopeError},
    services::platform_cache::PlatformCache,
};

/// Transforma um principal autenticado no `QueryScope` da requisição.
///
/// Falha fechada: se o usuário não existe ou está inativo, não há escopo
/// padrão permissivo, a requisição para com `PrincipalNotFound`. Usuário
/// sem departamento e sem permissões resolve normalmente para um escopo
/// vazio (ausência de permissão é o estado normal de "negado").
#[derive(Clone)]
pub struct ScopeResolver {
    store: Arc<dyn IdentityStore>,
    platform: PlatformCache,
}

impl ScopeResolver {
    pub fn new(store: Arc<dyn IdentityStore>, platform: PlatformCache) -> Self {
        Self { store, platform }
    }

    pub async fn resolve(&self, user_id: Uuid) -> Result<QueryScope, ScopeError> {
        // 1. Usuário + permissões do cargo principal
        let user = self
            .store
            .find_active_user(user_id)
            .await?
            .ok_or(ScopeError::PrincipalNotFound(user_id))?;

        let mut codes = match user.role_id {
            Some(role_id) => self.store.role_permission_codes(role_id).await?,
            None => Vec::new(),
        };

        // 2. Cargos delegados: a união só acrescenta
        codes.extend(self.store.delegated_permission_codes(user_id).await?);
        let permissions = parse_codes(user_id, codes);

        // 3. Departamento -> filial
        let department = match user.department_id {
            Some(department_id) => self.store.find_department(department_id).await?,
            None => None,
        };

        // 4. Resolver = departamento de TI da filial prestadora
        let platform = self.platform.snapshot().await?;
        let is_resolver = department.as_ref().is_some_and(|d| {
            d.is_it_department && platform.provider_filiale_id == Some(d.filiale_id)
        });

        let scope = QueryScope::new(
            user_id,
            permissions,
            department.as_ref().map(|d| d.id),
            department.as_ref().map(|d| d.filiale_id),
            is_resolver,
        );

        tracing::debug!(
            user_id = %user_id,
            permissions = scope.permissions().len(),
            department = ?scope.department_id(),
            filiale = ?scope.filiale_id(),
            is_resolver,
            "Escopo resolvido"
        );

        Ok(scope)
    }
}

// Código que não faz parse é descartado (negado), nunca interpretado.
fn parse_codes(user_id: Uuid, codes: Vec<String>) -> BTreeSet<Permission> {
    codes
        .into_iter()
        .filter_map(|code| match code.parse::<Permission>() {
            Ok(perm) => Some(perm),
            Err(_) => {
                tracing::warn!(user_id = %user_id, code = %code, "Permissão inválida ignorada");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        db::identity_repo::memory::MemoryIdentityStore,
        scope::{Level, Resource},
    };

    fn resolver(store: &Arc<MemoryIdentityStore>) -> ScopeResolver {
        let store: Arc<dyn IdentityStore> = store.clone();
        ScopeResolver::new(store.clone(), PlatformCache::new(store, Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn unknown_or_inactive_user_is_rejected() {
        let store = Arc::new(MemoryIdentityStore::default());
        let inactive = store.add_user(None, None);
        store.with(|s| s.users.get_mut(&inactive).unwrap().is_active = false);
        let resolver = resolver(&store);

        assert!(matches!(
            resolver.resolve(Uuid::new_v4()).await,
            Err(ScopeError::PrincipalNotFound(_))
        ));
        assert!(matches!(
            resolver.resolve(inactive).await,
            Err(ScopeError::PrincipalNotFound(id)) if id == inactive
        ));
    }

    #[tokio::test]
    async fn user_without_role_or_department_gets_empty_scope() {
        let store = Arc::new(MemoryIdentityStore::default());
        let user = store.add_user(None, None);

        let scope = resolver(&store).resolve(user).await.unwrap();
        assert!(scope.permissions().is_empty());
        assert_eq!(scope.department_id(), None);
        assert_eq!(scope.filiale_id(), None);
        assert!(!scope.is_resolver());
    }

    #[tokio::test]
    async fn unions_role_and_delegated_permissions() {
        let store = Arc::new(MemoryIdentityStore::default());
        let filiale = store.add_filiale(false);
        let department = store.add_department(filiale, false);
        let role = store.add_role(None, &["tickets.view_own", "bogus.code"]);
        let user = store.add_user(Some(role), Some(department));
        let delegated = store.add_role(None, &["incidents.view_department"]);
        store.with(|s| s.delegated_assignments.push((user, delegated)));
        // Cargo criado pelo próprio usuário também entra na união
        store.add_role(Some(user), &["tickets.view_own", "timesheets.view_own"]);

        let scope = resolver(&store).resolve(user).await.unwrap();

        let expected: BTreeSet<Permission> = [
            Permission::new(Resource::Tickets, Level::ViewOwn),
            Permission::new(Resource::Incidents, Level::ViewDepartment),
            Permission::new(Resource::Timesheets, Level::ViewOwn),
        ]
        .into_iter()
        .collect();
        assert_eq!(scope.permissions(), &expected);
        assert_eq!(scope.department_id(), Some(department));
        assert_eq!(scope.filiale_id(), Some(filiale));
    }

    #[tokio::test]
    async fn resolver_flag_requires_it_department_of_provider() {
        let store = Arc::new(MemoryIdentityStore::default());
        let provider = store.add_filiale(true);
        let client = store.add_filiale(false);
        let provider_it = store.add_department(provider, true);
        let provider_sales = store.add_department(provider, false);
        let client_it = store.add_department(client, true);
        let resolver = resolver(&store);

        for (department, expected) in [(provider_it, true), (provider_sales, false), (client_it, false)] {
            let user = store.add_user(None, Some(department));
            assert_eq!(resolver.resolve(user).await.unwrap().is_resolver(), expected);
        }
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let store = Arc::new(MemoryIdentityStore::default());
        let provider = store.add_filiale(true);
        let department = store.add_department(provider, true);
        let role = store.add_role(None, &["tickets.view_filiale", "roles.delegate_permissions"]);
        let user = store.add_user(Some(role), Some(department));
        let resolver = resolver(&store);

        let first = resolver.resolve(user).await.unwrap();
        let second = resolver.resolve(user).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn soft_deleted_roles_grant_nothing() {
        let store = Arc::new(MemoryIdentityStore::default());
        let main_role = store.add_role(None, &["tickets.view_own"]);
        let user = store.add_user(Some(main_role), None);
        let own = store.add_role(Some(user), &["incidents.view_all"]);
        let resolver = resolver(&store);

        assert_eq!(resolver.resolve(user).await.unwrap().permissions().len(), 2);

        let now = chrono::Utc::now();
        store.with(|s| {
            s.roles.get_mut(&own).unwrap().deleted_at = Some(now);
            s.roles.get_mut(&main_role).unwrap().deleted_at = Some(now);
        });

        let scope = resolver.resolve(user).await.unwrap();
        assert!(scope.permissions().is_empty());
    }
}
