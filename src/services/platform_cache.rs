// src/services/platform_cache.rs

use std::{sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

use crate::{
    db::IdentityStore,
    scope::{
        permission::{CatalogEntry, PermissionCatalog},
        Permission, ScopeError,
    },
};

/// Configuração de processo, lida muito e alterada raramente: o catálogo de
/// permissões e a filial prestadora. Recarregada quando passa do TTL ou
/// depois de `invalidate()`.
#[derive(Debug, Clone)]
pub struct PlatformSnapshot {
    pub catalog: Arc<PermissionCatalog>,
    pub provider_filiale_id: Option<Uuid>,
    loaded_at: Instant,
}

#[derive(Clone)]
pub struct PlatformCache {
    store: Arc<dyn IdentityStore>,
    ttl: Duration,
    current: Arc<RwLock<Option<PlatformSnapshot>>>,
}

impl PlatformCache {
    pub fn new(store: Arc<dyn IdentityStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            current: Arc::new(RwLock::new(None)),
        }
    }

    fn is_fresh(&self, snapshot: &PlatformSnapshot) -> bool {
        snapshot.loaded_at.elapsed() < self.ttl
    }

    pub async fn snapshot(&self) -> Result<PlatformSnapshot, ScopeError> {
        {
            let guard = self.current.read().await;
            if let Some(snapshot) = guard.as_ref().filter(|s| self.is_fresh(s)) {
                return Ok(snapshot.clone());
            }
        }

        // Só uma tarefa recarrega; as outras esperam no lock de escrita
        let mut guard = self.current.write().await;
        if let Some(snapshot) = guard.as_ref().filter(|s| self.is_fresh(s)) {
            return Ok(snapshot.clone());
        }

        let snapshot = self.load().await?;
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Chamado quando permissões ou a filial prestadora mudam.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }

    async fn load(&self) -> Result<PlatformSnapshot, ScopeError> {
        let rows = self.store.list_permission_definitions().await?;
        let provider_filiale_id = self.store.provider_filiale_id().await?;

        let entries = rows.into_iter().filter_map(|row| match row.code.parse::<Permission>() {
            Ok(code) => Some(CatalogEntry {
                code,
                description: row.description,
                non_delegatable: row.non_delegatable,
            }),
            Err(_) => {
                tracing::warn!(code = %row.code, "Permissão do catálogo ignorada: código inválido");
                None
            }
        });
        let catalog = PermissionCatalog::new(entries);

        tracing::debug!(
            permissions = catalog.len(),
            provider = ?provider_filiale_id,
            "Catálogo de permissões recarregado"
        );

        Ok(PlatformSnapshot {
            catalog: Arc::new(catalog),
            provider_filiale_id,
            loaded_at: Instant::now(),
        })
    }
}
