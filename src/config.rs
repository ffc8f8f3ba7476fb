// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{IdentityStore, PgIdentityStore, TicketRepository},
    scope::{filter::parse_entity_list, EntityKind, ScopeRegistry},
    services::{DelegationService, PlatformCache, ScopeResolver},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_RESOLVER_ENTITIES: &str = "tickets,tickets_internal,search_tickets";

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub scope_cache_ttl: Duration,
    // Entidades onde o TI da prestadora vê o que foi direcionado à filial
    pub resolver_entities: Vec<EntityKind>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR inválido")?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let ttl_secs = match lookup("SCOPE_CACHE_TTL_SECS") {
            Some(raw) => raw.parse().context("SCOPE_CACHE_TTL_SECS deve ser um número")?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let resolver_entities = parse_entity_list(
            &lookup("RESOLVER_ENTITIES").unwrap_or_else(|| DEFAULT_RESOLVER_ENTITIES.to_string()),
        )
        .context("RESOLVER_ENTITIES inválido")?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            scope_cache_ttl: Duration::from_secs(ttl_secs),
            resolver_entities,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: String,
    pub registry: Arc<ScopeRegistry>,
    pub platform: PlatformCache,
    pub scope_resolver: ScopeResolver,
    pub delegation_service: DelegationService,
    pub ticket_repo: TicketRepository,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!().run(&db_pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        let store: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(db_pool.clone()));
        Self::build(settings, store, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(settings: &Settings, store: Arc<dyn IdentityStore>, db_pool: PgPool) -> anyhow::Result<Self> {
        // Falha na partida se a lista do resolver cita entidade sem coluna de filial-alvo
        let registry = Arc::new(ScopeRegistry::standard(&settings.resolver_entities)?);

        let platform = PlatformCache::new(store.clone(), settings.scope_cache_ttl);
        let scope_resolver = ScopeResolver::new(store.clone(), platform.clone());
        let delegation_service = DelegationService::new(store, scope_resolver.clone(), platform.clone());
        let ticket_repo = TicketRepository::new(db_pool);

        Ok(Self {
            jwt_secret: settings.jwt_secret.clone(),
            registry,
            platform,
            scope_resolver,
            delegation_service,
            ticket_repo,
        })
    }
}
