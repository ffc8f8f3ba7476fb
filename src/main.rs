// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use scope_engine::{
    config::{AppState, Settings},
    routes,
    services::PlatformCache,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG=scope_engine=debug para ver as decisões de escopo)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    tracing::info!(
        resolver_entities = ?settings.resolver_entities,
        cache_ttl = ?settings.scope_cache_ttl,
        "Motor de escopo configurado"
    );

    spawn_reload_on_sighup(app_state.platform.clone());

    let app = routes::router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

// `kill -HUP` depois de mudar permissões ou a filial prestadora
#[cfg(unix)]
fn spawn_reload_on_sighup(platform: PlatformCache) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("SIGHUP indisponível, o catálogo só expira pelo TTL: {}", e);
                return;
            }
        };
        while hangups.recv().await.is_some() {
            platform.invalidate().await;
            tracing::info!("Catálogo de permissões invalidado (SIGHUP)");
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_sighup(_platform: PlatformCache) {}
