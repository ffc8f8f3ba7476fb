// src/handlers/tickets.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    db::TicketRepository,
    middleware::scope::Scope,
    models::tickets::{TicketListQuery, TicketListResponse},
    scope::{hint, EntityKind},
};

// GET /api/tickets
#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "Tickets",
    params(TicketListQuery),
    responses(
        (status = 200, description = "Tickets visíveis no escopo do usuário", body = TicketListResponse),
        (status = 403, description = "Nenhuma permissão de visualização de tickets")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    Scope(scope): Scope,
    Query(params): Query<TicketListQuery>,
) -> Result<Json<TicketListResponse>, AppError> {
    // 1. Portão grosso: quem não vê nada recebe 403 antes da consulta
    if app_state.registry.decide(EntityKind::Tickets, &scope).grants_nothing() {
        return Err(AppError::Forbidden("tickets.view_*".to_string()));
    }

    // 2. Filtros do chamador + escopo (sempre por último)
    let query = app_state
        .registry
        .apply_tickets_scope(TicketRepository::list_query(params.category_id), &scope);
    let items = app_state.ticket_repo.fetch_all(query).await?;

    // 3. Só apresentação, depois da filtragem
    let scope = hint::annotate(&app_state.registry, EntityKind::Tickets, scope);

    Ok(Json(TicketListResponse {
        scope_hint: scope.dashboard_scope_hint(),
        items,
    }))
}
