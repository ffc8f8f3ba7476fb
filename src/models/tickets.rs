// src/models/tickets.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::scope::ScopeHint;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub filiale_id: Uuid,
    pub department_id: Option<Uuid>,
    // Filial prestadora para quem o ticket foi aberto
    pub target_filiale_id: Option<Uuid>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TicketListQuery {
    pub category_id: Option<Uuid>,
}

// Lista + contexto para o dashboard ("Você está vendo: ...")
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketListResponse {
    pub scope_hint: Option<ScopeHint>,
    pub items: Vec<Ticket>,
}
