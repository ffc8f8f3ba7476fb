// src/db/ticket_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tickets::Ticket,
    scope::{Scoped, ScopedQuery, Unscoped},
};

const TICKET_SELECT: &str = r#"
    SELECT t.id, t.title, t.category_id, t.filiale_id, t.department_id,
           t.target_filiale_id, t.created_by, t.assigned_to, t.created_at
    FROM tickets t
"#;

#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Consulta base com os filtros do chamador. Ainda sem escopo:
    /// não pode ser executada antes de passar pelo registro.
    pub fn list_query(category_id: Option<Uuid>) -> ScopedQuery<Unscoped> {
        let query = ScopedQuery::select(TICKET_SELECT).tail("ORDER BY t.created_at DESC LIMIT 200");
        match category_id {
            Some(category) => query.and_where_eq("t.category_id", category),
            None => query,
        }
    }

    // Só aceita consultas já escopadas
    pub async fn fetch_all(&self, query: ScopedQuery<Scoped>) -> Result<Vec<Ticket>, AppError> {
        if query.is_deny_all() {
            // Nem vai ao banco: o resultado é vazio por construção
            return Ok(Vec::new());
        }

        let mut builder = query.into_builder();
        let tickets = builder
            .build_query_as::<Ticket>()
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }
}
