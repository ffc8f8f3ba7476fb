// src/models/org.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// ---
// Departamento (o limite intermediário)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub filiale_id: Uuid,
    pub is_it_department: bool,
}
