// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// O usuário como este serviço o enxerga: só o necessário para resolver escopo.
// O cadastro completo pertence ao subsistema de identidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub role_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub is_active: bool,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
