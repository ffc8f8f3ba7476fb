// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::scope::ScopeError;

// Erro da camada HTTP. Os erros do motor de escopo chegam intactos e só
// aqui viram status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    // Reprovado no portão grosso, antes de qualquer consulta
    #[error("Permissão necessária: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Scope(e) => match e {
                ScopeError::PrincipalNotFound(_) => StatusCode::UNAUTHORIZED,
                ScopeError::PrivilegeEscalationDenied { .. } | ScopeError::RoleNotEditable(_) => {
                    StatusCode::FORBIDDEN
                }
                ScopeError::RoleNotFound(_) => StatusCode::NOT_FOUND,
                ScopeError::UnknownPermission(_) => StatusCode::BAD_REQUEST,
                ScopeError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match self {
            // Devolve todos os detalhes da validação
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            // Não diz se o usuário existe: mesma resposta de token inválido
            AppError::InvalidToken | AppError::Scope(ScopeError::PrincipalNotFound(_)) => {
                "Token de autenticação inválido ou ausente.".to_string()
            }
            AppError::Forbidden(code) => {
                format!("Você precisa da permissão '{}' para realizar esta ação.", code)
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // O `tracing` loga a mensagem detalhada; o cliente recebe a genérica
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
