// src/scope/error.rs

use thiserror::Error;
use uuid::Uuid;

// Erros do motor de escopo. Propagam sem alteração até o handler,
// que decide o status HTTP (ver common::error).
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Usuário {0} não encontrado ou inativo")]
    PrincipalNotFound(Uuid),

    #[error("Permissão '{code}' excede as permissões do concedente")]
    PrivilegeEscalationDenied { code: String },

    #[error("Permissão desconhecida: '{0}'")]
    UnknownPermission(String),

    #[error("Cargo {0} não encontrado")]
    RoleNotFound(Uuid),

    #[error("Cargo {0} não pode ser editado por este usuário")]
    RoleNotEditable(Uuid),

    #[error("Erro de banco de dados")]
    Database(#[from] sqlx::Error),
}
