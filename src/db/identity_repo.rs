// src/db/identity_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        auth::User,
        org::Department,
        rbac::{PermissionRow, Role, RoleScopeTag},
    },
    scope::ScopeError,
};

/// O que o motor de escopo consome do subsistema de identidade.
///
/// A implementação de produção é o `PgIdentityStore`; os testes usam um
/// store em memória. Toda leitura é uma consulta simples, sem transação
/// própria. As duas escritas (criar cargo, trocar permissões) são atômicas.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_active_user(&self, user_id: Uuid) -> Result<Option<User>, ScopeError>;

    async fn role_permission_codes(&self, role_id: Uuid) -> Result<Vec<String>, ScopeError>;

    /// Permissões vindas de cargos criados pelo usuário ou atribuídos a ele como delegados.
    async fn delegated_permission_codes(&self, user_id: Uuid) -> Result<Vec<String>, ScopeError>;

    async fn find_department(&self, department_id: Uuid) -> Result<Option<Department>, ScopeError>;

    async fn provider_filiale_id(&self) -> Result<Option<Uuid>, ScopeError>;

    async fn list_permission_definitions(&self) -> Result<Vec<PermissionRow>, ScopeError>;

    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, ScopeError>;

    async fn roles_created_by(&self, user_id: Uuid) -> Result<Vec<Role>, ScopeError>;

    /// Cargos usados por pelo menos um usuário ativo; `None` = todas as filiais.
    async fn roles_in_use(&self, filiale_id: Option<Uuid>) -> Result<Vec<Role>, ScopeError>;

    async fn create_role_with_permissions(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: Uuid,
        scope_tag: RoleScopeTag,
        codes: &[String],
    ) -> Result<Role, ScopeError>;

    /// Substitui o conjunto inteiro, tudo ou nada.
    async fn replace_role_permissions(&self, role_id: Uuid, codes: &[String]) -> Result<(), ScopeError>;
}

const ROLE_COLUMNS: &str = "r.id, r.name, r.description, r.created_by, r.scope_tag, r.deleted_at, r.created_at";

#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_active_user(&self, user_id: Uuid) -> Result<Option<User>, ScopeError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, role_id, department_id, is_active FROM users WHERE id = $1 AND is_active = true",
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn role_permission_codes(&self, role_id: Uuid) -> Result<Vec<String>, ScopeError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT rp.permission_code
            FROM role_permissions rp
            JOIN roles r ON r.id = rp.role_id
            WHERE rp.role_id = $1 AND r.deleted_at IS NULL
            "#,
        )
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    async fn delegated_permission_codes(&self, user_id: Uuid) -> Result<Vec<String>, ScopeError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT rp.permission_code
            FROM role_permissions rp
            JOIN roles r ON r.id = rp.role_id
            WHERE r.deleted_at IS NULL
              AND (
                r.created_by = $1
                OR EXISTS (
                    SELECT 1 FROM user_roles ur
                    WHERE ur.role_id = r.id AND ur.user_id = $1 AND ur.is_delegated = true
                )
              )
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(codes)
    }

    async fn find_department(&self, department_id: Uuid) -> Result<Option<Department>, ScopeError> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, filiale_id, is_it_department FROM departments WHERE id = $1",
        )
            .bind(department_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(department)
    }

    async fn provider_filiale_id(&self) -> Result<Option<Uuid>, ScopeError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM filiales WHERE is_software_provider = true LIMIT 1",
        )
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn list_permission_definitions(&self) -> Result<Vec<PermissionRow>, ScopeError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT code, description, non_delegatable FROM permissions ORDER BY code",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_role(&self, role_id: Uuid) -> Result<Option<Role>, ScopeError> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles r WHERE r.id = $1 AND r.deleted_at IS NULL"
        ))
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn roles_created_by(&self, user_id: Uuid) -> Result<Vec<Role>, ScopeError> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles r WHERE r.created_by = $1 AND r.deleted_at IS NULL ORDER BY r.name"
        ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn roles_in_use(&self, filiale_id: Option<Uuid>) -> Result<Vec<Role>, ScopeError> {
        // $1 nulo = sem restrição de filial
        let roles = sqlx::query_as::<_, Role>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM roles r
            WHERE r.deleted_at IS NULL
              AND EXISTS (
                SELECT 1
                FROM users u
                JOIN departments d ON d.id = u.department_id
                LEFT JOIN user_roles ur ON ur.user_id = u.id AND ur.role_id = r.id AND ur.is_delegated = true
                WHERE u.is_active = true
                  AND (u.role_id = r.id OR ur.role_id IS NOT NULL)
                  AND ($1::uuid IS NULL OR d.filiale_id = $1)
              )
            ORDER BY r.name
            "#
        ))
            .bind(filiale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn create_role_with_permissions(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: Uuid,
        scope_tag: RoleScopeTag,
        codes: &[String],
    ) -> Result<Role, ScopeError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, created_by, scope_tag)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, created_by, scope_tag, deleted_at, created_at
            "#,
        )
            .bind(name)
            .bind(description)
            .bind(created_by)
            .bind(scope_tag)
            .fetch_one(&mut *tx)
            .await?;

        // 3. Salva o Vínculo (inserção em massa com UNNEST)
        if !codes.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_code)
                SELECT $1, unnest($2::text[])
                ON CONFLICT DO NOTHING
                "#,
            )
                .bind(role.id)
                .bind(codes)
                .execute(&mut *tx)
                .await?;
        }

        // 4. Commit
        tx.commit().await?;
        Ok(role)
    }

    async fn replace_role_permissions(&self, role_id: Uuid, codes: &[String]) -> Result<(), ScopeError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        if !codes.is_empty() {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_code) SELECT $1, unnest($2::text[])",
            )
                .bind(role_id)
                .bind(codes)
                .execute(&mut *tx)
                .await?;
        }

        // Se qualquer passo falhar, o drop do tx faz rollback
        tx.commit().await?;
        Ok(())
    }
}
