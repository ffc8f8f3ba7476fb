// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::scope;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Scope ---
        handlers::me::get_my_scope,

        // --- Tickets ---
        handlers::tickets::list_tickets,

        // --- RBAC ---
        handlers::rbac::list_permissions,
        handlers::rbac::list_assignable_permissions,
        handlers::rbac::get_delegation_page,
        handlers::rbac::create_role,
        handlers::rbac::update_role_permissions,
    ),
    components(
        schemas(
            // --- Scope ---
            scope::QueryScope,
            scope::ScopeHint,
            scope::permission::CatalogEntry,

            // --- Tickets ---
            models::tickets::Ticket,
            models::tickets::TicketListResponse,

            // --- RBAC ---
            models::rbac::RoleScopeTag,
            models::rbac::Role,
            models::rbac::RoleResponse,
            models::rbac::DelegationRoleView,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePermissionsPayload,
        )
    ),
    tags(
        (name = "Scope", description = "Escopo de autorização do usuário"),
        (name = "Tickets", description = "Tickets filtrados pelo escopo"),
        (name = "RBAC", description = "Controle de Acesso (Cargos, Permissões e Delegação)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
