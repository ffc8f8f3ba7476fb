// src/scope/permission.rs

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::ScopeError;

// ---
// 1. Recursos (a parte antes do ponto em "tickets.view_all")
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Tickets,
    TicketsInternal,
    Incidents,
    Users,
    AuditLogs,
    Notifications,
    Search,
    Statistics,
    Projects,
    Roles,
    Timesheets,
}

impl Resource {
    pub const ALL: [Resource; 11] = [
        Resource::Tickets,
        Resource::TicketsInternal,
        Resource::Incidents,
        Resource::Users,
        Resource::AuditLogs,
        Resource::Notifications,
        Resource::Search,
        Resource::Statistics,
        Resource::Projects,
        Resource::Roles,
        Resource::Timesheets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Tickets => "tickets",
            Resource::TicketsInternal => "tickets_internal",
            Resource::Incidents => "incidents",
            Resource::Users => "users",
            Resource::AuditLogs => "audit_logs",
            Resource::Notifications => "notifications",
            Resource::Search => "search",
            Resource::Statistics => "statistics",
            Resource::Projects => "projects",
            Resource::Roles => "roles",
            Resource::Timesheets => "timesheets",
        }
    }
}

impl FromStr for Resource {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ScopeError::UnknownPermission(s.to_string()))
    }
}

// ---
// 2. Níveis (a parte depois do ponto)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    ViewAll,
    ViewFiliale,
    ViewDepartment,
    ViewOwn,
    Create,
    Update,
    Delete,
    Assign,
    Validate,
    DelegatePermissions,
}

impl Level {
    pub const ALL: [Level; 10] = [
        Level::ViewAll,
        Level::ViewFiliale,
        Level::ViewDepartment,
        Level::ViewOwn,
        Level::Create,
        Level::Update,
        Level::Delete,
        Level::Assign,
        Level::Validate,
        Level::DelegatePermissions,
    ];

    /// Ordem em que a cascata de visibilidade testa os níveis.
    pub const VISIBILITY_CASCADE: [Level; 4] = [
        Level::ViewAll,
        Level::ViewFiliale,
        Level::ViewDepartment,
        Level::ViewOwn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::ViewAll => "view_all",
            Level::ViewFiliale => "view_filiale",
            Level::ViewDepartment => "view_department",
            Level::ViewOwn => "view_own",
            Level::Create => "create",
            Level::Update => "update",
            Level::Delete => "delete",
            Level::Assign => "assign",
            Level::Validate => "validate",
            Level::DelegatePermissions => "delegate_permissions",
        }
    }

    /// Posição na hierarquia view_all ⊇ view_filiale ⊇ view_department ⊇ view_own.
    /// Verbos de ação não fazem parte da hierarquia.
    pub fn visibility_rank(&self) -> Option<u8> {
        match self {
            Level::ViewAll => Some(3),
            Level::ViewFiliale => Some(2),
            Level::ViewDepartment => Some(1),
            Level::ViewOwn => Some(0),
            _ => None,
        }
    }
}

impl FromStr for Level {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| ScopeError::UnknownPermission(s.to_string()))
    }
}

// ---
// 3. A Permissão tipada
// ---
// Substitui o match de strings cru: um "tickets.veiw_all" digitado errado
// não compila como constante e falha no parse quando vem do banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
    pub resource: Resource,
    pub level: Level,
}

impl Permission {
    pub const fn new(resource: Resource, level: Level) -> Self {
        Self { resource, level }
    }

    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource.as_str(), self.level.as_str())
    }
}

impl FromStr for Permission {
    type Err = ScopeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let unknown = || ScopeError::UnknownPermission(code.to_string());

        let (resource, level) = code.split_once('.').ok_or_else(unknown)?;
        let resource = resource.parse::<Resource>().map_err(|_| unknown())?;
        let level = level.parse::<Level>().map_err(|_| unknown())?;

        Ok(Permission { resource, level })
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

// ---
// 4. O Catálogo (dado de referência, somente leitura)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[schema(value_type = String, example = "tickets.view_own")]
    pub code: Permission,
    pub description: String,
    pub non_delegatable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    entries: HashMap<Permission, CatalogEntry>,
}

impl PermissionCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.code, e)).collect(),
        }
    }

    pub fn describe(&self, permission: &Permission) -> Option<&str> {
        self.entries.get(permission).map(|e| e.description.as_str())
    }

    /// Permissões fora do catálogo também não são delegáveis.
    pub fn is_delegatable(&self, permission: &Permission) -> bool {
        self.entries
            .get(permission)
            .is_some_and(|e| !e.non_delegatable)
    }

    /// Lista ordenada por código, para o frontend montar a tela.
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<&CatalogEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.code);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
