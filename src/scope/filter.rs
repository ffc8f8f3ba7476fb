// src/scope/filter.rs

use std::{collections::{HashMap, HashSet}, fmt, str::FromStr};

use uuid::Uuid;

use super::{
    permission::{Level, Resource},
    query::{Predicate, Scoped, ScopedQuery, Unscoped},
    query_scope::QueryScope,
};

// ---
// 1. Entidades filtráveis
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Tickets,
    Incidents,
    Users,
    Projects,
}

impl SearchKind {
    /// Valor da coluna `sd.kind` na view de busca.
    pub fn discriminator(&self) -> &'static str {
        match self {
            SearchKind::Tickets => "ticket",
            SearchKind::Incidents => "incident",
            SearchKind::Users => "user",
            SearchKind::Projects => "project",
        }
    }

    /// A busca nunca enxerga mais do que a listagem do próprio recurso.
    fn resource(&self) -> Resource {
        match self {
            SearchKind::Tickets => Resource::Tickets,
            SearchKind::Incidents => Resource::Incidents,
            SearchKind::Users => Resource::Users,
            SearchKind::Projects => Resource::Projects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tickets,
    TicketsInternal,
    Incidents,
    Users,
    AuditLogs,
    Notifications,
    Search(SearchKind),
    Statistics,
    Projects,
    Roles,
    TimeEntries,
}

impl EntityKind {
    pub const ALL: [EntityKind; 14] = [
        EntityKind::Tickets,
        EntityKind::TicketsInternal,
        EntityKind::Incidents,
        EntityKind::Users,
        EntityKind::AuditLogs,
        EntityKind::Notifications,
        EntityKind::Search(SearchKind::Tickets),
        EntityKind::Search(SearchKind::Incidents),
        EntityKind::Search(SearchKind::Users),
        EntityKind::Search(SearchKind::Projects),
        EntityKind::Statistics,
        EntityKind::Projects,
        EntityKind::Roles,
        EntityKind::TimeEntries,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EntityKind::Tickets => "tickets",
            EntityKind::TicketsInternal => "tickets_internal",
            EntityKind::Incidents => "incidents",
            EntityKind::Users => "users",
            EntityKind::AuditLogs => "audit_logs",
            EntityKind::Notifications => "notifications",
            EntityKind::Search(SearchKind::Tickets) => "search_tickets",
            EntityKind::Search(SearchKind::Incidents) => "search_incidents",
            EntityKind::Search(SearchKind::Users) => "search_users",
            EntityKind::Search(SearchKind::Projects) => "search_projects",
            EntityKind::Statistics => "statistics",
            EntityKind::Projects => "projects",
            EntityKind::Roles => "roles",
            EntityKind::TimeEntries => "time_entries",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| anyhow::anyhow!("Entidade desconhecida: '{}'", s))
    }
}

// ---
// 2. Metadados por entidade
// ---
/// Configuração da cascata para uma entidade: qual prefixo de permissão e
/// quais colunas respondem por filial, departamento e "posse".
/// Um nível cuja coluna não existe na entidade é pulado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTarget {
    pub resource: Resource,
    pub filiale_column: Option<&'static str>,
    pub department_column: Option<&'static str>,
    pub owner_columns: &'static [&'static str],
    /// Filial de destino (prestadora) do registro, para o override do resolver.
    pub resolver_column: Option<&'static str>,
}

impl ScopeTarget {
    fn standard(kind: EntityKind) -> ScopeTarget {
        match kind {
            // "próprio" = criador OU responsável
            EntityKind::Tickets => ScopeTarget {
                resource: Resource::Tickets,
                filiale_column: Some("t.filiale_id"),
                department_column: Some("t.department_id"),
                owner_columns: &["t.created_by", "t.assigned_to"],
                resolver_column: Some("t.target_filiale_id"),
            },
            EntityKind::TicketsInternal => ScopeTarget {
                resource: Resource::TicketsInternal,
                filiale_column: Some("ti.filiale_id"),
                department_column: Some("ti.department_id"),
                owner_columns: &["ti.created_by", "ti.assigned_to"],
                resolver_column: Some("ti.target_filiale_id"),
            },
            EntityKind::Incidents => ScopeTarget {
                resource: Resource::Incidents,
                filiale_column: Some("i.filiale_id"),
                department_column: Some("i.department_id"),
                owner_columns: &["i.created_by", "i.assigned_to"],
                resolver_column: Some("i.target_filiale_id"),
            },
            // "próprio" = o próprio cadastro; filial vem do departamento
            // (FROM users u LEFT JOIN departments ud ON ud.id = u.department_id)
            EntityKind::Users => ScopeTarget {
                resource: Resource::Users,
                filiale_column: Some("ud.filiale_id"),
                department_column: Some("u.department_id"),
                owner_columns: &["u.id"],
                resolver_column: None,
            },
            // "próprio" = o autor da ação
            EntityKind::AuditLogs => ScopeTarget {
                resource: Resource::AuditLogs,
                filiale_column: Some("a.filiale_id"),
                department_column: Some("a.department_id"),
                owner_columns: &["a.actor_id"],
                resolver_column: None,
            },
            // "próprio" = o destinatário; notificação não tem filial/departamento
            EntityKind::Notifications => ScopeTarget {
                resource: Resource::Notifications,
                filiale_column: None,
                department_column: None,
                owner_columns: &["n.recipient_id"],
                resolver_column: None,
            },
            EntityKind::Search(sub) => ScopeTarget {
                resource: sub.resource(),
                filiale_column: Some("sd.filiale_id"),
                department_column: Some("sd.department_id"),
                owner_columns: &["sd.owner_id", "sd.assignee_id"],
                resolver_column: Some("sd.target_filiale_id"),
            },
            EntityKind::Statistics => ScopeTarget {
                resource: Resource::Statistics,
                filiale_column: Some("t.filiale_id"),
                department_column: Some("t.department_id"),
                owner_columns: &["t.created_by", "t.assigned_to"],
                resolver_column: Some("t.target_filiale_id"),
            },
            EntityKind::Projects => ScopeTarget {
                resource: Resource::Projects,
                filiale_column: Some("p.filiale_id"),
                department_column: Some("p.department_id"),
                owner_columns: &["p.created_by", "p.manager_id"],
                resolver_column: None,
            },
            // Cargos não têm filial própria: herdam a do criador
            // (LEFT JOIN users c ON c.id = r.created_by LEFT JOIN departments cd ON cd.id = c.department_id)
            EntityKind::Roles => ScopeTarget {
                resource: Resource::Roles,
                filiale_column: Some("cd.filiale_id"),
                department_column: Some("c.department_id"),
                owner_columns: &["r.created_by"],
                resolver_column: None,
            },
            // "próprio" = quem lançou as horas
            EntityKind::TimeEntries => ScopeTarget {
                resource: Resource::Timesheets,
                filiale_column: Some("te.filiale_id"),
                department_column: Some("te.department_id"),
                owner_columns: &["te.user_id"],
                resolver_column: None,
            },
        }
    }
}

// ---
// 3. A decisão da cascata
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    Filiale(Uuid),
    Department(Uuid),
    Own(Uuid),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeDecision {
    /// Filial atendida pelo resolver, quando o override se aplica.
    pub resolver_filiale: Option<Uuid>,
    pub visibility: Visibility,
}

impl ScopeDecision {
    const DENY: ScopeDecision = ScopeDecision {
        resolver_filiale: None,
        visibility: Visibility::Nothing,
    };

    /// Nenhum nível e nenhum override: a consulta seria `WHERE FALSE`.
    pub fn grants_nothing(&self) -> bool {
        self.visibility == Visibility::Nothing && self.resolver_filiale.is_none()
    }
}

fn cascade(target: &ScopeTarget, scope: &QueryScope) -> Visibility {
    // Apenas o nível mais alto é aplicado: os níveis não são somados.
    for level in Level::VISIBILITY_CASCADE {
        if !scope.holds(target.resource, level) {
            continue;
        }
        let visibility = match level {
            Level::ViewAll => Some(Visibility::All),
            Level::ViewFiliale => target
                .filiale_column
                .and(scope.filiale_id())
                .map(Visibility::Filiale),
            Level::ViewDepartment => target
                .department_column
                .and(scope.department_id())
                .map(Visibility::Department),
            Level::ViewOwn => (!target.owner_columns.is_empty())
                .then(|| Visibility::Own(scope.user_id())),
            _ => None,
        };
        if let Some(v) = visibility {
            return v;
        }
    }
    Visibility::Nothing
}

fn predicate_for(target: &ScopeTarget, decision: &ScopeDecision) -> Option<Predicate> {
    let base = match decision.visibility {
        Visibility::All => return None,
        Visibility::Filiale(id) => target
            .filiale_column
            .map_or(Predicate::False, |col| Predicate::eq(col, id)),
        Visibility::Department(id) => target
            .department_column
            .map_or(Predicate::False, |col| Predicate::eq(col, id)),
        Visibility::Own(user) => Predicate::any_column_eq(target.owner_columns, user),
        Visibility::Nothing => Predicate::False,
    };

    // Ramo do resolver: concessão própria, mais estreita que view_all,
    // somada ao que o cargo já concede.
    let predicate = match (decision.resolver_filiale, target.resolver_column) {
        (Some(filiale), Some(col)) => Predicate::eq(col, filiale).or(base),
        _ => base,
    };
    Some(predicate)
}

// ---
// 4. O Registro (tabela de capacidades, montada uma vez na partida)
// ---
#[derive(Debug, Clone)]
pub struct ScopeRegistry {
    targets: HashMap<EntityKind, ScopeTarget>,
    resolver_entities: HashSet<EntityKind>,
}

impl ScopeRegistry {
    pub const DEFAULT_RESOLVER_ENTITIES: [EntityKind; 3] = [
        EntityKind::Tickets,
        EntityKind::TicketsInternal,
        EntityKind::Search(SearchKind::Tickets),
    ];

    /// Monta o registro padrão. Falha se alguma entidade listada para o
    /// resolver não tiver coluna de filial de destino.
    pub fn standard(resolver_entities: &[EntityKind]) -> anyhow::Result<Self> {
        let targets: HashMap<EntityKind, ScopeTarget> = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, ScopeTarget::standard(kind)))
            .collect();

        for kind in resolver_entities {
            let eligible = targets
                .get(kind)
                .is_some_and(|t| t.resolver_column.is_some());
            if !eligible {
                anyhow::bail!("A entidade '{}' não suporta o override do resolver", kind);
            }
        }

        Ok(Self {
            targets,
            resolver_entities: resolver_entities.iter().copied().collect(),
        })
    }

    pub fn target(&self, kind: EntityKind) -> Option<&ScopeTarget> {
        self.targets.get(&kind)
    }

    pub fn resolver_applies_to(&self, kind: EntityKind) -> bool {
        self.resolver_entities.contains(&kind)
    }

    /// Qual nível da cascata vale para este escopo nesta entidade.
    pub fn decide(&self, kind: EntityKind, scope: &QueryScope) -> ScopeDecision {
        let Some(target) = self.targets.get(&kind) else {
            return ScopeDecision::DENY;
        };

        let visibility = cascade(target, scope);
        if visibility == Visibility::All {
            return ScopeDecision { resolver_filiale: None, visibility };
        }

        let resolver_filiale = if scope.is_resolver() && self.resolver_applies_to(kind) {
            scope.filiale_id()
        } else {
            None
        };

        ScopeDecision { resolver_filiale, visibility }
    }

    /// O algoritmo genérico: todas as funções `apply_*_scope` passam por aqui.
    pub fn apply(
        &self,
        kind: EntityKind,
        query: ScopedQuery<Unscoped>,
        scope: &QueryScope,
    ) -> ScopedQuery<Scoped> {
        let predicate = match self.targets.get(&kind) {
            Some(target) => predicate_for(target, &self.decide(kind, scope)),
            None => Some(Predicate::False),
        };
        query.into_scoped(predicate)
    }

    pub fn apply_tickets_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Tickets, query, scope)
    }

    pub fn apply_tickets_internal_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::TicketsInternal, query, scope)
    }

    pub fn apply_incidents_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Incidents, query, scope)
    }

    pub fn apply_users_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Users, query, scope)
    }

    pub fn apply_audit_logs_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::AuditLogs, query, scope)
    }

    pub fn apply_notifications_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Notifications, query, scope)
    }

    /// Restringe ao subtipo (`sd.kind`) antes de aplicar o escopo dele.
    pub fn apply_search_scope(
        &self,
        kind: SearchKind,
        query: ScopedQuery<Unscoped>,
        scope: &QueryScope,
    ) -> ScopedQuery<Scoped> {
        let query = query.and_where_eq("sd.kind", kind.discriminator());
        self.apply(EntityKind::Search(kind), query, scope)
    }

    pub fn apply_statistics_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Statistics, query, scope)
    }

    pub fn apply_projects_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Projects, query, scope)
    }

    pub fn apply_roles_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::Roles, query, scope)
    }

    pub fn apply_time_entries_scope(&self, query: ScopedQuery<Unscoped>, scope: &QueryScope) -> ScopedQuery<Scoped> {
        self.apply(EntityKind::TimeEntries, query, scope)
    }
}

/// Lê a lista de entidades do resolver (`RESOLVER_ENTITIES`), separada por vírgulas.
pub fn parse_entity_list(raw: &str) -> anyhow::Result<Vec<EntityKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EntityKind::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::scope::{
        permission::Permission,
        query::eval::Row,
        query::FilterValue,
    };

    // --- Organização de teste ---
    struct Org {
        f1: Uuid,
        f2: Uuid,
        provider: Uuid,
        d1: Uuid,
        d2: Uuid,
        d3: Uuid,
        user_a: Uuid,
        user_b: Uuid,
    }

    impl Org {
        fn new() -> Self {
            Self {
                f1: Uuid::new_v4(),
                f2: Uuid::new_v4(),
                provider: Uuid::new_v4(),
                d1: Uuid::new_v4(),
                d2: Uuid::new_v4(),
                d3: Uuid::new_v4(),
                user_a: Uuid::new_v4(),
                user_b: Uuid::new_v4(),
            }
        }
    }

    fn ticket(filiale: Uuid, department: Uuid, created_by: Uuid, assigned_to: Option<Uuid>, target: Uuid) -> Row {
        let mut row: Row = HashMap::new();
        row.insert("t.filiale_id", FilterValue::Id(filiale));
        row.insert("t.department_id", FilterValue::Id(department));
        row.insert("t.created_by", FilterValue::Id(created_by));
        if let Some(assignee) = assigned_to {
            row.insert("t.assigned_to", FilterValue::Id(assignee));
        }
        row.insert("t.target_filiale_id", FilterValue::Id(target));
        row
    }

    /// T1..T5 do cenário de referência, mais T6 direcionado à prestadora.
    fn tickets(org: &Org) -> Vec<(&'static str, Row)> {
        let other = Uuid::new_v4();
        vec![
            ("T1", ticket(org.f1, org.d1, org.user_a, None, org.f2)),
            ("T2", ticket(org.f1, org.d1, org.user_b, Some(org.user_a), org.f2)),
            ("T3", ticket(org.f1, org.d1, org.user_b, None, org.f2)),
            ("T4", ticket(org.f1, org.d2, other, None, org.f2)),
            ("T5", ticket(org.f2, org.d3, other, None, org.f1)),
            ("T6", ticket(org.f1, org.d2, other, None, org.provider)),
        ]
    }

    fn registry() -> ScopeRegistry {
        ScopeRegistry::standard(&ScopeRegistry::DEFAULT_RESOLVER_ENTITIES).unwrap()
    }

    fn tickets_perm(level: Level) -> Permission {
        Permission::new(Resource::Tickets, level)
    }

    fn visible(registry: &ScopeRegistry, scope: &QueryScope, org: &Org) -> Vec<&'static str> {
        let query = registry.apply_tickets_scope(ScopedQuery::select("SELECT * FROM tickets t"), scope);
        tickets(org)
            .into_iter()
            .filter(|(_, row)| query.matches(row))
            .map(|(name, _)| name)
            .collect()
    }

    #[test]
    fn view_own_sees_created_and_assigned_only() {
        let org = Org::new();
        let scope = QueryScope::new(org.user_a, [tickets_perm(Level::ViewOwn)], Some(org.d1), Some(org.f1), false);
        assert_eq!(visible(&registry(), &scope, &org), vec!["T1", "T2"]);
    }

    #[test]
    fn view_department_sees_whole_department_not_sibling() {
        let org = Org::new();
        let scope = QueryScope::new(org.user_b, [tickets_perm(Level::ViewDepartment)], Some(org.d1), Some(org.f1), false);
        assert_eq!(visible(&registry(), &scope, &org), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn view_filiale_stops_at_filiale_boundary() {
        let org = Org::new();
        let user_c = Uuid::new_v4();
        let scope = QueryScope::new(user_c, [tickets_perm(Level::ViewFiliale)], Some(org.d2), Some(org.f1), false);
        assert_eq!(visible(&registry(), &scope, &org), vec!["T1", "T2", "T3", "T4", "T6"]);
    }

    #[test]
    fn view_all_adds_no_predicate() {
        let org = Org::new();
        let scope = QueryScope::new(Uuid::new_v4(), [tickets_perm(Level::ViewAll)], None, None, false);
        let query = registry().apply_tickets_scope(ScopedQuery::select("SELECT * FROM tickets t"), &scope);

        assert!(query.is_unrestricted());
        assert_eq!(visible(&registry(), &scope, &org).len(), 6);
    }

    #[test]
    fn resolver_without_ticket_permissions_sees_tickets_directed_at_provider() {
        let org = Org::new();
        let user_e = Uuid::new_v4();
        let scope = QueryScope::new(user_e, Vec::<Permission>::new(), Some(Uuid::new_v4()), Some(org.provider), true);
        assert_eq!(visible(&registry(), &scope, &org), vec!["T6"]);
    }

    #[test]
    fn resolver_does_not_reach_non_ticket_entities() {
        let org = Org::new();
        let scope = QueryScope::new(Uuid::new_v4(), [], None, Some(org.provider), true);
        let registry = registry();

        for kind in [EntityKind::Users, EntityKind::AuditLogs, EntityKind::Projects, EntityKind::Notifications] {
            let query = registry.apply(kind, ScopedQuery::select("SELECT 1"), &scope);
            assert!(query.is_deny_all(), "{kind} deveria ficar vazio");
        }
    }

    #[test]
    fn resolver_keeps_what_the_role_already_grants() {
        let org = Org::new();
        let scope = QueryScope::new(org.user_a, [tickets_perm(Level::ViewOwn)], Some(org.d1), Some(org.provider), true);
        assert_eq!(visible(&registry(), &scope, &org), vec!["T1", "T2", "T6"]);
    }

    #[test]
    fn cascade_uses_highest_level_only() {
        let org = Org::new();
        let scope = QueryScope::new(
            org.user_b,
            [tickets_perm(Level::ViewDepartment), tickets_perm(Level::ViewOwn)],
            Some(org.d1),
            Some(org.f1),
            false,
        );
        let query = registry().apply_tickets_scope(ScopedQuery::select("SELECT * FROM tickets t"), &scope);

        assert_eq!(query.scope_predicate(), Some(&Predicate::eq("t.department_id", org.d1)));
        // T1 não foi criado nem atribuído a B, mas é do departamento.
        assert!(visible(&registry(), &scope, &org).contains(&"T1"));
    }

    #[test]
    fn missing_department_falls_through_to_own() {
        let org = Org::new();
        let scope = QueryScope::new(
            org.user_a,
            [tickets_perm(Level::ViewDepartment), tickets_perm(Level::ViewOwn)],
            None,
            None,
            false,
        );
        assert_eq!(visible(&registry(), &scope, &org), vec!["T1", "T2"]);
    }

    #[test]
    fn every_entity_fails_closed_without_view_permissions() {
        let registry = registry();
        let actions = [Level::Create, Level::Update, Level::Delete, Level::Assign, Level::Validate];
        let scope = QueryScope::new(
            Uuid::new_v4(),
            Resource::ALL
                .into_iter()
                .flat_map(|r| actions.into_iter().map(move |l| Permission::new(r, l))),
            Some(Uuid::new_v4()),
            Some(Uuid::new_v4()),
            false,
        );

        for kind in EntityKind::ALL {
            let query = registry.apply(kind, ScopedQuery::select("SELECT 1"), &scope);
            assert!(query.is_deny_all(), "{kind} vazou sem permissão de visualização");
            assert!(query.into_builder().sql().ends_with("FALSE"));
        }
    }

    #[test]
    fn every_entity_is_unrestricted_with_view_all() {
        let registry = registry();
        for kind in EntityKind::ALL {
            let resource = registry.target(kind).unwrap().resource;
            let scope = QueryScope::new(Uuid::new_v4(), [Permission::new(resource, Level::ViewAll)], None, None, true);
            let query = registry.apply(kind, ScopedQuery::select("SELECT 1"), &scope);
            assert!(query.is_unrestricted(), "{kind} deveria ficar sem predicado");
        }
    }

    #[test]
    fn ownership_predicate_varies_per_entity() {
        let registry = registry();
        let user = Uuid::new_v4();
        let own = |resource| QueryScope::new(user, [Permission::new(resource, Level::ViewOwn)], None, None, false);

        let cases = [
            (EntityKind::TimeEntries, Resource::Timesheets, Predicate::eq("te.user_id", user)),
            (EntityKind::Notifications, Resource::Notifications, Predicate::eq("n.recipient_id", user)),
            (EntityKind::AuditLogs, Resource::AuditLogs, Predicate::eq("a.actor_id", user)),
            (EntityKind::Users, Resource::Users, Predicate::eq("u.id", user)),
            (EntityKind::Roles, Resource::Roles, Predicate::eq("r.created_by", user)),
            (
                EntityKind::Projects,
                Resource::Projects,
                Predicate::Or(vec![Predicate::eq("p.created_by", user), Predicate::eq("p.manager_id", user)]),
            ),
        ];

        for (kind, resource, expected) in cases {
            let query = registry.apply(kind, ScopedQuery::select("SELECT 1"), &own(resource));
            assert_eq!(query.scope_predicate(), Some(&expected), "{kind}");
        }
    }

    #[test]
    fn notifications_skip_levels_without_columns() {
        let user = Uuid::new_v4();
        let scope = QueryScope::new(
            user,
            [Permission::new(Resource::Notifications, Level::ViewFiliale)],
            Some(Uuid::new_v4()),
            Some(Uuid::new_v4()),
            false,
        );
        let query = registry().apply_notifications_scope(ScopedQuery::select("SELECT * FROM notifications n"), &scope);
        assert!(query.is_deny_all());
    }

    #[test]
    fn users_and_roles_take_the_filiale_from_the_department_join() {
        let registry = registry();
        let filiale = Uuid::new_v4();
        let filiale_scope = |resource| {
            QueryScope::new(
                Uuid::new_v4(),
                [Permission::new(resource, Level::ViewFiliale)],
                Some(Uuid::new_v4()),
                Some(filiale),
                false,
            )
        };

        let users = registry.apply_users_scope(
            ScopedQuery::select("SELECT u.* FROM users u LEFT JOIN departments ud ON ud.id = u.department_id"),
            &filiale_scope(Resource::Users),
        );
        assert_eq!(users.scope_predicate(), Some(&Predicate::eq("ud.filiale_id", filiale)));

        let roles = registry.apply_roles_scope(
            ScopedQuery::select(
                "SELECT r.* FROM roles r LEFT JOIN users c ON c.id = r.created_by \
                 LEFT JOIN departments cd ON cd.id = c.department_id",
            ),
            &filiale_scope(Resource::Roles),
        );
        assert_eq!(roles.scope_predicate(), Some(&Predicate::eq("cd.filiale_id", filiale)));
    }

    #[test]
    fn search_uses_the_sub_type_permissions_and_discriminator() {
        let user = Uuid::new_v4();
        let scope = QueryScope::new(user, [Permission::new(Resource::Incidents, Level::ViewOwn)], None, None, false);
        let registry = registry();

        let incidents = registry.apply_search_scope(SearchKind::Incidents, ScopedQuery::select("SELECT * FROM search_documents sd"), &scope);
        assert_eq!(
            incidents.into_builder().sql(),
            "SELECT * FROM search_documents sd WHERE sd.kind = $1 AND (sd.owner_id = $2 OR sd.assignee_id = $3)"
        );

        let tickets = registry.apply_search_scope(SearchKind::Tickets, ScopedQuery::select("SELECT * FROM search_documents sd"), &scope);
        assert!(tickets.is_deny_all());
    }

    #[test]
    fn caller_filters_cannot_widen_visibility() {
        let org = Org::new();
        let scope = QueryScope::new(org.user_a, [tickets_perm(Level::ViewOwn)], Some(org.d1), Some(org.f1), false);
        let query = registry().apply_tickets_scope(
            ScopedQuery::select("SELECT * FROM tickets t").and_where_eq("t.department_id", org.d1),
            &scope,
        );

        let names: Vec<_> = tickets(&org)
            .into_iter()
            .filter(|(_, row)| query.matches(row))
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["T1", "T2"]);
    }

    #[test]
    fn rejects_resolver_entities_without_target_column() {
        assert!(ScopeRegistry::standard(&[EntityKind::Users]).is_err());
        assert!(ScopeRegistry::standard(&[EntityKind::Incidents, EntityKind::Statistics]).is_ok());
    }

    #[test]
    fn parses_entity_lists() {
        let list = parse_entity_list(" tickets, search_tickets ,,incidents").unwrap();
        assert_eq!(list, vec![EntityKind::Tickets, EntityKind::Search(SearchKind::Tickets), EntityKind::Incidents]);
        assert!(parse_entity_list("tickets,unknown").is_err());
    }
}
