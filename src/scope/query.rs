// src/scope/query.rs

use std::marker::PhantomData;

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

// ---
// 1. Valores e Predicados
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Id(Uuid),
    Text(String),
}

impl From<Uuid> for FilterValue {
    fn from(id: Uuid) -> Self {
        FilterValue::Id(id)
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Text(text.to_string())
    }
}

/// Predicado sobre colunas da consulta base.
///
/// As colunas são `&'static str` (ex.: `"t.filiale_id"`): vêm dos metadados
/// das entidades, nunca da entrada do usuário. Os valores sempre viram binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq { column: &'static str, value: FilterValue },
    In { column: &'static str, values: Vec<Uuid> },
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
    /// Resultado estruturalmente vazio (`WHERE FALSE`).
    False,
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Predicate::Eq { column, value: value.into() }
    }

    /// OR sobre as colunas indicadas, todas comparadas ao mesmo id.
    pub fn any_column_eq(columns: &[&'static str], id: Uuid) -> Self {
        match columns {
            [] => Predicate::False,
            [single] => Predicate::eq(*single, id),
            many => Predicate::Or(many.iter().map(|c| Predicate::eq(*c, id)).collect()),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::False, p) | (p, Predicate::False) => p,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (p, Predicate::Or(mut right)) => {
                right.insert(0, p);
                Predicate::Or(right)
            }
            (a, b) => Predicate::Or(vec![a, b]),
        }
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::Eq { column, value } => {
                qb.push(*column).push(" = ");
                match value {
                    FilterValue::Id(id) => qb.push_bind(*id),
                    FilterValue::Text(text) => qb.push_bind(text.clone()),
                };
            }
            Predicate::In { values, .. } if values.is_empty() => {
                qb.push("FALSE");
            }
            Predicate::In { column, values } => {
                qb.push(*column).push(" = ANY(").push_bind(values.clone()).push(")");
            }
            Predicate::Or(parts) => push_joined(qb, parts, " OR ", "FALSE"),
            Predicate::And(parts) => push_joined(qb, parts, " AND ", "TRUE"),
            Predicate::False => {
                qb.push("FALSE");
            }
        }
    }
}

fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, parts: &[Predicate], sep: &str, empty: &str) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        part.push_sql(qb);
    }
    qb.push(")");
}

// ---
// 2. A Consulta com Escopo (typestate)
// ---
// Uma consulta nasce `Unscoped` e só pode ser transformada em SQL depois
// de passar por um `apply_*_scope` (ou pelo escape explícito de sistema).
// Esquecer o escopo vira erro de compilação, não falha de disciplina.

#[derive(Debug)]
pub struct Unscoped;

#[derive(Debug)]
pub struct Scoped;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScopeClause {
    Pending,
    Unrestricted,
    Restricted(Predicate),
}

#[derive(Debug)]
pub struct ScopedQuery<S> {
    base_sql: String,
    filters: Vec<Predicate>,
    scope: ScopeClause,
    tail: Option<&'static str>,
    _state: PhantomData<S>,
}

impl ScopedQuery<Unscoped> {
    /// `base_sql` é o SELECT ... FROM ... JOIN ..., sem WHERE.
    pub fn select(base_sql: impl Into<String>) -> Self {
        Self {
            base_sql: base_sql.into(),
            filters: Vec::new(),
            scope: ScopeClause::Pending,
            tail: None,
            _state: PhantomData,
        }
    }

    /// Filtros do chamador entram sempre com AND: só podem restringir.
    pub fn and_where_eq(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Predicate::eq(column, value));
        self
    }

    pub fn and_where_in(mut self, column: &'static str, values: Vec<Uuid>) -> Self {
        self.filters.push(Predicate::In { column, values });
        self
    }

    /// ORDER BY / LIMIT, anexados depois do WHERE.
    pub fn tail(mut self, clause: &'static str) -> Self {
        self.tail = Some(clause);
        self
    }

    /// Escape explícito para rotinas internas sem principal (jobs, seeds).
    pub fn unrestricted_system(self) -> ScopedQuery<Scoped> {
        self.into_scoped(None)
    }

    /// `None` = sem predicado de escopo (view_all).
    pub(crate) fn into_scoped(self, predicate: Option<Predicate>) -> ScopedQuery<Scoped> {
        ScopedQuery {
            base_sql: self.base_sql,
            filters: self.filters,
            scope: match predicate {
                None => ScopeClause::Unrestricted,
                Some(p) => ScopeClause::Restricted(p),
            },
            tail: self.tail,
            _state: PhantomData,
        }
    }
}

impl ScopedQuery<Scoped> {
    pub fn scope_predicate(&self) -> Option<&Predicate> {
        match &self.scope {
            ScopeClause::Restricted(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self.scope, ScopeClause::Unrestricted)
    }

    pub fn is_deny_all(&self) -> bool {
        matches!(self.scope, ScopeClause::Restricted(Predicate::False))
    }

    /// Monta o SQL final. O predicado de escopo é sempre o último AND.
    pub fn into_builder<'a>(self) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::new(self.base_sql);

        let mut clauses: Vec<&Predicate> = self.filters.iter().collect();
        if let ScopeClause::Restricted(p) = &self.scope {
            clauses.push(p);
        }

        for (i, clause) in clauses.into_iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            clause.push_sql(&mut qb);
        }

        if let Some(tail) = self.tail {
            qb.push(" ").push(tail);
        }
        qb
    }
}
