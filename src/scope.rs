// src/scope.rs
// O motor de escopo: quem pode ver quais linhas.

pub mod error;
pub mod filter;
pub mod gate;
pub mod hint;
pub mod permission;
pub mod query;
pub mod query_scope;

pub use error::ScopeError;
pub use filter::{EntityKind, ScopeRegistry, SearchKind};
pub use hint::ScopeHint;
pub use permission::{Level, Permission, PermissionCatalog, Resource};
pub use query::{ScopedQuery, Scoped, Unscoped};
pub use query_scope::QueryScope;
