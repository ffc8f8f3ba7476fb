// src/db.rs

pub mod identity_repo;
pub use identity_repo::{IdentityStore, PgIdentityStore};
pub mod ticket_repo;
pub use ticket_repo::TicketRepository;
