// src/handlers.rs

pub mod me;
pub mod rbac;
pub mod tickets;
