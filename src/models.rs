// src/models.rs

pub mod auth;
pub mod org;
pub mod rbac;
pub mod tickets;
