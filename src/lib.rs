// src/lib.rs
// Motor de autorização por escopo: resolve quem pode ver quais linhas e
// aplica isso às consultas antes que cheguem ao banco.

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scope;
pub mod services;
