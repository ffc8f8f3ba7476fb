// src/services.rs

pub mod delegation_service;
pub mod platform_cache;
pub mod scope_resolver;

pub use delegation_service::DelegationService;
pub use platform_cache::PlatformCache;
pub use scope_resolver::ScopeResolver;
