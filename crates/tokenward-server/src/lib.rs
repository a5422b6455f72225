pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{
    ServerBuilder, TokenwardServer, build_app, build_auth_state, router, spawn_revocation_cleanup,
};
