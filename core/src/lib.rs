pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod executor;
pub mod plan;
pub mod session;
pub mod state;
