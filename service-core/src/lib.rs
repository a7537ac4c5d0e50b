//! service-core: Shared infrastructure for the sentiment relay services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
