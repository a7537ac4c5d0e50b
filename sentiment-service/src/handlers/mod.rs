//! HTTP handlers for the sentiment service.

pub mod analysis;
pub mod health;
