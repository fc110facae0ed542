//! CLI commands

pub mod build;
pub mod clean;
pub mod new;
pub mod routes;
