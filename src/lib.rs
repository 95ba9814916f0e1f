/*
 * Responsibility
 * - module の束ね (binary と integration tests の共有窓口)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
