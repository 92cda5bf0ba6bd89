//! services/web/src/lib.rs
//!
//! Library half of the `web` service: configuration, adapters implementing the
//! core ports, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
