//! services/api/src/lib.rs
//!
//! The job board HTTP service: configuration, adapters behind the core ports,
//! and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod seed;
pub mod web;
