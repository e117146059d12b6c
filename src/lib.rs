//! Model Cloud Server library.
//!
//! This library provides the core functionality for the model sharing
//! platform, including database operations, authentication, the Gitea
//! artifact store client and API services.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
