//! Bootstrap module for initializing the signage server
//!
//! This module handles:
//! - Configuration loading
//! - Store selection (PostgreSQL or in-memory)
//! - Service initialization and dependency injection

pub mod config;
pub mod database;
pub mod services;

pub use config::load_config;
pub use database::{init_database, init_repositories};
pub use services::{init_services, Services};
