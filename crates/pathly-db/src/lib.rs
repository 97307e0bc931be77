//! PostgreSQL storage for skill plans, their modules, and tasks.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
