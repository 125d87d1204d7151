//! Database layer for wayfinder: models, connection pool, and query
//! functions for the trip-planning job pipeline.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
