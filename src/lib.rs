/// Basic application code
pub mod app;
/// REST clients for outside services
pub mod client;
/// Controllers for REST endpoints
pub mod controller;
/// Domain objects
pub mod domain;
/// REST error type
pub mod error;
/// Order status lifecycle and notification policy
pub mod lifecycle;
/// Stored records
pub mod model;
/// In-memory mirror of the order table and its change feed
pub mod read_model;
/// Repositories
pub mod repo;
/// Guest session resolution
pub mod session;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
/// Read projections over the order set
pub mod views;
