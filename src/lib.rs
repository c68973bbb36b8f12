//! Weather lookups with rule-based notifications and a local SQLite history.

pub mod client;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod formatters;
pub mod models;
pub mod rules;
pub mod service;
pub mod store;
