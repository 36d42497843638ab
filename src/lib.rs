// Library for the binary and tests

pub mod analyzer;
pub mod config;
pub mod error;
pub mod language_repo;
pub mod media_repo;
pub mod models;
pub mod orchestrator;
pub mod retry;
pub mod routes;
pub mod stats;
pub mod stream;
pub mod version;
pub mod vision_repo;
