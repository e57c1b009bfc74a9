//! Configuration Module
//!
//! Client credentials, per-service settings and the settings file loader.

pub mod client;
pub mod loader;
pub mod settings;

pub use client::{
    ClientConfig, Timeouts, DEFAULT_LLM_URL, DEFAULT_SIMILARITY_URL, DEFAULT_TASKS_URL,
};
pub use loader::ConfigLoader;
pub use settings::{Service, ServiceSettings, ServicesConfig};
