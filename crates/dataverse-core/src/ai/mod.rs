//! AI module for the LLM-backed collaborators.
//!
//! This module provides a trait-based abstraction for AI providers, so file
//! ranking, SQL generation, table editing and question answering can run
//! against any LLM backend, or against a stub in tests.
//!
//! # Feature Flag
//!
//! The concrete provider requires the `ai` feature flag. The [`AIProvider`]
//! trait is always available for custom implementations.
//!
//! ```toml
//! # Enable AI support (default)
//! dataverse-core = { version = "0.1", features = ["ai"] }
//!
//! # Disable AI support for smaller binary
//! dataverse-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Providers
//!
//! - [`OpenRouterProvider`] - OpenRouter API (requires `ai` feature)

// Provider trait is always available (for custom implementations)
mod provider;
pub use provider::AIProvider;
pub(crate) use provider::complete_with;

// Concrete providers require the "ai" feature
#[cfg(feature = "ai")]
mod openrouter;

#[cfg(feature = "ai")]
pub use openrouter::{
    API_KEY_ENV, MODEL_ENV, OpenRouterConfig, OpenRouterConfigBuilder, OpenRouterProvider,
};
