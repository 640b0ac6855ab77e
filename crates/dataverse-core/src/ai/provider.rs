//! AI provider trait for abstracting LLM interactions.
//!
//! This module defines the [`AIProvider`] trait that every language-model
//! collaborator goes through: file ranking, SQL generation, table editing and
//! question answering all send a prompt and read back plain text.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new file in `src/ai/` (e.g., `openai.rs`)
//! 2. Implement the [`AIProvider`] trait for your provider struct
//! 3. Export the provider in `src/ai/mod.rs`
//!
//! # Example
//!
//! ```rust,ignore
//! use dataverse_core::ai::{AIProvider, OpenRouterProvider};
//!
//! let provider = OpenRouterProvider::new("your-api-key")?;
//! let reply = provider.complete("List three fruits as a JSON array")?;
//! ```

use anyhow::Result;
use std::sync::Arc;

/// Trait for AI providers that turn a prompt into a text completion.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a provider can be shared by the
/// service across threads.
///
/// # Error Handling
///
/// Transport and API failures are returned via `anyhow::Result`. Callers
/// convert them into [`DataverseError::AiClientError`](crate::error::DataverseError)
/// before anything destructive happens.
pub trait AIProvider: Send + Sync {
    /// Send a single-turn prompt and return the raw text of the reply.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Get the model being used by this provider.
    ///
    /// Returns `None` if the provider doesn't expose model information.
    fn model(&self) -> Option<&str> {
        None
    }
}

impl<P: AIProvider + ?Sized> AIProvider for &P {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }
}

impl<P: AIProvider + ?Sized> AIProvider for Box<P> {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }
}

impl<P: AIProvider + ?Sized> AIProvider for Arc<P> {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }
}

/// Ask a provider and convert its failure into a library error.
pub(crate) fn complete_with(provider: &dyn AIProvider, prompt: &str) -> crate::error::Result<String> {
    tracing::debug!(
        "Sending {} character prompt to {} ({})",
        prompt.len(),
        provider.name(),
        provider.model().unwrap_or("default model")
    );
    provider
        .complete(prompt)
        .map_err(|e| crate::error::DataverseError::AiClientError(format!("{}: {:#}", provider.name(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crate::error::DataverseError;

    struct Echo;

    impl AIProvider for Echo {
        fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {prompt}"))
        }

        fn name(&self) -> &str {
            "Echo"
        }
    }

    struct Broken;

    impl AIProvider for Broken {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("connection refused"))
        }

        fn name(&self) -> &str {
            "Broken"
        }

        fn model(&self) -> Option<&str> {
            Some("broken-model")
        }
    }

    #[test]
    fn test_smart_pointers_forward() {
        let boxed: Box<dyn AIProvider> = Box::new(Echo);
        assert_eq!(boxed.complete("hi").unwrap(), "echo: hi");
        assert_eq!(boxed.name(), "Echo");
        assert_eq!(boxed.model(), None);

        let shared: Arc<dyn AIProvider> = Arc::new(Broken);
        assert_eq!(shared.model(), Some("broken-model"));
        assert_eq!((&Echo).complete("x").unwrap(), "echo: x");
    }

    #[test]
    fn test_complete_with_maps_errors() {
        assert_eq!(complete_with(&Echo, "ping").unwrap(), "echo: ping");

        let err = complete_with(&Broken, "ping").unwrap_err();
        assert_eq!(err.error_code(), "AI_CLIENT_ERROR");
        assert!(matches!(err, DataverseError::AiClientError(msg) if msg.contains("connection refused")));
    }
}
