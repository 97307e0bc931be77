//! Text-generation providers.
//!
//! The pipeline only knows the [`TextGenerator`] trait. Concrete providers
//! (currently [`OpenAiGenerator`]) translate a [`GenerationPrompt`] into a
//! vendor request and hand back the raw reply text.
//!
//! ```text
//! PlanPipeline
//!     |
//!     v
//! request_roadmap --generate(prompt)--> &dyn TextGenerator
//!     |                                        |
//!     |   <------------- raw text -------------+
//!     v
//! parse -> RoadmapTree
//! ```

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::{OpenAiConfig, OpenAiGenerator};

/// Everything a provider needs for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    /// System-level instruction with the hard constraints.
    pub instruction: String,
    /// User message describing the requested roadmap.
    pub user_message: String,
    /// Ask the provider for structured (JSON object) output when it supports it.
    pub json_output: bool,
}

/// Failure reaching or using a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("network failure: {0}")]
    Network(String),

    /// The provider answered, but not with a usable completion.
    #[error("service error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Service {
        status: Option<u16>,
        message: String,
    },
}

/// A capability that turns a prompt into raw text.
///
/// Implementations make exactly one attempt per call; retry policy belongs
/// to the caller. The trait is object-safe so providers can be shared as
/// `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short provider name for logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate a reply for `prompt`.
    ///
    /// An empty string is a valid return value; deciding that it is not a
    /// roadmap is the caller's job.
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, ProviderError>;
}

// Compile-time assertion: TextGenerator must stay object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};
