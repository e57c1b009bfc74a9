//! ailab-utils - clients for the ailab.sh services
//!
//! Thin async clients for the task-submission service, the LLM gateway and
//! the similarity service. LLM inference is streamed and folded into one
//! OpenAI-style completion with reasoning blocks removed.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod services;

#[cfg(feature = "python")]
mod python;

pub use api::{ChatCompletion, ChatRequest, Choice, Message, ModelInfo, Usage};
pub use config::{ClientConfig, Timeouts};
pub use error::{AilabError, Result};
pub use services::{ArticleUpdate, LlmClient, SimilarityClient, SiteFields, TasksClient};

/// Install a `tracing` subscriber that honors `RUST_LOG`.
///
/// Defaults to `ailab_utils=info`. Calling it again, or after another
/// subscriber was installed, is a no-op.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ailab_utils=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
