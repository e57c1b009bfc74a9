//! Service Clients
//!
//! One client per remote ailab service.

pub mod llm;
pub mod similarity;
pub mod tasks;

pub use llm::LlmClient;
pub use similarity::{ArticleUpdate, SimilarityClient, SiteFields};
pub use tasks::TasksClient;
