//! Retrieval-augmented answering over a vector index.
//!
//! Query path: [`Retriever`] (embed + coarse search) → [`Reranker`] →
//! [`prompt::compose`] → [`ProviderChain`]. [`RagService`] wires these
//! together; [`Desk`] routes a request to a tool action or to the service.
//! [`Ingestor`] feeds the index.

pub mod ingest;
pub mod llm;
pub mod prompt;
pub mod reranker;
pub mod retriever;
pub mod router;
pub mod service;

pub use ingest::{IngestReport, Ingestor};
pub use llm::{LlmProvider, ProviderChain, ProviderError};
pub use reranker::Reranker;
pub use retriever::Retriever;
pub use router::{Desk, DeskResponse, Intent, IntentClassifier, KeywordClassifier, TicketTool, ToolAction};
pub use service::RagService;
