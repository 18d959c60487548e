//! Intent routing between a side-effecting tool and knowledge answering.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use agentdesk_core::traits::TicketStore;
use agentdesk_core::types::{Answer, Ticket};
use agentdesk_core::{Error, Result};

use crate::service::RagService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Tool,
    Knowledge,
}

pub trait IntentClassifier: Send + Sync {
    fn classify(&self, query: &str) -> Intent;
}

/// `Tool` when any keyword occurs in the lowercased query.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords: keywords.into_iter().map(|k| k.to_lowercase()).filter(|k| !k.is_empty()).collect() }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(vec!["ticket".to_string(), "issue".to_string()])
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, query: &str) -> Intent {
        let q = query.to_lowercase();
        if self.keywords.iter().any(|k| q.contains(k.as_str())) {
            Intent::Tool
        } else {
            Intent::Knowledge
        }
    }
}

#[async_trait]
pub trait ToolAction: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, query: &str) -> Result<Value>;
}

/// Opens a ticket whose title and description are the query.
pub struct TicketTool {
    store: Arc<dyn TicketStore>,
    priority: String,
}

impl TicketTool {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store, priority: "medium".to_string() }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }
}

#[async_trait]
impl ToolAction for TicketTool {
    fn name(&self) -> &str {
        "ticket"
    }

    async fn run(&self, query: &str) -> Result<Value> {
        let ticket = Ticket::new(query, query, self.priority.clone());
        self.store
            .create_ticket(&ticket)
            .await
            .map_err(|e| Error::ToolFailed(format!("ticket creation failed: {e}")))?;
        info!(ticket_id = %ticket.ticket_id, "Ticket created");
        Ok(json!({ "ticket_id": ticket.ticket_id, "status": ticket.status, "title": ticket.title }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "agent", content = "result")]
pub enum DeskResponse {
    #[serde(rename = "ToolAgent")]
    Tool(Value),
    #[serde(rename = "KnowledgeAgent")]
    Knowledge(Answer),
}

/// Routes each request by intent.
pub struct Desk {
    classifier: Box<dyn IntentClassifier>,
    tool: Arc<dyn ToolAction>,
    service: Arc<RagService>,
}

impl Desk {
    pub fn new(classifier: Box<dyn IntentClassifier>, tool: Arc<dyn ToolAction>, service: Arc<RagService>) -> Self {
        Self { classifier, tool, service }
    }

    pub async fn handle(&self, query: &str, top_k: usize) -> Result<DeskResponse> {
        let intent = self.classifier.classify(query);
        info!(?intent, "Routing request");
        match intent {
            Intent::Tool => Ok(DeskResponse::Tool(self.tool.run(query).await?)),
            Intent::Knowledge => Ok(DeskResponse::Knowledge(self.service.answer(query, top_k).await?)),
        }
    }
}
