//! Scripted reasoning service for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use loreforge_core::error::DomainError;
use loreforge_core::reasoning::{AgentRole, ReasoningRequest, ReasoningService};

/// Returns queued responses per role and records every request.
///
/// A role with no queued response answers with an empty JSON object, which
/// every stage treats as "no strong signal".
#[derive(Debug, Default)]
pub struct ScriptedReasoning {
    responses: Mutex<HashMap<AgentRole, VecDeque<Result<serde_json::Value, String>>>>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedReasoning {
    /// Creates a service with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response for `role`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn respond(self, role: AgentRole, response: serde_json::Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(role)
            .or_default()
            .push_back(Ok(response));
        self
    }

    /// Queues a failure for `role`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn fail(self, role: AgentRole, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(role)
            .or_default()
            .push_back(Err(message.to_owned()));
        self
    }

    /// Returns every request received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns how many requests `role` made.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests_for(&self, role: AgentRole) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.role == role)
            .count()
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    async fn reason(&self, request: &ReasoningRequest) -> Result<serde_json::Value, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.role)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(DomainError::Reasoning(message)),
            None => Ok(serde_json::json!({})),
        }
    }
}
