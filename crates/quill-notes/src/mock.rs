//! Mock completion backend for deterministic testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quill_core::{CompletionBackend, Error, Result};

/// One recorded call to the mock backend.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub context: String,
    pub prompt: String,
}

/// Mock completion backend with canned responses and a call log.
#[derive(Clone, Default)]
pub struct MockCompletionBackend {
    default_response: String,
    responses: HashMap<String, String>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockCompletionBackend {
    /// Create a mock backend answering "Mock response" to everything.
    pub fn new() -> Self {
        Self {
            default_response: "Mock response".to_string(),
            ..Self::default()
        }
    }

    /// Set the response returned for prompts without a mapping.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Map a specific prompt to a specific response.
    pub fn with_response_mapping(
        mut self,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.responses.insert(prompt.into(), response.into());
        self
    }

    /// Make every call fail with `ExternalService`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// All logged calls, for assertions.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    async fn complete(&self, system: &str, context: &str, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(MockCall {
            system: system.to_string(),
            context: context.to_string(),
            prompt: prompt.to_string(),
        });
        if let Some(message) = &self.failure {
            return Err(Error::ExternalService(message.clone()));
        }
        Ok(self
            .responses
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}
