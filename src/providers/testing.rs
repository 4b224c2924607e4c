//! Scripted provider for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionProvider, CompletionRequest, ProviderError};

/// Replays queued outcomes and records every request it receives.
/// Once the script runs out it answers with a fixed reply.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, description: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(description.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(description)) => Err(ProviderError::InvalidResponse(description)),
            None => Ok("mock reply".to_string()),
        }
    }
}
