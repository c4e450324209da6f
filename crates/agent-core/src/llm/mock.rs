use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CompletionRequest, LanguageModel};
use crate::errors::ModelError;

/// Scripted model for tests: returns queued responses in order and records every request.
///
/// Once the script runs out every call fails with [`ModelError::Request`].
#[derive(Default)]
pub struct MockLanguageModel {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLanguageModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.script.lock().push_back(Ok(response.into()));
    }

    pub fn push_error(&self, error: ModelError) {
        self.script.lock().push_back(Err(error));
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn name(&self) -> String {
        "mock".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::request("mock model has no scripted responses left")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_fails() {
        let model = MockLanguageModel::new(["first"]);
        model.push_error(ModelError::Timeout);

        let request = CompletionRequest::new("prompt");
        assert_eq!(model.complete(&request).await.expect("first"), "first");
        assert!(matches!(model.complete(&request).await, Err(ModelError::Timeout)));
        assert!(matches!(model.complete(&request).await, Err(ModelError::Request(_))));
        assert_eq!(model.requests().len(), 3);
        assert_eq!(model.remaining(), 0);
    }
}
