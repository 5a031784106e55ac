use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use docquery_core::{LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that returns canned responses.
///
/// Scripted responses are consumed in order; once exhausted the fixed
/// response (or a default) is returned. Requests are kept only when
/// recording is enabled with [`MockProvider::with_recording`].
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    script: Mutex<VecDeque<String>>,
    failure: Option<String>,
    recording: bool,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            failure: None,
            recording: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn with_script<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Every call fails with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Keep every request for inspection through [`MockProvider::requests`].
    pub fn with_recording(mut self) -> Self {
        self.recording = true;
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
        if self.recording {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(req.clone());
        }

        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let content = scripted
            .or_else(|| self.fixed_response.clone())
            .unwrap_or_else(|| "Mock response".to_string());

        Ok(LlmResponse {
            content,
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> LlmRequest {
        LlmRequest {
            model: "mock".into(),
            system_prompt: String::new(),
            user_prompt: prompt.into(),
            max_tokens: 16,
            temperature: 0.3,
            stop: Vec::new(),
        }
    }

    #[tokio::test]
    async fn script_runs_then_falls_back() {
        let provider = MockProvider::new("mock")
            .with_recording()
            .with_response("fallback")
            .with_script(["one", "two"]);

        assert_eq!(provider.complete(&request("a")).await.unwrap().content, "one");
        assert_eq!(provider.complete(&request("b")).await.unwrap().content, "two");
        assert_eq!(provider.complete(&request("c")).await.unwrap().content, "fallback");

        let seen: Vec<String> = provider.requests().into_iter().map(|r| r.user_prompt).collect();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn requests_are_not_kept_by_default() {
        let provider = MockProvider::new("mock").with_response("ok");
        for _ in 0..3 {
            provider.complete(&request("q")).await.unwrap();
        }
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn failing_mode_still_records() {
        let provider = MockProvider::new("mock").with_recording().failing("quota exceeded");
        let err = provider.complete(&request("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(provider.requests().len(), 1);
    }
}
