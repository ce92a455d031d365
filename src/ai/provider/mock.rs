//! Scripted backend for orchestration tests. Counts invocations and records
//! every input it receives.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ModelBackend, Response};
use crate::ai::model::LanguageModel;
use crate::types::RoundError;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Return the input verbatim
    Echo,
    /// Always return the same text
    Fixed(String),
    /// Return the first `n` characters of the input
    Truncate(usize),
}

pub struct MockBackend {
    model: LanguageModel,
    reply: Reply,
    failure: Option<(usize, RoundError)>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(model: LanguageModel) -> Self {
        Self {
            model,
            reply: Reply::Echo,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    /// Fail the zero-based `call`-th invocation with `error`
    pub fn failing_on(mut self, call: usize, error: RoundError) -> Self {
        self.failure = Some((call, error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn model(&self) -> &LanguageModel {
        &self.model
    }

    async fn transform(&self, input_text: &str, _temperature: f64) -> Response {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input_text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((failing_call, error)) = &self.failure
            && *failing_call == call
        {
            return Response::failed(&self.model, error);
        }

        let text = match &self.reply {
            Reply::Echo => input_text.to_string(),
            Reply::Fixed(text) => text.clone(),
            Reply::Truncate(n) => input_text.chars().take(*n).collect(),
        };
        let units_in_request = input_text.chars().count();
        let units_in_response = text.chars().count();
        Response::success(text, &self.model, units_in_request, units_in_response)
    }
}
