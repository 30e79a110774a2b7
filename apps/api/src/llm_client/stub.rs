//! Scripted completion backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionService, LlmError};

enum Script {
    Always(String),
    Queue(Mutex<VecDeque<Result<String, String>>>),
    Fail,
}

/// Replays canned responses and records every prompt it receives.
pub struct ScriptedCompletion {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    /// Answers every call with the same text.
    pub fn always(text: &str) -> Self {
        Self::with(Script::Always(text.to_string()))
    }

    /// Fails every call as if the service were unreachable.
    pub fn failing() -> Self {
        Self::with(Script::Fail)
    }

    /// Answers calls in order; `Err` entries and an exhausted queue fail the call.
    pub fn sequence(responses: Vec<Result<&str, &str>>) -> Self {
        let queue = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self::with(Script::Queue(Mutex::new(queue)))
    }

    fn with(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        let failure = |message: String| LlmError::Api {
            status: 503,
            message,
        };
        match &self.script {
            Script::Always(text) => Ok(text.clone()),
            Script::Fail => Err(failure("scripted failure".to_string())),
            Script::Queue(queue) => match queue.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(failure(message)),
                None => Err(failure("script exhausted".to_string())),
            },
        }
    }
}
