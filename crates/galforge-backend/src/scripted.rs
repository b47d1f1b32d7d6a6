//! A backend that replays a fixed script.
//!
//! Each `invoke` consumes the next step. Every request is recorded so
//! callers can assert on the prompts the executor built.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use galforge_contracts::{backend::BackendRequest, error::BackendError};
use galforge_core::traits::Backend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Return this text as the completion.
    Reply(String),
    /// Fail with this message.
    Fail(String),
}

impl ScriptStep {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    pub fn new<I: IntoIterator<Item = ScriptStep>>(steps: I) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append steps after the ones already queued.
    pub fn push<I: IntoIterator<Item = ScriptStep>>(&self, steps: I) {
        self.steps
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend(steps);
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl Backend for ScriptedBackend {
    fn invoke(&self, request: &BackendRequest) -> Result<String, BackendError> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());

        let step = self.steps.lock().unwrap_or_else(|p| p.into_inner()).pop_front();
        debug!(step = ?step, "scripted backend step");
        match step {
            Some(ScriptStep::Reply(text)) => Ok(text),
            Some(ScriptStep::Fail(message)) => Err(BackendError::new(message)),
            None => Err(BackendError::new("scripted backend has no steps left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use galforge_contracts::backend::{BackendRequest, GenerationConfig};

    use super::*;

    fn req(user: &str) -> BackendRequest {
        BackendRequest::new("sys", user, GenerationConfig::default())
    }

    #[test]
    fn test_replays_steps_in_order_and_records_requests() {
        let backend = ScriptedBackend::new([ScriptStep::reply("{}"), ScriptStep::fail("content_filter")]);

        assert_eq!(backend.invoke(&req("a")).unwrap(), "{}");
        assert_eq!(backend.invoke(&req("b")).unwrap_err().message, "content_filter");

        let seen: Vec<String> = backend
            .requests()
            .iter()
            .filter_map(|r| r.last_user_message().map(str::to_string))
            .collect();
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_exhausted_script_fails() {
        let backend = ScriptedBackend::new(Vec::new());
        let err = backend.invoke(&req("a")).unwrap_err();
        assert!(err.message.contains("no steps left"));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_push_appends_to_queue() {
        let backend = ScriptedBackend::new([ScriptStep::reply("1")]);
        backend.push([ScriptStep::reply("2")]);
        assert_eq!(backend.remaining(), 2);
        backend.invoke(&req("x")).unwrap();
        assert_eq!(backend.invoke(&req("y")).unwrap(), "2");
    }
}
