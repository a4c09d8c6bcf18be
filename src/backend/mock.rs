//! Scripted backend for pipeline tests.
//!
//! Replies are consumed in order, one per run. An exhausted queue is a
//! hard error so a test fails loudly when the code under test makes
//! more backend calls than the scenario scripted.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{
    AssistantBackend, AssistantSpec, BackendError, ContentPart, RunMessages, RunStatus,
    ThreadMessage,
};

#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    pending: Mutex<HashMap<String, String>>,
    assistants: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    /// When set, runs never complete; for exercising deadlines.
    stall: bool,
}

impl MockBackend {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            stall: true,
            replies: Mutex::new(vec![String::new()]),
            ..Self::default()
        }
    }

    /// Every user message sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Names of assistants created (not merely looked up).
    pub fn created_assistants(&self) -> Vec<String> {
        self.assistants.lock().unwrap().clone()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl AssistantBackend for MockBackend {
    async fn find_assistant(&self, _name: &str) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, BackendError> {
        self.assistants.lock().unwrap().push(spec.name.clone());
        Ok(self.fresh_id("asst"))
    }

    async fn ensure_file(&self, _path: &Path) -> Result<String, BackendError> {
        Ok(self.fresh_id("file"))
    }

    async fn create_vector_store(
        &self,
        _name: &str,
        _file_ids: &[String],
    ) -> Result<String, BackendError> {
        Ok(self.fresh_id("vs"))
    }

    async fn create_thread(&self) -> Result<String, BackendError> {
        Ok(self.fresh_id("thread"))
    }

    async fn add_message(&self, _thread_id: &str, text: &str) -> Result<(), BackendError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
    ) -> Result<String, BackendError> {
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(BackendError::Payload(
                    "mock reply queue exhausted: unexpected backend call".to_string(),
                ));
            }
            replies.remove(0)
        };
        let run_id = self.fresh_id("run");
        self.pending.lock().unwrap().insert(run_id.clone(), reply);
        Ok(run_id)
    }

    async fn run_status(&self, _thread_id: &str, _run_id: &str) -> Result<RunStatus, BackendError> {
        if self.stall {
            Ok(RunStatus::InProgress)
        } else {
            Ok(RunStatus::Completed)
        }
    }

    async fn run_messages(
        &self,
        _thread_id: &str,
        run_id: &str,
    ) -> Result<RunMessages, BackendError> {
        let reply = self
            .pending
            .lock()
            .unwrap()
            .get(run_id)
            .cloned()
            .ok_or_else(|| BackendError::Payload(format!("unknown run {}", run_id)))?;
        Ok(RunMessages {
            messages: vec![ThreadMessage {
                role: "assistant".to_string(),
                content: vec![ContentPart::Text(reply.clone())],
            }],
            raw: json!({"data": [{"role": "assistant", "text": reply}]}),
        })
    }

    async fn run_steps(&self, _thread_id: &str, run_id: &str) -> Result<Value, BackendError> {
        Ok(json!({"data": [], "run_id": run_id}))
    }
}
