//! HTTP client for the OpenAI Assistants v2 API.
//!
//! Thin JSON-over-HTTP adapter behind [`AssistantBackend`]: bearer
//! auth, the `OpenAI-Beta: assistants=v2` header, and a bounded
//! exponential-backoff retry for transport failures, 429s, and 5xx
//! responses.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    AssistantBackend, AssistantSpec, BackendError, Binding, ContentPart, RunMessages, RunStatus,
    ThreadMessage,
};

/// Connection settings for the backend client.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout; distinct from the agent-level run deadline.
    pub request_timeout: Duration,
    /// Retry attempts after the first failure.
    pub retries: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            request_timeout: Duration::from_secs(120),
            retries: 3,
        }
    }
}

pub struct OpenAiBackend {
    config: OpenAiConfig,
    http_client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// One JSON round-trip with the bounded backoff retry policy.
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        let mut attempt = 0;
        loop {
            match self.execute(method.clone(), path, body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt as u32));
                    warn!(
                        "backend request {} {} failed ({}), retrying in {:?}",
                        method, path, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        debug!("backend request: {} {}", method, path);
        let mut request = self
            .http_client
            .request(method, self.url(path))
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    fn require_id(value: &Value) -> Result<String, BackendError> {
        value["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BackendError::Payload("response has no id".to_string()))
    }
}

#[async_trait]
impl AssistantBackend for OpenAiBackend {
    async fn find_assistant(&self, name: &str) -> Result<Option<String>, BackendError> {
        let listing = self
            .request_json(Method::GET, "/assistants?limit=100", None)
            .await?;
        let found = listing["data"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|a| a["name"].as_str() == Some(name))
            .map(Self::require_id)
            .transpose()?;
        Ok(found)
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, BackendError> {
        let (tools, tool_resources) = match &spec.binding {
            Binding::CodeExecution { file_id } => (
                json!([{"type": "code_interpreter"}]),
                json!({"code_interpreter": {"file_ids": [file_id]}}),
            ),
            Binding::DocumentSearch { vector_store_id } => (
                json!([{"type": "file_search"}]),
                json!({"file_search": {"vector_store_ids": [vector_store_id]}}),
            ),
        };
        let body = json!({
            "name": spec.name,
            "instructions": spec.instructions,
            "model": spec.model,
            "tools": tools,
            "tool_resources": tool_resources,
        });
        let created = self
            .request_json(Method::POST, "/assistants", Some(&body))
            .await?;
        Self::require_id(&created)
    }

    async fn ensure_file(&self, path: &Path) -> Result<String, BackendError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| BackendError::Payload(format!("not a file: {}", path.display())))?;

        // Reuse a previous upload with the same name.
        let listing = self.request_json(Method::GET, "/files", None).await?;
        if let Some(existing) = listing["data"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|f| f["filename"].as_str() == Some(file_name.as_str()))
        {
            let id = Self::require_id(existing)?;
            debug!("reusing uploaded file {} ({})", file_name, id);
            return Ok(id);
        }

        let bytes = tokio::fs::read(path).await?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .http_client
            .post(self.url("/files"))
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let uploaded: Value = response.json().await?;
        Self::require_id(&uploaded)
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<String, BackendError> {
        let body = json!({"name": name, "file_ids": file_ids});
        let created = self
            .request_json(Method::POST, "/vector_stores", Some(&body))
            .await?;
        Self::require_id(&created)
    }

    async fn create_thread(&self) -> Result<String, BackendError> {
        let created = self
            .request_json(Method::POST, "/threads", Some(&json!({})))
            .await?;
        Self::require_id(&created)
    }

    async fn add_message(&self, thread_id: &str, text: &str) -> Result<(), BackendError> {
        let body = json!({"role": "user", "content": text});
        self.request_json(
            Method::POST,
            &format!("/threads/{}/messages", thread_id),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<String, BackendError> {
        let body = json!({"assistant_id": assistant_id});
        let created = self
            .request_json(
                Method::POST,
                &format!("/threads/{}/runs", thread_id),
                Some(&body),
            )
            .await?;
        Self::require_id(&created)
    }

    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, BackendError> {
        let run = self
            .request_json(
                Method::GET,
                &format!("/threads/{}/runs/{}", thread_id, run_id),
                None,
            )
            .await?;
        let status = run["status"]
            .as_str()
            .ok_or_else(|| BackendError::Payload("run has no status".to_string()))?;
        Ok(RunStatus::parse(status))
    }

    async fn run_messages(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunMessages, BackendError> {
        let raw = self
            .request_json(
                Method::GET,
                &format!("/threads/{}/messages?run_id={}", thread_id, run_id),
                None,
            )
            .await?;
        let messages = parse_messages(&raw);
        Ok(RunMessages { messages, raw })
    }

    async fn run_steps(&self, thread_id: &str, run_id: &str) -> Result<Value, BackendError> {
        self.request_json(
            Method::GET,
            &format!("/threads/{}/runs/{}/steps", thread_id, run_id),
            None,
        )
        .await
    }
}

/// Decode a message listing into typed messages, newest first.
fn parse_messages(raw: &Value) -> Vec<ThreadMessage> {
    raw["data"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|message| {
            let content = message["content"]
                .as_array()
                .into_iter()
                .flatten()
                .map(|block| match block["type"].as_str() {
                    Some("text") => ContentPart::Text(
                        block["text"]["value"].as_str().unwrap_or_default().to_string(),
                    ),
                    other => ContentPart::Other(other.unwrap_or("unknown").to_string()),
                })
                .collect();
            ThreadMessage {
                role: message["role"].as_str().unwrap_or_default().to_string(),
                content,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = OpenAiBackend::new(OpenAiConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..OpenAiConfig::default()
        })
        .unwrap();
        assert_eq!(backend.url("/threads"), "https://api.openai.com/v1/threads");
    }

    #[test]
    fn test_parse_messages_extracts_text_blocks() {
        let raw = json!({
            "data": [{
                "role": "assistant",
                "content": [
                    {"type": "image_file", "image_file": {"file_id": "f1"}},
                    {"type": "text", "text": {"value": "the findings"}}
                ]
            }]
        });
        let messages = parse_messages(&raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(
            messages[0].content,
            vec![
                ContentPart::Other("image_file".to_string()),
                ContentPart::Text("the findings".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_messages_empty_payload() {
        assert!(parse_messages(&json!({})).is_empty());
    }
}
