use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

/// Why a backend request produced no usable body.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("could not reach the server: {0}")]
    Transport(String),

    #[error("HTTP error {code}: {reason}")]
    Status { code: u16, reason: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("could not read {path}: {message}")]
    File { path: String, message: String },
}

impl RequestError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RequestError::Decode(e.to_string())
        } else {
            RequestError::Transport(e.to_string())
        }
    }
}

/// The one call the send controller needs from the network.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn query(&self, conversation_id: &str, query: &str) -> Result<Value, RequestError>;
}

// ── HTTP backend ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub active_conversations: u64,
}

#[derive(Debug, Deserialize)]
pub struct UploadSummary {
    pub message: String,
    pub uploaded_files: Vec<String>,
    pub all_processed_files_in_conversation: Vec<String>,
}

#[derive(Deserialize)]
struct CreatedConversation {
    conversation_id: String,
}

#[derive(Deserialize)]
struct ProcessedFiles {
    processed_files: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<Health, RequestError> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;
        decode(resp).await
    }

    /// Start a conversation on the server and return its id.
    pub async fn create_conversation(&self) -> Result<String, RequestError> {
        let resp = self
            .client
            .post(self.url("/conversations"))
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;
        let created: CreatedConversation = decode(resp).await?;
        tracing::info!(conversation = %created.conversation_id, "created conversation");
        Ok(created.conversation_id)
    }

    pub async fn upload_files(
        &self,
        conversation_id: &str,
        paths: &[impl AsRef<Path>],
    ) -> Result<UploadSummary, RequestError> {
        let mut form = multipart::Form::new();
        for path in paths {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path).await.map_err(|e| RequestError::File {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.xlsx".to_string());
            form = form.part("files", multipart::Part::bytes(bytes).file_name(name));
        }
        let resp = self
            .client
            .post(self.url(&format!("/conversations/{conversation_id}/upload")))
            .multipart(form)
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;
        let summary: UploadSummary = decode(resp).await?;
        tracing::info!(
            conversation = %conversation_id,
            uploaded = summary.uploaded_files.len(),
            "uploaded files"
        );
        Ok(summary)
    }

    /// Whether the server still knows `conversation_id`. The server drops
    /// idle conversations, so a stored id can go stale; that is `Ok(false)`.
    pub async fn validate_conversation(&self, conversation_id: &str) -> Result<bool, RequestError> {
        let resp = self
            .client
            .get(self.url(&format!("/conversations/{conversation_id}/validate")))
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;
        if resp.status() == StatusCode::NOT_FOUND {
            tracing::info!(conversation = %conversation_id, "conversation is gone from the server");
            return Ok(false);
        }
        let _: Value = decode(resp).await?;
        Ok(true)
    }

    pub async fn processed_files(&self, conversation_id: &str) -> Result<Vec<String>, RequestError> {
        let resp = self
            .client
            .get(self.url(&format!("/conversations/{conversation_id}/files")))
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;
        let files: ProcessedFiles = decode(resp).await?;
        Ok(files.processed_files)
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn query(&self, conversation_id: &str, query: &str) -> Result<Value, RequestError> {
        tracing::info!(conversation = %conversation_id, "sending query");
        let resp = self
            .client
            .post(self.url(&format!("/conversations/{conversation_id}/query")))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;
        decode(resp).await
    }
}

/// Turn a non-2xx status into [`RequestError::Status`], otherwise decode the JSON body.
async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, RequestError> {
    let status = resp.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("Unknown Status").to_string();
        tracing::warn!(code = status.as_u16(), %reason, "backend returned an error status");
        return Err(RequestError::Status { code: status.as_u16(), reason });
    }
    resp.json::<T>().await.map_err(|e| RequestError::Decode(e.to_string()))
}
