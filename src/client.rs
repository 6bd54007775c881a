use crate::form::{EmailMetadata, EmailSource, SelectedFile, SubmitRequest};
use crate::models::{
    ClassificationResult, Count, Email, HistoryItem, NewPrompt, PromptItem, PromptQuery,
    PromptTypes, PromptUpdate,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
}

/// Operations the UI needs from the backend. Lets the app be driven by a
/// fake in tests.
#[async_trait]
pub trait ClassifierApi: Send + Sync {
    async fn classify(&self, request: &SubmitRequest) -> Result<ClassificationResult>;
    async fn history(&self, skip: u32, limit: u32) -> Result<Vec<HistoryItem>>;
    async fn history_count(&self) -> Result<u64>;
    async fn list_prompts(&self, query: &PromptQuery) -> Result<Vec<PromptItem>>;
    async fn prompt_types(&self) -> Result<PromptTypes>;
    async fn create_prompt(&self, prompt: &NewPrompt) -> Result<PromptItem>;
    async fn update_prompt(&self, id: i64, update: &PromptUpdate) -> Result<PromptItem>;
    async fn delete_prompt(&self, id: i64) -> Result<()>;
}

#[derive(Clone)]
pub struct ClassificationClient {
    http: Client,
    base_url: String,
}

/// FastAPI error body. `detail` is a string for handled errors and a list
/// for validation failures.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// The prompt listing has been served both bare and wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum PromptList {
    Plain(Vec<PromptItem>),
    Wrapped { value: Vec<PromptItem> },
}

impl ClassificationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn upload_text(
        &self,
        content: &str,
        metadata: &EmailMetadata,
    ) -> Result<ClassificationResult> {
        let form = with_metadata(Form::new().text("content", content.to_string()), metadata);
        tracing::debug!(len = content.len(), "uploading email text");

        let response = self
            .http
            .post(self.url("/emails/upload-text"))
            .multipart(form)
            .send()
            .await
            .context("Failed to upload email text")?;
        decode(response).await.context("Failed to classify email")
    }

    pub async fn upload_file(
        &self,
        file: &SelectedFile,
        metadata: &EmailMetadata,
    ) -> Result<ClassificationResult> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("Failed to read {}", file.path.display()))?;
        tracing::debug!(name = %file.name, size = bytes.len(), "uploading email file");

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(file.mime_type())
            .context("Invalid MIME type")?;
        let form = with_metadata(Form::new().part("file", part), metadata);

        let response = self
            .http
            .post(self.url("/emails/upload-file"))
            .multipart(form)
            .send()
            .await
            .context("Failed to upload email file")?;
        decode(response).await.context("Failed to classify email file")
    }

    pub async fn list_emails(&self, skip: u32, limit: u32) -> Result<Vec<Email>> {
        let response = self
            .http
            .get(self.url("/emails"))
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await
            .context("Failed to list emails")?;
        decode(response).await
    }

    pub async fn get_email(&self, id: i64) -> Result<ClassificationResult> {
        let response = self
            .http
            .get(self.url(&format!("/emails/{}", id)))
            .send()
            .await
            .context(format!("Failed to get email {}", id))?;
        decode(response).await
    }

    pub async fn get_prompt(&self, id: i64) -> Result<PromptItem> {
        let response = self
            .http
            .get(self.url(&format!("/prompts/{}", id)))
            .send()
            .await
            .context(format!("Failed to get prompt {}", id))?;
        decode(response).await
    }

    pub async fn prompt_count(&self) -> Result<u64> {
        let response = self
            .http
            .get(self.url("/prompts/count/total"))
            .send()
            .await
            .context("Failed to count prompts")?;
        let count: Count = decode(response).await?;
        Ok(count.count)
    }

    pub async fn active_prompt(&self, prompt_type: &str, category: &str) -> Result<PromptItem> {
        let response = self
            .http
            .get(self.url(&format!("/prompts/active/{}/{}", prompt_type, category)))
            .send()
            .await
            .context("Failed to get active prompt")?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<()> {
        // The health route sits at the server root, outside the /api prefix
        let root = self
            .base_url
            .strip_suffix("/api")
            .unwrap_or(&self.base_url);
        let response = self
            .http
            .get(format!("{}/health", root))
            .send()
            .await
            .context("Backend is unreachable")?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ClassifierApi for ClassificationClient {
    async fn classify(&self, request: &SubmitRequest) -> Result<ClassificationResult> {
        match &request.source {
            EmailSource::Text(content) => self.upload_text(content, &request.metadata).await,
            EmailSource::File(file) => self.upload_file(file, &request.metadata).await,
        }
    }

    async fn history(&self, skip: u32, limit: u32) -> Result<Vec<HistoryItem>> {
        let response = self
            .http
            .get(self.url("/historico"))
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await
            .context("Failed to load history")?;
        decode(response).await
    }

    async fn history_count(&self) -> Result<u64> {
        let response = self
            .http
            .get(self.url("/historico/count"))
            .send()
            .await
            .context("Failed to count history")?;
        let count: Count = decode(response).await?;
        Ok(count.count)
    }

    async fn list_prompts(&self, query: &PromptQuery) -> Result<Vec<PromptItem>> {
        let response = self
            .http
            .get(self.url("/prompts/"))
            .query(query)
            .send()
            .await
            .context("Failed to load prompts")?;
        let list: PromptList = decode(response).await?;
        Ok(match list {
            PromptList::Plain(prompts) => prompts,
            PromptList::Wrapped { value } => value,
        })
    }

    async fn prompt_types(&self) -> Result<PromptTypes> {
        let response = self
            .http
            .get(self.url("/prompts/types/list"))
            .send()
            .await
            .context("Failed to load prompt types")?;
        decode(response).await
    }

    async fn create_prompt(&self, prompt: &NewPrompt) -> Result<PromptItem> {
        let response = self
            .http
            .post(self.url("/prompts/"))
            .json(prompt)
            .send()
            .await
            .context("Failed to create prompt")?;
        decode(response).await
    }

    async fn update_prompt(&self, id: i64, update: &PromptUpdate) -> Result<PromptItem> {
        let response = self
            .http
            .put(self.url(&format!("/prompts/{}", id)))
            .json(update)
            .send()
            .await
            .context(format!("Failed to update prompt {}", id))?;
        decode(response).await
    }

    async fn delete_prompt(&self, id: i64) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/prompts/{}", id)))
            .send()
            .await
            .context(format!("Failed to delete prompt {}", id))?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}

fn with_metadata(mut form: Form, metadata: &EmailMetadata) -> Form {
    if let Some(subject) = &metadata.subject {
        form = form.text("subject", subject.clone());
    }
    if let Some(sender) = &metadata.sender {
        form = form.text("sender", sender.clone());
    }
    if let Some(recipient) = &metadata.recipient {
        form = form.text("recipient", recipient.clone());
    }
    form
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => body,
        };
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        }
        .into());
    }
    response
        .json::<T>()
        .await
        .context("Failed to decode response")
}
