use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use console_core::{LogRow, ProcessId, RowKey, TaskStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use url::Url;

use crate::{FailureKind, FetchError, SearchPage, SearchRequest, TaskStatusReport};

/// Envelope code the backend uses for success.
const SUCCESS_CODE: &str = "0000";
const TASK_NOT_FOUND: &str = "TASK_NOT_FOUND";
const SEARCH_FAILED: &str = "SEARCH_FAILED";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Row field holding the record identity.
    pub key_field: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            key_field: "logId".to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait ConsoleBackend: Send + Sync {
    async fn search_details(&self, request: &SearchRequest) -> Result<SearchPage, FetchError>;

    /// Tasks of a Logstash process, latest first.
    async fn process_tasks(
        &self,
        process_id: ProcessId,
    ) -> Result<Vec<TaskStatusReport>, FetchError>;
}

/// Latest task of a process; a process without tasks is an error.
pub async fn latest_task(
    backend: Arc<dyn ConsoleBackend>,
    process_id: ProcessId,
) -> Result<TaskStatusReport, FetchError> {
    backend
        .process_tasks(process_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            FetchError::new(
                FailureKind::Api {
                    code: TASK_NOT_FOUND.to_string(),
                },
                format!("no task found for process {process_id}"),
            )
        })
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
    settings: ClientSettings,
}

impl HttpBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            base,
            client,
            settings,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn send<D: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<D, FetchError> {
        let request = match &self.settings.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let envelope: ApiEnvelope<D> = serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        if envelope.code != SUCCESS_CODE {
            return Err(FetchError::new(
                FailureKind::Api {
                    code: envelope.code,
                },
                envelope.message.unwrap_or_default(),
            ));
        }
        envelope
            .data
            .ok_or_else(|| FetchError::new(FailureKind::Decode, "response has no data"))
    }
}

#[async_trait::async_trait]
impl ConsoleBackend for HttpBackend {
    async fn search_details(&self, request: &SearchRequest) -> Result<SearchPage, FetchError> {
        let url = self.endpoint("api/logs/search/details")?;
        let body = serde_json::to_vec(request)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        let builder = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        let data: DetailData = self.send(builder).await?;
        if data.success == Some(false) {
            return Err(FetchError::new(
                FailureKind::Api {
                    code: SEARCH_FAILED.to_string(),
                },
                data.error_message
                    .unwrap_or_else(|| "search failed".to_string()),
            ));
        }

        let rows: Vec<LogRow> = data
            .rows
            .into_iter()
            .map(|object| row_from_json(object, &self.settings.key_field))
            .collect();
        Ok(SearchPage {
            rows: rows.into(),
            total_count: data.total_count,
        })
    }

    async fn process_tasks(
        &self,
        process_id: ProcessId,
    ) -> Result<Vec<TaskStatusReport>, FetchError> {
        let url = self.endpoint(&format!("api/logstash/processes/{process_id}/tasks"))?;
        let tasks: Vec<TaskDetail> = self.send(self.client.get(url)).await?;
        Ok(tasks.into_iter().map(TaskStatusReport::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<D> {
    code: String,
    #[serde(default)]
    message: Option<String>,
    data: Option<D>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailData {
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDetail {
    #[serde(default)]
    task_id: String,
    #[serde(default)]
    name: Option<String>,
    status: String,
    #[serde(default)]
    progress_percentage: Option<f64>,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<TaskDetail> for TaskStatusReport {
    fn from(detail: TaskDetail) -> Self {
        Self {
            task_id: detail.task_id,
            name: detail.name,
            status: TaskStatus::parse(&detail.status),
            progress_percentage: detail.progress_percentage,
            error_message: detail.error_message,
        }
    }
}

/// Convert a backend row into a [`LogRow`].
///
/// Rows without the key field are identified by a digest of their content,
/// so the same row fetched twice still de-duplicates.
pub fn row_from_json(object: Map<String, Value>, key_field: &str) -> LogRow {
    let key = match object.get(key_field) {
        Some(Value::String(text)) if !text.is_empty() => RowKey::Text(text.clone()),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(RowKey::Number)
            .unwrap_or_else(|| RowKey::Text(number.to_string())),
        _ => RowKey::Text(content_digest(&object)),
    };
    let fields = object
        .into_iter()
        .map(|(name, value)| (name, display_value(value)))
        .collect();
    LogRow { key, fields }
}

fn display_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn content_digest(object: &Map<String, Value>) -> String {
    let sorted: BTreeMap<&String, &Value> = object.iter().collect();
    let canonical = serde_json::to_string(&sorted).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
