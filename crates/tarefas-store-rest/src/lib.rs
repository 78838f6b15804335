//! Client for the hosted `tasks`/`subtasks` tables.
//!
//! The service speaks the PostgREST dialect: rows are addressed with
//! `column=eq.value` filters, ordering uses `order=column.asc|desc`, and
//! writes echo the affected rows when asked with `Prefer: return=representation`.

pub mod error;
pub mod rows;

pub use error::{RemoteErrorKind, RestStoreError};
pub use rows::{NewSubtaskRow, NewTaskRow, SubtaskRow, SubtaskRowPatch, TaskRow, TaskRowPatch};

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, RestStoreError>;

const TASKS: &str = "tasks";
const SUBTASKS: &str = "subtasks";
const REST_PREFIX: &str = "rest/v1/";

/// Error body returned by the service on failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Row-level access to the remote tables.
#[derive(Clone, Debug)]
pub struct RestStore {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestStore {
    /// Build a store for `base_url` authenticated with `api_key`.
    ///
    /// # Errors
    /// Returns [`RestStoreError::InvalidUrl`] when `base_url` cannot be parsed.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_client(Client::new(), base_url, api_key)
    }

    /// Same as [`RestStore::new`] with a caller-provided HTTP client.
    ///
    /// # Errors
    /// Returns [`RestStoreError::InvalidUrl`] when `base_url` cannot be parsed.
    pub fn with_client(client: Client, base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let mut normalized = base_url.trim().to_owned();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized).map_err(|err| RestStoreError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(RestStoreError::InvalidUrl(base_url.to_owned()));
        }
        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base
            .join(REST_PREFIX)
            .and_then(|rest| rest.join(table))
            .map_err(|err| RestStoreError::InvalidUrl(err.to_string()))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn request(&self, method: Method, table: &str, query: &[(&str, String)]) -> Result<RequestBuilder> {
        let url = self.table_url(table)?;
        debug!(method = method.as_str(), table, ?query, "remote request");
        Ok(self
            .client
            .request(method, url)
            .headers(self.auth_headers())
            .query(query))
    }

    fn write_request(&self, method: Method, table: &str, query: &[(&str, String)]) -> Result<RequestBuilder> {
        Ok(self
            .request(method, table, query)?
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation"))
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .message
            .filter(|message| !message.is_empty())
            .or_else(|| (!text.is_empty()).then(|| text.clone()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
        warn!(
            status = status.as_u16(),
            code = body.code.as_deref().unwrap_or("-"),
            details = body.details.as_deref().unwrap_or("-"),
            hint = body.hint.as_deref().unwrap_or("-"),
            "remote request failed: {message}"
        );
        Err(RestStoreError::Api {
            status: status.as_u16(),
            code: body.code,
            message,
            details: body.details,
            hint: body.hint,
        })
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>> {
        let response = Self::send(request).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn single<T: DeserializeOwned>(request: RequestBuilder, table: &'static str) -> Result<T> {
        Self::rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(RestStoreError::EmptyResponse(table))
    }

    async fn single_by_id<T: DeserializeOwned>(request: RequestBuilder, table: &'static str, id: &str) -> Result<T> {
        Self::rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RestStoreError::NotFound {
                table,
                id: id.to_owned(),
            })
    }

    fn eq(id: &str) -> String {
        format!("eq.{id}")
    }

    /// Fetch every task, most recently created first.
    ///
    /// # Errors
    /// Returns an error when the request fails or rows cannot be decoded.
    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        let request = self.request(
            Method::GET,
            TASKS,
            &[("select", "*".into()), ("order", "created_at.desc".into())],
        )?;
        Self::rows(request).await
    }

    /// Fetch the subtasks of one task, oldest first.
    ///
    /// # Errors
    /// Returns an error when the request fails or rows cannot be decoded.
    pub async fn list_subtasks(&self, task_id: &str) -> Result<Vec<SubtaskRow>> {
        let request = self.request(
            Method::GET,
            SUBTASKS,
            &[
                ("select", "*".into()),
                ("task_id", Self::eq(task_id)),
                ("order", "created_at.asc".into()),
            ],
        )?;
        Self::rows(request).await
    }

    /// Insert a task and return the stored row.
    ///
    /// # Errors
    /// Returns an error when the insert is rejected or no row is echoed back.
    pub async fn insert_task(&self, row: &NewTaskRow) -> Result<TaskRow> {
        let request = self.write_request(Method::POST, TASKS, &[("select", "*".into())])?.json(row);
        Self::single(request, TASKS).await
    }

    /// Apply a partial update to one task and return the stored row.
    ///
    /// # Errors
    /// Returns [`RestStoreError::NotFound`] when no row has `id`, or any request error.
    pub async fn update_task(&self, id: &str, patch: &TaskRowPatch) -> Result<TaskRow> {
        let request = self
            .write_request(Method::PATCH, TASKS, &[("id", Self::eq(id)), ("select", "*".into())])?
            .json(patch);
        Self::single_by_id(request, TASKS, id).await
    }

    /// Delete one task. Its subtasks are removed by the service's foreign key cascade.
    ///
    /// # Errors
    /// Returns [`RestStoreError::NotFound`] when no row has `id`, or any request error.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let request = self.write_request(
            Method::DELETE,
            TASKS,
            &[("id", Self::eq(id)), ("select", "id".into())],
        )?;
        Self::single_by_id::<IgnoredAny>(request, TASKS, id).await?;
        Ok(())
    }

    /// Insert a subtask and return the stored row.
    ///
    /// # Errors
    /// Returns an error when the insert is rejected or no row is echoed back.
    pub async fn insert_subtask(&self, row: &NewSubtaskRow) -> Result<SubtaskRow> {
        let request = self
            .write_request(Method::POST, SUBTASKS, &[("select", "*".into())])?
            .json(row);
        Self::single(request, SUBTASKS).await
    }

    /// Apply a partial update to one subtask and return the stored row.
    ///
    /// # Errors
    /// Returns [`RestStoreError::NotFound`] when no row has `id`, or any request error.
    pub async fn update_subtask(&self, id: &str, patch: &SubtaskRowPatch) -> Result<SubtaskRow> {
        let request = self
            .write_request(Method::PATCH, SUBTASKS, &[("id", Self::eq(id)), ("select", "*".into())])?
            .json(patch);
        Self::single_by_id(request, SUBTASKS, id).await
    }

    /// Delete one subtask.
    ///
    /// # Errors
    /// Returns [`RestStoreError::NotFound`] when no row has `id`, or any request error.
    pub async fn delete_subtask(&self, id: &str) -> Result<()> {
        let request = self.write_request(
            Method::DELETE,
            SUBTASKS,
            &[("id", Self::eq(id)), ("select", "id".into())],
        )?;
        Self::single_by_id::<IgnoredAny>(request, SUBTASKS, id).await?;
        Ok(())
    }
}
