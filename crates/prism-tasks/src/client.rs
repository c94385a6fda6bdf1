//! Asynchronous client for Prism Central tasks.

use prism_core::client::{ServiceClient, ServiceClientBuilder};
use prism_core::ids::validate_ext_id;
use prism_core::pagination::{Page, PageSource};
use prism_core::shaper::normalize_list;
use prism_core::{ClientFactory, Error, ListQuery, PrismService};
use reqwest::Method;
use serde_json::Value;

use crate::models::Task;
use crate::wait::TaskSource;
use crate::Result;

const TASKS_PATH: &str = "config/tasks";

/// Builder for [`TasksClient`].
#[derive(Debug, Clone)]
pub struct TasksClientBuilder {
    inner: ServiceClientBuilder,
}

impl TasksClientBuilder {
    /// Create a builder for the prism service base URL
    /// (`https://pc:9440/api/prism/v4.0/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            inner: ServiceClientBuilder::new(PrismService::Prism, base_url)?,
        })
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.inner = self.inner.with_basic_auth(username, password);
        self
    }

    /// Configure an API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.inner = self.inner.with_api_key(key);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<TasksClient> {
        Ok(TasksClient {
            inner: self.inner.build()?,
        })
    }
}

/// Asynchronous tasks client.
#[derive(Debug, Clone)]
pub struct TasksClient {
    inner: ServiceClient,
}

impl TasksClient {
    /// Wrap an existing prism service client.
    #[must_use]
    pub const fn from_service(inner: ServiceClient) -> Self {
        Self { inner }
    }

    /// Obtain a tasks client from a factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SdkUnavailable`] if the prism service is not registered.
    pub fn from_factory(factory: &ClientFactory) -> Result<Self> {
        Ok(Self::from_service(factory.service(PrismService::Prism)?))
    }

    /// Fetch one task.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn get_task(&self, task_ext_id: &str) -> Result<Task> {
        let path = format!("{TASKS_PATH}/{}", validate_ext_id(task_ext_id)?);
        self.inner.get_json(&path, &[]).await
    }

    /// List one page of tasks.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn list_tasks(&self, query: &ListQuery) -> Result<Page<Task>> {
        let response = self.inner.get(TASKS_PATH, &query.to_pairs()).await?;
        let data = normalize_list(response.body.get("data"))
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Task>, _>>()
            .map_err(|e| Error::ParseError(format!("Failed to parse task list: {e}")))?;
        Ok(Page::new(data, response.total_available_results()))
    }

    /// Request cancellation of a running task.
    ///
    /// # Errors
    ///
    /// Returns transport or remote errors.
    pub async fn cancel_task(&self, task_ext_id: &str) -> Result<Value> {
        let path = format!(
            "{TASKS_PATH}/{}/$actions/cancel",
            validate_ext_id(task_ext_id)?
        );
        let response = self.inner.send(Method::POST, &path, None, None).await?;
        Ok(response.into_data())
    }
}

#[async_trait::async_trait]
impl TaskSource for TasksClient {
    async fn get_task(&self, task_ext_id: &str) -> Result<Task> {
        TasksClient::get_task(self, task_ext_id).await
    }
}

#[async_trait::async_trait]
impl PageSource<Task> for TasksClient {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Task>> {
        self.list_tasks(query).await
    }
}
