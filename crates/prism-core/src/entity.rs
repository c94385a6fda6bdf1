//! Uniform CRUD client for any resource kind.

use reqwest::Method;
use serde_json::Value;

use crate::client::{ApiResponse, ServiceClient};
use crate::error::{Error, Result};
use crate::etag::ETag;
use crate::ids::validate_ext_id;
use crate::pagination::{Page, PageSource};
use crate::query::ListQuery;
use crate::shaper::normalize_list;
use crate::types::{Action, ResourceKind};

/// Client for one resource collection.
#[derive(Debug, Clone)]
pub struct EntityClient {
    client: ServiceClient,
    kind: ResourceKind,
    collection: String,
}

impl EntityClient {
    /// Create a client for `collection` relative to the service base URL.
    pub fn new(client: ServiceClient, kind: ResourceKind, collection: impl Into<String>) -> Self {
        Self {
            client,
            kind,
            collection: collection.into(),
        }
    }

    /// Resource kind served by this client.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Collection path relative to the service base URL.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The underlying service client.
    #[must_use]
    pub const fn service_client(&self) -> &ServiceClient {
        &self.client
    }

    fn item_path(&self, ext_id: &str) -> Result<String> {
        Ok(format!("{}/{}", self.collection, validate_ext_id(ext_id)?))
    }

    /// Reads one entity. The version token is available via [`ApiResponse::etag`].
    ///
    /// # Errors
    ///
    /// Returns transport or remote errors.
    pub async fn get(&self, ext_id: &str) -> Result<ApiResponse> {
        let path = self.item_path(ext_id)?;
        self.client.get(&path, &[]).await
    }

    /// Lists one page of the collection.
    ///
    /// # Errors
    ///
    /// Returns transport or remote errors.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Value>> {
        let response = self.client.get(&self.collection, &query.to_pairs()).await?;
        Ok(Page::new(
            normalize_list(response.body.get("data")),
            response.total_available_results(),
        ))
    }

    /// Creates an entity.
    ///
    /// # Errors
    ///
    /// Returns transport or remote errors.
    pub async fn create(&self, body: &Value) -> Result<ApiResponse> {
        self.client
            .send(Method::POST, &self.collection, Some(body), None)
            .await
    }

    /// Replaces an entity guarded by `etag`.
    ///
    /// # Errors
    ///
    /// Returns transport or remote errors (412 when the token is stale).
    pub async fn update(&self, ext_id: &str, body: &Value, etag: &ETag) -> Result<ApiResponse> {
        let path = self.item_path(ext_id)?;
        self.client
            .send(Method::PUT, &path, Some(body), Some(etag))
            .await
    }

    /// Deletes an entity guarded by `etag`.
    ///
    /// # Errors
    ///
    /// Returns transport or remote errors.
    pub async fn delete(&self, ext_id: &str, etag: &ETag) -> Result<ApiResponse> {
        let path = self.item_path(ext_id)?;
        self.client
            .send(Method::DELETE, &path, None, Some(etag))
            .await
    }

    /// Invokes `{collection}[/{ext_id}]/$actions/{action}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the resource kind does not support
    /// the action family, otherwise transport or remote errors.
    pub async fn action(
        &self,
        ext_id: Option<&str>,
        action: &str,
        body: Option<&Value>,
        etag: Option<&ETag>,
    ) -> Result<ApiResponse> {
        let supported = Action::classify(action).is_some_and(|family| self.kind.supports(family));
        if !supported {
            return Err(Error::InvalidEndpoint(format!(
                "{:?} does not support the `{action}` action",
                self.kind
            )));
        }

        let path = match ext_id {
            Some(id) => format!("{}/$actions/{action}", self.item_path(id)?),
            None => format!("{}/$actions/{action}", self.collection),
        };
        self.client.send(Method::POST, &path, body, etag).await
    }
}

#[async_trait::async_trait]
impl PageSource<Value> for EntityClient {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Value>> {
        self.list(query).await
    }
}
