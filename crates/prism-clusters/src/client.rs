//! Asynchronous client for clusters and hosts.

use std::collections::HashMap;

use prism_core::client::{ServiceClient, ServiceClientBuilder};
use prism_core::ids::{ClusterExtId, HostExtId};
use prism_core::pagination::{fetch_all, Page, PageSource};
use prism_core::shaper::normalize_list;
use prism_core::{ClientFactory, Error, ListQuery, PrismService, ResourceKind};
use serde::de::DeserializeOwned;

use crate::models::{Cluster, Host};
use crate::Result;

/// Builder for [`ClustersClient`].
#[derive(Debug, Clone)]
pub struct ClustersClientBuilder {
    inner: ServiceClientBuilder,
}

impl ClustersClientBuilder {
    /// Create a builder for the clustermgmt service base URL
    /// (`https://pc:9440/api/clustermgmt/v4.0/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            inner: ServiceClientBuilder::new(PrismService::Clusters, base_url)?,
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
    pub fn build(self) -> Result<ClustersClient> {
        Ok(ClustersClient {
            inner: self.inner.build()?,
        })
    }
}

/// Asynchronous cluster and host client.
#[derive(Debug, Clone)]
pub struct ClustersClient {
    inner: ServiceClient,
}

impl ClustersClient {
    /// Wrap an existing clustermgmt service client.
    #[must_use]
    pub const fn from_service(inner: ServiceClient) -> Self {
        Self { inner }
    }

    /// Obtain a client from a factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SdkUnavailable`] if the clustermgmt service is not registered.
    pub fn from_factory(factory: &ClientFactory) -> Result<Self> {
        Ok(Self::from_service(factory.service(PrismService::Clusters)?))
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, query: &ListQuery) -> Result<Page<T>> {
        let response = self.inner.get(path, &query.to_pairs()).await?;
        let items = normalize_list(response.body.get("data"))
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(|e| Error::ParseError(format!("Failed to parse {path} listing: {e}")))?;
        Ok(Page::new(items, response.total_available_results()))
    }

    /// Fetch one cluster.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn get_cluster(&self, ext_id: &ClusterExtId) -> Result<Cluster> {
        let path = format!("{}/{ext_id}", ResourceKind::Cluster.collection_path());
        self.inner.get_json(&path, &[]).await
    }

    /// List one page of clusters.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn list_clusters(&self, query: &ListQuery) -> Result<Page<Cluster>> {
        self.list(ResourceKind::Cluster.collection_path(), query).await
    }

    /// List one page of hosts across every cluster.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn list_hosts(&self, query: &ListQuery) -> Result<Page<Host>> {
        self.list(ResourceKind::Host.collection_path(), query).await
    }

    /// Fetch one host of a cluster.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn get_host(&self, cluster: &ClusterExtId, host: &HostExtId) -> Result<Host> {
        let path = format!(
            "{}/{cluster}/hosts/{host}",
            ResourceKind::Cluster.collection_path()
        );
        self.inner.get_json(&path, &[]).await
    }

    /// Enumerate every host matching the filter of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PageFetchFailed`] if any page fails.
    pub async fn list_all_hosts(&self, query: &ListQuery) -> Result<Vec<Host>> {
        fetch_all(self, query).await
    }

    /// Map of cluster external id to cluster name over every cluster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PageFetchFailed`] if any page fails.
    pub async fn cluster_names(&self) -> Result<HashMap<String, String>> {
        let clusters: Vec<Cluster> = fetch_all(self, &ListQuery::new()).await?;
        let names: HashMap<String, String> = clusters
            .into_iter()
            .filter_map(|c| Some((c.ext_id?.into_string(), c.name?)))
            .collect();
        tracing::debug!(clusters = names.len(), "resolved cluster names");
        Ok(names)
    }
}

#[async_trait::async_trait]
impl PageSource<Cluster> for ClustersClient {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Cluster>> {
        self.list_clusters(query).await
    }
}

#[async_trait::async_trait]
impl PageSource<Host> for ClustersClient {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Host>> {
        self.list_hosts(query).await
    }
}
