//! Asynchronous client for AHV virtual machines.

use prism_core::client::{ServiceClient, ServiceClientBuilder};
use prism_core::ids::VmExtId;
use prism_core::pagination::{fetch_all, Page, PageSource};
use prism_core::shaper::normalize_list;
use prism_core::{ClientFactory, Error, ListQuery, PrismService, ResourceKind};

use crate::models::Vm;
use crate::Result;

/// Builder for [`VmmClient`].
#[derive(Debug, Clone)]
pub struct VmmClientBuilder {
    inner: ServiceClientBuilder,
}

impl VmmClientBuilder {
    /// Create a builder for the vmm service base URL
    /// (`https://pc:9440/api/vmm/v4.0/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            inner: ServiceClientBuilder::new(PrismService::Vmm, base_url)?,
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
    pub fn build(self) -> Result<VmmClient> {
        Ok(VmmClient {
            inner: self.inner.build()?,
        })
    }
}

/// Asynchronous VM client.
#[derive(Debug, Clone)]
pub struct VmmClient {
    inner: ServiceClient,
}

impl VmmClient {
    /// Wrap an existing vmm service client.
    #[must_use]
    pub const fn from_service(inner: ServiceClient) -> Self {
        Self { inner }
    }

    /// Obtain a VM client from a factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SdkUnavailable`] if the vmm service is not registered.
    pub fn from_factory(factory: &ClientFactory) -> Result<Self> {
        Ok(Self::from_service(factory.service(PrismService::Vmm)?))
    }

    /// Fetch one VM.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn get_vm(&self, ext_id: &VmExtId) -> Result<Vm> {
        let path = format!("{}/{ext_id}", ResourceKind::Vm.collection_path());
        self.inner.get_json(&path, &[]).await
    }

    /// List one page of VMs.
    ///
    /// # Errors
    ///
    /// Returns transport, remote or parse errors.
    pub async fn list_vms(&self, query: &ListQuery) -> Result<Page<Vm>> {
        let response = self
            .inner
            .get(ResourceKind::Vm.collection_path(), &query.to_pairs())
            .await?;
        let vms = normalize_list(response.body.get("data"))
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Vm>, _>>()
            .map_err(|e| Error::ParseError(format!("Failed to parse VM list: {e}")))?;
        tracing::debug!(count = vms.len(), "listed VMs");
        Ok(Page::new(vms, response.total_available_results()))
    }

    /// Enumerate every VM matching the filter of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PageFetchFailed`] if any page fails.
    pub async fn list_all_vms(&self, query: &ListQuery) -> Result<Vec<Vm>> {
        fetch_all(self, query).await
    }
}

#[async_trait::async_trait]
impl PageSource<Vm> for VmmClient {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Vm>> {
        self.list_vms(query).await
    }
}
