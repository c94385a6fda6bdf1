//! Service registry and client factory.
//!
//! The [`ServiceRegistry`] records which Prism Central services are available
//! and at which API version. The [`ClientFactory`] turns a resolved
//! [`TransportConfig`] into ready-to-use clients that share one connection
//! pool; asking for a service missing from the registry fails with
//! [`Error::SdkUnavailable`].

use std::collections::BTreeMap;
use validator::Validate;

use crate::client::{auth_headers, build_http_client, ClientConfig, ServiceClient, ServiceClientBuilder};
use crate::config::TransportConfig;
use crate::entity::EntityClient;
use crate::error::{Error, Result};
use crate::ids::validate_ext_id;
use crate::observe::Interceptor;
use crate::types::{PrismService, ResourceKind, DEFAULT_API_VERSION, PARENT_PLACEHOLDER};

/// Capability registry mapping services to API versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistry {
    versions: BTreeMap<PrismService, String>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ServiceRegistry {
    /// A registry with no services.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            versions: BTreeMap::new(),
        }
    }

    /// A registry with every known service at [`DEFAULT_API_VERSION`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for service in PrismService::all() {
            registry.register(*service, DEFAULT_API_VERSION);
        }
        registry
    }

    /// Registers (or re-versions) a service.
    pub fn register(&mut self, service: PrismService, version: impl Into<String>) {
        self.versions.insert(service, version.into());
    }

    /// Builder form of [`ServiceRegistry::register`].
    #[must_use]
    pub fn with_service(mut self, service: PrismService, version: impl Into<String>) -> Self {
        self.register(service, version);
        self
    }

    /// Removes a service, returning its version.
    pub fn remove(&mut self, service: PrismService) -> Option<String> {
        self.versions.remove(&service)
    }

    /// Returns the registered API version.
    #[must_use]
    pub fn version(&self, service: PrismService) -> Option<&str> {
        self.versions.get(&service).map(String::as_str)
    }

    /// Returns true if the service is registered.
    #[must_use]
    pub fn contains(&self, service: PrismService) -> bool {
        self.versions.contains_key(&service)
    }
}

/// Builds service and entity clients for one Prism Central endpoint.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    transport: TransportConfig,
    registry: ServiceRegistry,
    http: reqwest::Client,
    interceptor: Interceptor,
}

impl ClientFactory {
    /// Create a factory with every known service registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(transport: TransportConfig) -> Result<Self> {
        Self::with_registry(transport, ServiceRegistry::with_defaults())
    }

    /// Create a factory with an explicit registry.
    ///
    /// # Errors
    ///
    /// See [`ClientFactory::new`].
    pub fn with_registry(transport: TransportConfig, registry: ServiceRegistry) -> Result<Self> {
        transport.validate()?;
        let config = ClientConfig::new().with_timeout(transport.timeout());
        let http = build_http_client(&transport, &config)?;
        let interceptor = Interceptor::from_config(&transport)
            .with_default_headers(auth_headers(&transport.credentials)?);

        tracing::debug!(
            host = %transport.host,
            port = transport.port,
            proxied = transport.proxy.is_some() && !transport.bypasses_proxy(),
            "created client factory"
        );

        Ok(Self {
            transport,
            registry,
            http,
            interceptor,
        })
    }

    /// Return the transport configuration.
    #[must_use]
    pub const fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Return the service registry.
    #[must_use]
    pub const fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Returns a client bound to `service`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SdkUnavailable`] if the service is not registered.
    pub fn service(&self, service: PrismService) -> Result<ServiceClient> {
        let version = self.registry.version(service).ok_or_else(|| {
            Error::SdkUnavailable(format!(
                "no client is registered for the `{service}` service"
            ))
        })?;
        let base_url = self.transport.service_url(service.namespace(), version)?;

        ServiceClientBuilder::new(service, base_url)?
            .with_http_client(self.http.clone())
            .with_interceptor(self.interceptor.clone())
            .build()
    }

    /// Returns an entity client for a top-level resource kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SdkUnavailable`] for unregistered services and
    /// [`Error::InvalidEndpoint`] for nested kinds.
    pub fn entity(&self, kind: ResourceKind) -> Result<EntityClient> {
        if kind.is_nested() {
            return Err(Error::InvalidEndpoint(format!(
                "{kind:?} is nested and needs a parent external identifier"
            )));
        }
        Ok(EntityClient::new(
            self.service(kind.service())?,
            kind,
            kind.collection_path(),
        ))
    }

    /// Returns an entity client for a collection nested under `parent_ext_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the kind is not nested or the
    /// parent identifier is unusable.
    pub fn nested_entity(&self, kind: ResourceKind, parent_ext_id: &str) -> Result<EntityClient> {
        if !kind.is_nested() {
            return Err(Error::InvalidEndpoint(format!(
                "{kind:?} is not a nested collection"
            )));
        }
        let parent = validate_ext_id(parent_ext_id)?;
        let collection = kind.collection_path().replace(PARENT_PLACEHOLDER, parent);
        Ok(EntityClient::new(
            self.service(kind.service())?,
            kind,
            collection,
        ))
    }
}
