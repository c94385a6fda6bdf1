//! Read-only info operations.

use prism_core::pagination::fetch_all;
use prism_core::{ClientFactory, EntityClient, ResourceKind, Result};
use prism_spec::info_query;
use serde_json::Value;

use crate::envelope::{shape_response, OperationResult};
use crate::params::{self, Params};

/// Fetches one entity by `ext_id` or lists the collection.
///
/// With `fetch_all: true` every page is enumerated; otherwise `page` and
/// `limit` select a single page.
#[derive(Debug, Clone)]
pub struct InfoModule {
    factory: ClientFactory,
    kind: ResourceKind,
    parent_param: Option<&'static str>,
    extras: Vec<&'static str>,
    preserve: Vec<String>,
}

impl InfoModule {
    /// Create an info module for `kind`.
    #[must_use]
    pub fn new(factory: ClientFactory, kind: ResourceKind) -> Self {
        Self {
            factory,
            kind,
            parent_param: None,
            extras: Vec::new(),
            preserve: Vec::new(),
        }
    }

    /// Set the parent parameter of a nested collection.
    #[must_use]
    pub const fn with_parent_param(mut self, param: &'static str) -> Self {
        self.parent_param = Some(param);
        self
    }

    /// Forward an extra query parameter verbatim.
    #[must_use]
    pub fn with_extra(mut self, key: &'static str) -> Self {
        self.extras.push(key);
        self
    }

    /// Keep an internal key in responses.
    #[must_use]
    pub fn preserving(mut self, key: impl Into<String>) -> Self {
        self.preserve.push(key.into());
        self
    }

    /// Runs the module. Never fails; errors are reported in the result.
    pub async fn run(&self, params: &Params) -> OperationResult {
        OperationResult::finish(self.execute(params).await)
    }

    async fn execute(&self, params: &Params) -> Result<OperationResult> {
        let client = self.client(params)?;

        if let Some(ext_id) = params::optional_str(params, "ext_id")? {
            let response = client.get(ext_id).await?;
            return Ok(OperationResult::new(false)
                .with_ext_id(ext_id)
                .with_response(shape_response(response.data(), &self.preserve)));
        }

        let query = info_query(params, &self.extras)?;
        let (items, total) = if params::flag(params, "fetch_all", false)? {
            let items: Vec<Value> = fetch_all(&client, &query).await?;
            let total = items.len() as u64;
            (items, Some(total))
        } else {
            let page = client.list(&query).await?;
            (page.data, page.total_available_results)
        };

        let mut result = OperationResult::new(false)
            .with_response(shape_response(&Value::Array(items), &self.preserve));
        result.total_available_results = total;
        Ok(result)
    }

    fn client(&self, params: &Params) -> Result<EntityClient> {
        match self.parent_param {
            Some(key) => self
                .factory
                .nested_entity(self.kind, params::required_str(params, key)?),
            None => self.factory.entity(self.kind),
        }
    }
}
