//! Present/absent operations over one resource kind.
//!
//! Every write follows the same path: read the current entity and its version
//! token, build the proposed body, skip if nothing changes, then write with
//! `If-Match`. Writes answered with a task reference are waited on unless the
//! caller passes `wait: false`.

use prism_core::client::ApiResponse;
use prism_core::etag;
use prism_core::{ClientFactory, EntityClient, Error, Result};
use prism_spec::{build_spec, check, Decision};
use prism_tasks::{created_ext_id, TaskWaiter, TasksClient};
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::Resource;
use crate::envelope::{shape_response, OperationResult, State};
use crate::params::{self, Params};

/// Runs present/absent operations for a [`Resource`].
#[derive(Debug, Clone)]
pub struct EntityModule {
    factory: ClientFactory,
    resource: Resource,
    waiter: TaskWaiter,
    check_mode: bool,
}

impl EntityModule {
    /// Create a module.
    #[must_use]
    pub fn new(factory: ClientFactory, resource: Resource) -> Self {
        Self {
            factory,
            resource,
            waiter: TaskWaiter::new(),
            check_mode: false,
        }
    }

    /// Set the task waiter.
    #[must_use]
    pub const fn with_waiter(mut self, waiter: TaskWaiter) -> Self {
        self.waiter = waiter;
        self
    }

    /// Report would-be changes without issuing writes.
    #[must_use]
    pub const fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// The managed resource.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Runs the module. Never fails; errors are reported in the result.
    pub async fn run(&self, params: &Params) -> OperationResult {
        OperationResult::finish(self.execute(params).await)
    }

    async fn execute(&self, params: &Params) -> Result<OperationResult> {
        let state = params::state(params)?;
        let client = self.client(params)?;
        let ext_id = params::optional_str(params, "ext_id")?;
        let wait = params::flag(params, "wait", true)?;

        debug!(
            kind = %self.resource.kind,
            %state,
            ext_id = ext_id.unwrap_or_default(),
            check_mode = self.check_mode,
            "running operation"
        );

        match (state, ext_id) {
            (State::Present, None) => self.create(&client, params, wait).await,
            (State::Present, Some(id)) => self.update(&client, id, params, wait).await,
            (State::Absent, Some(id)) => self.delete(&client, id, wait).await,
            (State::Absent, None) => Err(Error::SchemaViolation(
                "`ext_id` is required when state is absent".to_string(),
            )),
        }
    }

    fn client(&self, params: &Params) -> Result<EntityClient> {
        match self.resource.parent_param {
            Some(key) => {
                let parent = params::required_str(params, key)?;
                self.factory.nested_entity(self.resource.kind, parent)
            }
            None => self.factory.entity(self.resource.kind),
        }
    }

    fn shape(&self, value: &Value) -> Value {
        shape_response(value, self.resource.schema.preserved_keys())
    }

    async fn create(&self, client: &EntityClient, params: &Params, wait: bool) -> Result<OperationResult> {
        let body = build_spec(&self.resource.schema, &self.resource.defaults, params)?;
        if self.check_mode {
            return Ok(OperationResult::new(true)
                .with_response(self.shape(&body))
                .with_msg("would create"));
        }

        let response = client.create(&body).await?;
        info!(kind = %self.resource.kind, "created entity");
        self.settle(response, OperationResult::new(true), wait).await
    }

    async fn update(
        &self,
        client: &EntityClient,
        ext_id: &str,
        params: &Params,
        wait: bool,
    ) -> Result<OperationResult> {
        let current = client.get(ext_id).await?;
        let token = current.etag();
        let current = current.into_data();

        let proposed = build_spec(&self.resource.schema, &current, params)?;
        let decision = check(&self.resource.schema, &current, &proposed, params);
        if decision == Decision::Skip {
            debug!(kind = %self.resource.kind, ext_id, "nothing to change");
            return Ok(OperationResult::new(false)
                .skipped()
                .with_ext_id(ext_id)
                .with_response(self.shape(&current))
                .with_msg("Nothing to change."));
        }
        if let Decision::Bypassed { fields } = &decision {
            debug!(kind = %self.resource.kind, ext_id, ?fields, "forcing update");
        }

        let token = etag::require(token, &format!("{} {ext_id}", self.resource.kind))?;
        if self.check_mode {
            return Ok(OperationResult::new(true)
                .with_ext_id(ext_id)
                .with_response(self.shape(&proposed))
                .with_msg("would update"));
        }

        let response = client.update(ext_id, &proposed, &token).await?;
        info!(kind = %self.resource.kind, ext_id, "updated entity");
        self.settle(response, OperationResult::new(true).with_ext_id(ext_id), wait)
            .await
    }

    async fn delete(&self, client: &EntityClient, ext_id: &str, wait: bool) -> Result<OperationResult> {
        let current = match client.get(ext_id).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                return Ok(OperationResult::new(false)
                    .with_ext_id(ext_id)
                    .with_msg("already absent"));
            }
            Err(err) => return Err(err),
        };

        let token = etag::require(current.etag(), &format!("{} {ext_id}", self.resource.kind))?;
        if self.check_mode {
            return Ok(OperationResult::new(true)
                .with_ext_id(ext_id)
                .with_msg("would delete"));
        }

        let response = client.delete(ext_id, &token).await?;
        info!(kind = %self.resource.kind, ext_id, "deleted entity");
        self.settle(response, OperationResult::new(true).with_ext_id(ext_id), wait)
            .await
    }

    /// Turns a write response into the result: waits on task references,
    /// otherwise reports the returned entity.
    async fn settle(
        &self,
        response: ApiResponse,
        mut result: OperationResult,
        wait: bool,
    ) -> Result<OperationResult> {
        let Some(task_ext_id) = response.task_reference().map(str::to_string) else {
            let data = response.into_data();
            if result.ext_id.is_none() {
                result.ext_id = data.get("extId").and_then(Value::as_str).map(str::to_string);
            }
            return Ok(result.with_response(self.shape(&data)));
        };

        result = result.with_task_ext_id(task_ext_id.as_str());
        if !wait {
            return Ok(result.with_response(self.shape(response.data())));
        }

        let tasks = TasksClient::from_factory(&self.factory)?;
        let task = self.waiter.wait_for_completion(&tasks, &task_ext_id).await?;
        if result.ext_id.is_none() {
            result.ext_id = created_ext_id(&task, self.resource.kind).map(str::to_string);
        }
        let record = serde_json::to_value(&task)?;
        Ok(result.with_response(self.shape(&record)))
    }
}
