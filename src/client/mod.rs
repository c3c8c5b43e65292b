//! Typed client boundary to the Azure management API.
//!
//! The handlers never speak HTTP themselves; they consume the traits in
//! this module, which a host supplies with a concrete transport behind
//! them (authentication, retries and pagination are the transport's
//! concern). The traits mirror the management API surface each handler
//! needs: `get`, `create_or_update`, `delete`, plus resource-specific
//! extras such as listing authentication keys.
//!
//! Mutations that the service tracks as long-running operations return an
//! [`Operation`] handle; the caller blocks on [`Operation::wait`], which
//! honors external cancellation and never retries.

pub mod models;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use self::models::{
    IntegrationRuntimeAuthKeys, IntegrationRuntimeResource, PolicyDefinition,
    VirtualMachineExtension,
};

/// Errors surfaced by the management API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The addressed remote object does not exist.
    #[error("the resource was not found")]
    NotFound,

    /// The service rejected the request.
    #[error("the request failed with status {status}: {message}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Service error message
        message: String,
    },

    /// The request never reached the service.
    #[error("transport error: {0}")]
    Transport(String),

    /// A long-running operation reached a terminal failure state.
    #[error("the operation failed: {0}")]
    OperationFailed(String),

    /// Cancellation was signaled while waiting on an operation.
    #[error("the operation was cancelled")]
    Cancelled,
}

impl ApiError {
    /// True if the error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

/// Result of polling a long-running operation once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// Still running; poll again after the interval.
    InProgress,
    /// Terminal success.
    Succeeded,
    /// Terminal failure with the service's message.
    Failed(String),
}

/// One in-flight long-running operation, polled until terminal.
#[async_trait]
pub trait PendingOperation: Send {
    /// Polls the remote status once.
    async fn poll(&mut self) -> Result<OperationStatus, ApiError>;
}

/// Pollable handle for a long-running remote mutation.
///
/// `wait` is the only suspension point in a handler: it polls until the
/// operation is terminal, sleeping between polls, and aborts immediately
/// with [`ApiError::Cancelled`] when the supplied token fires. Failures
/// propagate unchanged; nothing is retried.
pub struct Operation {
    pending: Option<Box<dyn PendingOperation>>,
    poll_interval: Duration,
}

impl Operation {
    /// An operation that already completed synchronously.
    pub fn completed() -> Self {
        Self {
            pending: None,
            poll_interval: Duration::ZERO,
        }
    }

    /// An operation that must be polled to completion.
    pub fn pending(pending: Box<dyn PendingOperation>, poll_interval: Duration) -> Self {
        Self {
            pending: Some(pending),
            poll_interval,
        }
    }

    /// Blocks until the operation reaches a terminal state or cancellation
    /// is signaled.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Result<(), ApiError> {
        let Some(mut pending) = self.pending.take() else {
            return Ok(());
        };

        loop {
            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            let status = tokio::select! {
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                status = pending.poll() => status?,
            };

            match status {
                OperationStatus::Succeeded => return Ok(()),
                OperationStatus::Failed(message) => {
                    return Err(ApiError::OperationFailed(message));
                }
                OperationStatus::InProgress => {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                        () = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("pending", &self.pending.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Virtual machine extension operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VirtualMachineExtensionsApi: Send + Sync {
    /// Fetches an extension by its composite key.
    async fn get(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
    ) -> Result<VirtualMachineExtension, ApiError>;

    /// Creates or updates an extension. Long-running.
    async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
        extension: VirtualMachineExtension,
    ) -> Result<Operation, ApiError>;

    /// Deletes an extension. Long-running. Deleting an absent extension is
    /// a no-op success by the underlying API contract.
    async fn delete(
        &self,
        resource_group: &str,
        vm_name: &str,
        name: &str,
    ) -> Result<Operation, ApiError>;
}

/// Data factory integration runtime operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntegrationRuntimesApi: Send + Sync {
    /// Fetches an integration runtime by its composite key.
    async fn get(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
    ) -> Result<IntegrationRuntimeResource, ApiError>;

    /// Creates or updates an integration runtime. Completes synchronously.
    async fn create_or_update(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
        runtime: IntegrationRuntimeResource,
    ) -> Result<IntegrationRuntimeResource, ApiError>;

    /// Deletes an integration runtime. Completes synchronously.
    async fn delete(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
    ) -> Result<(), ApiError>;

    /// Fetches the generated authentication keys of a self-hosted runtime.
    async fn list_auth_keys(
        &self,
        resource_group: &str,
        factory_name: &str,
        name: &str,
    ) -> Result<IntegrationRuntimeAuthKeys, ApiError>;
}

/// Policy definition lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyDefinitionsApi: Send + Sync {
    /// Fetches a policy definition by name.
    async fn get(&self, name: &str) -> Result<PolicyDefinition, ApiError>;
}

/// The stateless client handle shared by every handler invocation.
#[derive(Clone)]
pub struct ArmClient {
    /// Virtual machine extension client.
    pub virtual_machine_extensions: Arc<dyn VirtualMachineExtensionsApi>,
    /// Integration runtime client.
    pub integration_runtimes: Arc<dyn IntegrationRuntimesApi>,
    /// Policy definition client.
    pub policy_definitions: Arc<dyn PolicyDefinitionsApi>,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient").finish_non_exhaustive()
    }
}
