use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{
        ConfirmationKey, ExposureNotificationState, ExposureState, LabConfirmationKey,
        PlatformExposureStatus,
    },
    error::{ExposureDataError, ExposureManagerError},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod data_controller;
pub mod inflight;
pub mod reconcile;
pub mod state_stream;

pub use data_controller::HttpExposureDataController;
pub use inflight::{InflightRegistry, RequestId};
pub use reconcile::reconcile;
pub use state_stream::{ExposureStateSink, ExposureStateStream};

const DEFAULT_PLATFORM_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Platform service that runs exposure detection on the device.
#[async_trait]
pub trait ExposureManager: Send + Sync {
    async fn activate(&self) -> Result<(), ExposureManagerError>;
    async fn set_exposure_notification_enabled(
        &self,
        enabled: bool,
    ) -> Result<(), ExposureManagerError>;
    fn exposure_notification_status(&self) -> PlatformExposureStatus;
}

#[async_trait]
pub trait ExposureDataController: Send + Sync {
    async fn request_lab_confirmation_key(&self) -> Result<LabConfirmationKey, ExposureDataError>;
}

pub struct MissingExposureDataController;

#[async_trait]
impl ExposureDataController for MissingExposureDataController {
    async fn request_lab_confirmation_key(&self) -> Result<LabConfirmationKey, ExposureDataError> {
        Err(ExposureDataError::Internal(
            "exposure data controller is unavailable".into(),
        ))
    }
}

/// Whether this device offers a platform exposure manager at all.
#[derive(Clone)]
pub enum PlatformCapability {
    Available(Arc<dyn ExposureManager>),
    Unavailable,
}

impl PlatformCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl From<Option<Arc<dyn ExposureManager>>> for PlatformCapability {
    fn from(value: Option<Arc<dyn ExposureManager>>) -> Self {
        match value {
            Some(manager) => Self::Available(manager),
            None => Self::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub platform_timeout: Duration,
    pub data_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            platform_timeout: DEFAULT_PLATFORM_TIMEOUT,
            data_timeout: DEFAULT_DATA_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformOperation {
    Activate,
    EnableExposureNotification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    PlatformCallFailed {
        operation: PlatformOperation,
        error: ExposureManagerError,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),
}

/// Result of a platform call followed by the state it published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOutcome {
    pub state: ExposureState,
    pub error: Option<ExposureManagerError>,
}

pub struct ExposureCoordinator {
    shared: Arc<CoordinatorShared>,
    inflight: InflightRegistry,
}

struct CoordinatorShared {
    config: CoordinatorConfig,
    state_sink: Arc<dyn ExposureStateSink>,
    platform: PlatformCapability,
    data_controller: Arc<dyn ExposureDataController>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl ExposureCoordinator {
    pub fn new(
        state_sink: Arc<dyn ExposureStateSink>,
        platform: PlatformCapability,
        data_controller: Arc<dyn ExposureDataController>,
    ) -> Self {
        Self::with_config(
            CoordinatorConfig::default(),
            state_sink,
            platform,
            data_controller,
        )
    }

    pub fn with_config(
        config: CoordinatorConfig,
        state_sink: Arc<dyn ExposureStateSink>,
        platform: PlatformCapability,
        data_controller: Arc<dyn ExposureDataController>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(CoordinatorShared {
                config,
                state_sink,
                platform,
                data_controller,
                events,
            }),
            inflight: InflightRegistry::new(),
        }
    }

    /// Activates the platform manager and publishes the resulting state.
    ///
    /// Without a platform manager the state is published before returning and
    /// no request is tracked. Otherwise the work runs on a spawned task.
    ///
    /// # Panics
    ///
    /// Panics when a platform manager is bound and no tokio runtime is running.
    pub fn activate(&self) -> Option<RequestId> {
        if !self.shared.platform.is_available() {
            self.shared.publish();
            return None;
        }

        let shared = Arc::clone(&self.shared);
        Some(self.inflight.spawn(async move {
            shared.activate().await;
        }))
    }

    pub async fn activate_now(&self) -> PlatformOutcome {
        self.shared.activate().await
    }

    /// Asks the platform to enable exposure notifications, then publishes.
    ///
    /// Like [`activate`](Self::activate), publishes inline and returns `None`
    /// when there is no platform manager.
    ///
    /// # Panics
    ///
    /// Panics when a platform manager is bound and no tokio runtime is running.
    pub fn request_exposure_notification_permission(&self) -> Option<RequestId> {
        if !self.shared.platform.is_available() {
            self.shared.publish();
            return None;
        }

        let shared = Arc::clone(&self.shared);
        Some(self.inflight.spawn(async move {
            shared.enable_exposure_notification().await;
        }))
    }

    pub async fn request_exposure_notification_permission_now(&self) -> PlatformOutcome {
        self.shared.enable_exposure_notification().await
    }

    /// Fetches a lab confirmation key and hands the result to `completion`.
    ///
    /// Data controller errors reach `completion` unchanged. A request that
    /// [`shutdown`](Self::shutdown) counted as cancelled never invokes its
    /// completion, even if the fetch finished concurrently.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn request_lab_confirmation_key<F>(&self, completion: F) -> RequestId
    where
        F: FnOnce(Result<ConfirmationKey, ExposureDataError>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        self.inflight.spawn_with_completion(
            async move { shared.lab_confirmation_key().await },
            completion,
        )
    }

    pub async fn lab_confirmation_key(&self) -> Result<ConfirmationKey, ExposureDataError> {
        self.shared.lab_confirmation_key().await
    }

    /// Key upload is not available yet. `completion` is dropped without being
    /// called.
    pub fn request_upload_keys<F>(&self, completion: F) -> Result<(), CoordinatorError>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        drop(completion);
        Err(CoordinatorError::NotImplemented("key upload"))
    }

    pub fn confirm_exposure_notification(&self) -> Result<(), CoordinatorError> {
        Err(CoordinatorError::NotImplemented(
            "exposure notification confirmation",
        ))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.shared.events.subscribe()
    }

    pub fn inflight_requests(&self) -> usize {
        self.inflight.len()
    }

    /// Aborts all in-flight work and returns how many requests were cancelled.
    /// Dropping the coordinator does the same. Requests whose completion had
    /// already started are not counted.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.inflight.cancel_all();
        if cancelled > 0 {
            info!("exposure: cancelled in-flight requests count={cancelled}");
        }
        cancelled
    }
}

impl CoordinatorShared {
    async fn activate(&self) -> PlatformOutcome {
        let error = match &self.platform {
            PlatformCapability::Available(manager) => {
                self.observe_platform_call(PlatformOperation::Activate, manager.activate())
                    .await
            }
            PlatformCapability::Unavailable => None,
        };
        PlatformOutcome {
            state: self.publish(),
            error,
        }
    }

    async fn enable_exposure_notification(&self) -> PlatformOutcome {
        let error = match &self.platform {
            PlatformCapability::Available(manager) => {
                self.observe_platform_call(
                    PlatformOperation::EnableExposureNotification,
                    manager.set_exposure_notification_enabled(true),
                )
                .await
            }
            PlatformCapability::Unavailable => {
                debug!("exposure: no platform manager, skipping enable request");
                None
            }
        };
        PlatformOutcome {
            state: self.publish(),
            error,
        }
    }

    async fn lab_confirmation_key(&self) -> Result<ConfirmationKey, ExposureDataError> {
        let key = tokio::time::timeout(
            self.config.data_timeout,
            self.data_controller.request_lab_confirmation_key(),
        )
        .await
        .map_err(|_| ExposureDataError::Timeout)??;
        Ok(ConfirmationKey::from(key))
    }

    async fn observe_platform_call<F>(
        &self,
        operation: PlatformOperation,
        call: F,
    ) -> Option<ExposureManagerError>
    where
        F: Future<Output = Result<(), ExposureManagerError>>,
    {
        let timeout = self.config.platform_timeout;
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ExposureManagerError::Timeout(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        let error = result.err()?;
        warn!("exposure: platform call failed operation={operation:?} error={error}");
        let _ = self.events.send(CoordinatorEvent::PlatformCallFailed {
            operation,
            error: error.clone(),
        });
        Some(error)
    }

    fn current_state(&self) -> ExposureState {
        let active_state = match &self.platform {
            PlatformCapability::Available(manager) => {
                reconcile(true, Some(manager.exposure_notification_status()))
            }
            PlatformCapability::Unavailable => reconcile(false, None),
        };
        ExposureState::new(ExposureNotificationState::NotNotified, active_state)
    }

    fn publish(&self) -> ExposureState {
        let state = self.current_state();
        info!(
            "exposure: publishing state active={:?} notified={:?}",
            state.active_state, state.notified_state
        );
        self.state_sink.update(state);
        state
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
