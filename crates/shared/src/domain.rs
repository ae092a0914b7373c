use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason reported by the platform when exposure detection is not running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveReason {
    BluetoothOff,
    Disabled,
    Restricted,
    NotAuthorized,
    Unknown,
}

/// Raw status as the platform exposure manager reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "reason", rename_all = "snake_case")]
pub enum PlatformExposureStatus {
    Active,
    Inactive(InactiveReason),
    NotAuthorized,
    AuthorizationDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveState {
    BluetoothOff,
    Disabled,
    RequiresPlatformUpdate,
}

/// Reconciled, UI-facing activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum ExposureActiveState {
    Active,
    Inactive(InactiveState),
    NotAuthorized,
    AuthorizationDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureNotificationState {
    #[default]
    NotNotified,
}

/// Snapshot published on the state stream. Always replaced whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExposureState {
    pub notified_state: ExposureNotificationState,
    pub active_state: ExposureActiveState,
}

impl ExposureState {
    pub fn new(
        notified_state: ExposureNotificationState,
        active_state: ExposureActiveState,
    ) -> Self {
        Self {
            notified_state,
            active_state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabConfirmationKey {
    pub identifier: String,
    pub bucket_id: String,
    pub confirmation_key: String,
    pub valid_until: DateTime<Utc>,
}

/// The part of a [`LabConfirmationKey`] shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationKey {
    pub confirmation_key: String,
    pub expiration: DateTime<Utc>,
}

impl From<LabConfirmationKey> for ConfirmationKey {
    fn from(value: LabConfirmationKey) -> Self {
        Self {
            confirmation_key: value.identifier,
            expiration: value.valid_until,
        }
    }
}
