//! Stand-in platform exposure manager for running the coordinator off-device.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use exposure_core::{ExposureManager, PlatformCapability};
use parking_lot::Mutex;
use shared::{
    domain::{InactiveReason, PlatformExposureStatus},
    error::ExposureManagerError,
};
use tracing::info;

pub struct SimulatedExposureManager {
    status: Mutex<PlatformExposureStatus>,
}

impl SimulatedExposureManager {
    pub fn new(status: PlatformExposureStatus) -> Self {
        Self {
            status: Mutex::new(status),
        }
    }
}

#[async_trait]
impl ExposureManager for SimulatedExposureManager {
    async fn activate(&self) -> Result<(), ExposureManagerError> {
        info!("platform: activated status={:?}", *self.status.lock());
        Ok(())
    }

    async fn set_exposure_notification_enabled(
        &self,
        enabled: bool,
    ) -> Result<(), ExposureManagerError> {
        let mut status = self.status.lock();
        match (*status, enabled) {
            (PlatformExposureStatus::AuthorizationDenied, true) => Err(
                ExposureManagerError::Rejected("authorization was denied".into()),
            ),
            (PlatformExposureStatus::Inactive(InactiveReason::BluetoothOff), true) => Ok(()),
            (_, true) => {
                *status = PlatformExposureStatus::Active;
                Ok(())
            }
            (_, false) => {
                *status = PlatformExposureStatus::Inactive(InactiveReason::Disabled);
                Ok(())
            }
        }
    }

    fn exposure_notification_status(&self) -> PlatformExposureStatus {
        *self.status.lock()
    }
}

/// Parses a configured platform status; `unavailable` means no manager at all.
pub fn platform_from_setting(raw: &str) -> Result<PlatformCapability> {
    let status = match raw.trim().to_ascii_lowercase().as_str() {
        "unavailable" => return Ok(PlatformCapability::Unavailable),
        "active" => PlatformExposureStatus::Active,
        "bluetooth_off" => PlatformExposureStatus::Inactive(InactiveReason::BluetoothOff),
        "disabled" => PlatformExposureStatus::Inactive(InactiveReason::Disabled),
        "restricted" => PlatformExposureStatus::Inactive(InactiveReason::Restricted),
        "inactive_not_authorized" => {
            PlatformExposureStatus::Inactive(InactiveReason::NotAuthorized)
        }
        "unknown" => PlatformExposureStatus::Inactive(InactiveReason::Unknown),
        "not_authorized" => PlatformExposureStatus::NotAuthorized,
        "authorization_denied" => PlatformExposureStatus::AuthorizationDenied,
        other => bail!("unknown platform status '{other}'"),
    };
    Ok(PlatformCapability::Available(Arc::new(
        SimulatedExposureManager::new(status),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_setting_yields_no_manager() {
        let platform = platform_from_setting("Unavailable").expect("parse");
        assert!(!platform.is_available());
    }

    #[test]
    fn unknown_setting_is_rejected() {
        assert!(platform_from_setting("sleeping").is_err());
    }

    #[test]
    fn status_settings_are_reported_by_the_manager() {
        let PlatformCapability::Available(manager) =
            platform_from_setting("bluetooth_off").expect("parse")
        else {
            panic!("expected a manager");
        };
        assert_eq!(
            manager.exposure_notification_status(),
            PlatformExposureStatus::Inactive(InactiveReason::BluetoothOff)
        );
    }

    #[tokio::test]
    async fn enabling_turns_disabled_into_active() {
        let manager =
            SimulatedExposureManager::new(PlatformExposureStatus::Inactive(InactiveReason::Disabled));
        manager
            .set_exposure_notification_enabled(true)
            .await
            .expect("enable");
        assert_eq!(
            manager.exposure_notification_status(),
            PlatformExposureStatus::Active
        );
    }

    #[tokio::test]
    async fn enabling_after_denial_is_rejected() {
        let manager = SimulatedExposureManager::new(PlatformExposureStatus::AuthorizationDenied);
        let err = manager
            .set_exposure_notification_enabled(true)
            .await
            .expect_err("must fail");
        assert!(matches!(err, ExposureManagerError::Rejected(_)));
    }
}
