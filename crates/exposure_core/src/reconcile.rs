//! Mapping from the platform's exposure status to the state the app shows.

use shared::domain::{ExposureActiveState, InactiveReason, InactiveState, PlatformExposureStatus};
use tracing::debug;

/// Reconciles a raw platform status into an [`ExposureActiveState`].
///
/// An unavailable manager wins over any status. A manager that is available but
/// produced no status is treated the same way.
pub fn reconcile(
    manager_available: bool,
    status: Option<PlatformExposureStatus>,
) -> ExposureActiveState {
    let Some(status) = status.filter(|_| manager_available) else {
        return ExposureActiveState::Inactive(InactiveState::RequiresPlatformUpdate);
    };

    match status {
        PlatformExposureStatus::Active => ExposureActiveState::Active,
        PlatformExposureStatus::Inactive(reason) => reconcile_inactive(reason),
        PlatformExposureStatus::NotAuthorized => ExposureActiveState::NotAuthorized,
        PlatformExposureStatus::AuthorizationDenied => ExposureActiveState::AuthorizationDenied,
    }
}

fn reconcile_inactive(reason: InactiveReason) -> ExposureActiveState {
    match reason {
        InactiveReason::BluetoothOff => ExposureActiveState::Inactive(InactiveState::BluetoothOff),
        InactiveReason::Disabled | InactiveReason::Restricted => {
            ExposureActiveState::Inactive(InactiveState::Disabled)
        }
        InactiveReason::NotAuthorized => ExposureActiveState::NotAuthorized,
        InactiveReason::Unknown => {
            // Usually an entitlement or code signing problem on the device.
            debug!("exposure: platform reported inactive with unknown reason, showing as disabled");
            ExposureActiveState::Inactive(InactiveState::Disabled)
        }
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
