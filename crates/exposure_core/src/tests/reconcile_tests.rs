use super::*;

const ALL_STATUSES: [PlatformExposureStatus; 8] = [
    PlatformExposureStatus::Active,
    PlatformExposureStatus::Inactive(InactiveReason::BluetoothOff),
    PlatformExposureStatus::Inactive(InactiveReason::Disabled),
    PlatformExposureStatus::Inactive(InactiveReason::Restricted),
    PlatformExposureStatus::Inactive(InactiveReason::NotAuthorized),
    PlatformExposureStatus::Inactive(InactiveReason::Unknown),
    PlatformExposureStatus::NotAuthorized,
    PlatformExposureStatus::AuthorizationDenied,
];

#[test]
fn unavailable_manager_requires_platform_update_for_any_status() {
    let expected = ExposureActiveState::Inactive(InactiveState::RequiresPlatformUpdate);
    assert_eq!(reconcile(false, None), expected);
    for status in ALL_STATUSES {
        assert_eq!(reconcile(false, Some(status)), expected, "status {status:?}");
    }
}

#[test]
fn available_manager_without_status_requires_platform_update() {
    assert_eq!(
        reconcile(true, None),
        ExposureActiveState::Inactive(InactiveState::RequiresPlatformUpdate)
    );
}

#[test]
fn active_maps_to_active() {
    assert_eq!(
        reconcile(true, Some(PlatformExposureStatus::Active)),
        ExposureActiveState::Active
    );
}

#[test]
fn bluetooth_off_is_kept_distinct() {
    assert_eq!(
        reconcile(
            true,
            Some(PlatformExposureStatus::Inactive(InactiveReason::BluetoothOff))
        ),
        ExposureActiveState::Inactive(InactiveState::BluetoothOff)
    );
}

#[test]
fn disabled_and_restricted_collapse_to_disabled() {
    let disabled = reconcile(
        true,
        Some(PlatformExposureStatus::Inactive(InactiveReason::Disabled)),
    );
    let restricted = reconcile(
        true,
        Some(PlatformExposureStatus::Inactive(InactiveReason::Restricted)),
    );
    assert_eq!(disabled, ExposureActiveState::Inactive(InactiveState::Disabled));
    assert_eq!(disabled, restricted);
}

#[test]
fn inactive_not_authorized_maps_to_not_authorized() {
    assert_eq!(
        reconcile(
            true,
            Some(PlatformExposureStatus::Inactive(InactiveReason::NotAuthorized))
        ),
        ExposureActiveState::NotAuthorized
    );
}

#[test]
fn unknown_reason_falls_back_to_disabled() {
    assert_eq!(
        reconcile(
            true,
            Some(PlatformExposureStatus::Inactive(InactiveReason::Unknown))
        ),
        ExposureActiveState::Inactive(InactiveState::Disabled)
    );
}

#[test]
fn authorization_states_pass_through() {
    assert_eq!(
        reconcile(true, Some(PlatformExposureStatus::NotAuthorized)),
        ExposureActiveState::NotAuthorized
    );
    assert_eq!(
        reconcile(true, Some(PlatformExposureStatus::AuthorizationDenied)),
        ExposureActiveState::AuthorizationDenied
    );
}

#[test]
fn available_manager_never_reports_platform_update() {
    for status in ALL_STATUSES {
        assert_ne!(
            reconcile(true, Some(status)),
            ExposureActiveState::Inactive(InactiveState::RequiresPlatformUpdate),
            "status {status:?}"
        );
    }
}
