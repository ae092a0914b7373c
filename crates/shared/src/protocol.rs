use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::LabConfirmationKey;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub lab_confirmation_id: String,
    pub bucket_id: String,
    pub confirmation_key: String,
    /// Seconds the confirmation id stays valid after issue.
    pub validity: i64,
}

impl RegisterResponse {
    pub fn into_lab_confirmation_key(self, issued_at: DateTime<Utc>) -> LabConfirmationKey {
        LabConfirmationKey {
            identifier: self.lab_confirmation_id,
            bucket_id: self.bucket_id,
            confirmation_key: self.confirmation_key,
            valid_until: Duration::try_seconds(self.validity.max(0))
                .and_then(|validity| issued_at.checked_add_signed(validity))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}
