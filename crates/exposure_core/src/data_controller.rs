use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use shared::{
    domain::LabConfirmationKey,
    error::ExposureDataError,
    protocol::{RegisterRequest, RegisterResponse},
};
use tracing::{info, warn};
use url::Url;

use crate::ExposureDataController;

const REGISTER_PATH: &str = "v1/register";

/// Data controller backed by the exposure notification API over HTTP.
pub struct HttpExposureDataController {
    http: Client,
    base_url: Url,
}

impl HttpExposureDataController {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, mut base_url: Url) -> Self {
        // Url::join drops the last path segment unless it ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn register_url(&self) -> Result<Url, ExposureDataError> {
        self.base_url
            .join(REGISTER_PATH)
            .map_err(|err| ExposureDataError::Internal(format!("invalid register url: {err}")))
    }
}

#[async_trait]
impl ExposureDataController for HttpExposureDataController {
    async fn request_lab_confirmation_key(&self) -> Result<LabConfirmationKey, ExposureDataError> {
        let url = self.register_url()?;
        let res = self
            .http
            .post(url.clone())
            .json(&RegisterRequest::default())
            .send()
            .await
            .map_err(|err| {
                warn!("exposure: register request failed url={url} error={err}");
                ExposureDataError::NetworkUnreachable(err.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            warn!("exposure: register rejected url={url} status={status}");
            return Err(ExposureDataError::ServerError {
                status: status.as_u16(),
            });
        }

        let body: RegisterResponse = res
            .json()
            .await
            .map_err(|err| ExposureDataError::ResponseDecode(err.to_string()))?;
        let key = body.into_lab_confirmation_key(Utc::now());
        info!(
            "exposure: received lab confirmation key valid_until={}",
            key.valid_until
        );
        Ok(key)
    }
}

#[cfg(test)]
#[path = "tests/data_controller_tests.rs"]
mod tests;
