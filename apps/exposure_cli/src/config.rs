use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use exposure_core::CoordinatorConfig;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub platform_status: String,
    pub platform_timeout_secs: u64,
    pub data_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            platform_status: "active".into(),
            platform_timeout_secs: 10,
            data_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    platform_status: Option<String>,
    platform_timeout_secs: Option<u64>,
    data_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            platform_timeout: Duration::from_secs(self.platform_timeout_secs),
            data_timeout: Duration::from_secs(self.data_timeout_secs),
        }
    }

    pub fn parsed_api_url(&self) -> anyhow::Result<Option<Url>> {
        self.api_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid api url '{raw}'")))
            .transpose()
    }
}

/// Defaults, then the toml file at `path` if present, then the environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = Some(v);
    }
    if let Some(v) = file_cfg.platform_status {
        settings.platform_status = v;
    }
    if let Some(v) = file_cfg.platform_timeout_secs {
        settings.platform_timeout_secs = v;
    }
    if let Some(v) = file_cfg.data_timeout_secs {
        settings.data_timeout_secs = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("EXPOSURE_API_URL") {
        settings.api_url = Some(v);
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = Some(v);
    }

    if let Some(v) = lookup("APP__PLATFORM_STATUS") {
        settings.platform_status = v;
    }

    if let Some(v) = lookup("APP__PLATFORM_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.platform_timeout_secs = parsed;
        }
    }
    if let Some(v) = lookup("APP__DATA_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.data_timeout_secs = parsed;
        }
    }
}
