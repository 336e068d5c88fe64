use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use tracing::warn;

use crate::{
    notifications::DEFAULT_TOAST_TTL,
    transport::{DEFAULT_CART_UPDATE_PATH, DEFAULT_CLASSIFY_PATH},
    validation::MAX_UPLOAD_BYTES,
};

pub const SETTINGS_FILE: &str = "storefront.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub classify_path: String,
    pub cart_update_path: String,
    pub max_upload_bytes: u64,
    /// Transport timeout. Unset means the transport default applies.
    pub request_timeout_secs: Option<u64>,
    pub notification_ttl_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            classify_path: DEFAULT_CLASSIFY_PATH.into(),
            cart_update_path: DEFAULT_CART_UPDATE_PATH.into(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout_secs: None,
            notification_ttl_secs: DEFAULT_TOAST_TTL.as_secs(),
        }
    }
}

pub fn load_settings() -> Result<ClientSettings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    settings.apply_env(env);
    Ok(settings)
}

impl ClientSettings {
    fn apply_file(&mut self, raw: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(raw)?;

        if let Some(v) = table.get("base_url").and_then(toml::Value::as_str) {
            self.base_url = v.to_string();
        }
        if let Some(v) = table.get("classify_path").and_then(toml::Value::as_str) {
            self.classify_path = v.to_string();
        }
        if let Some(v) = table.get("cart_update_path").and_then(toml::Value::as_str) {
            self.cart_update_path = v.to_string();
        }
        if let Some(v) = table.get("max_upload_bytes").and_then(non_negative) {
            self.max_upload_bytes = v;
        }
        if let Some(v) = table.get("request_timeout_secs").and_then(non_negative) {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = table.get("notification_ttl_secs").and_then(non_negative) {
            self.notification_ttl_secs = v;
        }

        Ok(())
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("STOREFRONT_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = env("APP__BASE_URL") {
            self.base_url = v;
        }

        if let Some(v) = env("APP__CLASSIFY_PATH") {
            self.classify_path = v;
        }
        if let Some(v) = env("APP__CART_UPDATE_PATH") {
            self.cart_update_path = v;
        }

        if let Some(v) = parsed_env(&env, "APP__MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = v;
        }
        if let Some(v) = parsed_env(&env, "APP__REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = parsed_env(&env, "APP__NOTIFICATION_TTL_SECS") {
            self.notification_ttl_secs = v;
        }
    }
}

fn non_negative(value: &toml::Value) -> Option<u64> {
    value.as_integer().and_then(|v| u64::try_from(v).ok())
}

fn parsed_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = env(key)?;
    match raw.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = raw.as_str(), "settings: ignoring non-numeric override");
            None
        }
    }
}
