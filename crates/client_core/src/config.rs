use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::progress_animation::AnimationConfig;

pub const DEFAULT_SETTINGS_FILE: &str = "review_client.toml";
const ENV_PREFIX: &str = "REVIEW_CLIENT__";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub server_url: String,
    pub upload_path: String,
    pub file_field: String,
    pub progress_interval_ms: u64,
    pub progress_max_step: f64,
    pub progress_cap: f64,
    pub redirect_delay_ms: u64,
    pub notification_ttl_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            upload_path: "/upload".into(),
            file_field: "file".into(),
            progress_interval_ms: 200,
            progress_max_step: 10.0,
            progress_cap: 95.0,
            redirect_delay_ms: 500,
            notification_ttl_ms: 5_000,
            request_timeout_secs: 120,
        }
    }
}

impl ClientSettings {
    pub fn animation(&self) -> AnimationConfig {
        AnimationConfig {
            interval: Duration::from_millis(self.progress_interval_ms.max(1)),
            max_step: self.progress_max_step.max(0.0),
            cap: self.progress_cap.clamp(0.0, 100.0),
        }
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    upload_path: Option<String>,
    file_field: Option<String>,
    progress_interval_ms: Option<u64>,
    progress_max_step: Option<f64>,
    progress_cap: Option<f64>,
    redirect_delay_ms: Option<u64>,
    notification_ttl_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `review_client.toml` in the working directory if present, then environment.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    let path = Path::new(DEFAULT_SETTINGS_FILE);
    let file = if path.exists() { Some(path) } else { None };
    load_settings_from(file, |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if let Some(path) = file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    apply_env(&mut settings, env)?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.upload_path {
        settings.upload_path = v;
    }
    if let Some(v) = file_cfg.file_field {
        settings.file_field = v;
    }
    if let Some(v) = file_cfg.progress_interval_ms {
        settings.progress_interval_ms = v;
    }
    if let Some(v) = file_cfg.progress_max_step {
        settings.progress_max_step = v;
    }
    if let Some(v) = file_cfg.progress_cap {
        settings.progress_cap = v;
    }
    if let Some(v) = file_cfg.redirect_delay_ms {
        settings.redirect_delay_ms = v;
    }
    if let Some(v) = file_cfg.notification_ttl_ms {
        settings.notification_ttl_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
}

fn parsed<T: std::str::FromStr>(key: &str, raw: String) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("invalid value '{raw}' for {key}"))
}

fn apply_env(
    settings: &mut ClientSettings,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |name: &str| {
        let key = format!("{ENV_PREFIX}{name}");
        env(&key).map(|value| (key, value))
    };

    if let Some((_, v)) = var("SERVER_URL") {
        settings.server_url = v;
    }
    if let Some((_, v)) = var("UPLOAD_PATH") {
        settings.upload_path = v;
    }
    if let Some((_, v)) = var("FILE_FIELD") {
        settings.file_field = v;
    }
    if let Some((key, v)) = var("PROGRESS_INTERVAL_MS") {
        settings.progress_interval_ms = parsed(&key, v)?;
    }
    if let Some((key, v)) = var("PROGRESS_MAX_STEP") {
        settings.progress_max_step = parsed(&key, v)?;
    }
    if let Some((key, v)) = var("PROGRESS_CAP") {
        settings.progress_cap = parsed(&key, v)?;
    }
    if let Some((key, v)) = var("REDIRECT_DELAY_MS") {
        settings.redirect_delay_ms = parsed(&key, v)?;
    }
    if let Some((key, v)) = var("NOTIFICATION_TTL_MS") {
        settings.notification_ttl_ms = parsed(&key, v)?;
    }
    if let Some((key, v)) = var("REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parsed(&key, v)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_page_behaviour() {
        let settings = load_settings_from(None, no_env).expect("settings");
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.redirect_delay(), Duration::from_millis(500));
        assert_eq!(settings.notification_ttl(), Duration::from_secs(5));
        let animation = settings.animation();
        assert_eq!(animation.interval, Duration::from_millis(200));
        assert_eq!(animation.cap, 95.0);
    }

    #[test]
    fn file_then_env_override_defaults() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("review_client_settings_{suffix}.toml"));
        fs::write(
            &path,
            "server_url = \"http://backend:8080\"\nredirect_delay_ms = 250\nprogress_cap = 90.0\n",
        )
        .expect("write settings");

        let overrides = HashMap::from([
            ("REVIEW_CLIENT__REDIRECT_DELAY_MS", "100"),
            ("REVIEW_CLIENT__UPLOAD_PATH", "/api/upload"),
        ]);
        let settings = load_settings_from(Some(path.as_path()), |key| {
            overrides.get(key).map(|v| v.to_string())
        })
        .expect("settings");

        assert_eq!(settings.server_url, "http://backend:8080");
        assert_eq!(settings.redirect_delay_ms, 100);
        assert_eq!(settings.upload_path, "/api/upload");
        assert_eq!(settings.progress_cap, 90.0);

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn invalid_env_number_is_reported() {
        let err = load_settings_from(None, |key| {
            (key == "REVIEW_CLIENT__PROGRESS_INTERVAL_MS").then(|| "fast".to_string())
        })
        .expect_err("must fail");
        assert!(err.to_string().contains("REVIEW_CLIENT__PROGRESS_INTERVAL_MS"));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("review_client_bad_{suffix}.toml"));
        fs::write(&path, "sever_url = \"typo\"\n").expect("write settings");

        assert!(load_settings_from(Some(path.as_path()), no_env).is_err());
        fs::remove_file(path).expect("cleanup");
    }
}
