use std::{collections::HashMap, fs, path::Path, time::Duration};

use booking_core::{remote::DEFAULT_REQUEST_TIMEOUT, DEFAULT_HIGHLIGHT_TTL};
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "frontdesk.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub highlight_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8001".into(),
            highlight_ttl: DEFAULT_HIGHLIGHT_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Defaults, then the settings file, then environment variables.
pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                let text = |key: &str| file_cfg.get(key).and_then(value_text);
                if let Some(v) = text("backend_url") {
                    settings.backend_url = v;
                }
                if let Some(v) = text("highlight_ttl_ms") {
                    apply_millis(&mut settings.highlight_ttl, "highlight_ttl_ms", &v);
                }
                if let Some(v) = text("request_timeout_secs") {
                    apply_secs(&mut settings.request_timeout, "request_timeout_secs", &v);
                }
            }
            Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable settings file"),
        }
    }

    if let Some(v) = env("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = env("APP__HIGHLIGHT_TTL_MS") {
        apply_millis(&mut settings.highlight_ttl, "APP__HIGHLIGHT_TTL_MS", &v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_secs(&mut settings.request_timeout, "APP__REQUEST_TIMEOUT_SECS", &v);
    }

    settings
}

fn value_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text.clone()),
        toml::Value::Integer(number) => Some(number.to_string()),
        _ => None,
    }
}

fn apply_millis(target: &mut Duration, key: &str, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(ms) => *target = Duration::from_millis(ms),
        Err(_) => warn!(key, value = raw, "ignoring non-numeric setting"),
    }
}

fn apply_secs(target: &mut Duration, key: &str, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => *target = Duration::from_secs(secs),
        _ => warn!(key, value = raw, "ignoring invalid timeout setting"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_settings_file(tag: &str, contents: &str) -> std::path::PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("frontdesk_settings_{tag}_{suffix}.toml"));
        fs::write(&path, contents).expect("write settings");
        path
    }

    #[test]
    fn missing_file_and_env_yield_defaults() {
        let settings = load_settings_with(Path::new("/nonexistent/frontdesk.toml"), |_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.highlight_ttl, Duration::from_secs(3));
    }

    #[test]
    fn file_values_override_defaults() {
        let path = temp_settings_file(
            "file",
            r#"
backend_url = "http://hotel.internal:9000"
highlight_ttl_ms = 1500
request_timeout_secs = "4"
"#,
        );

        let settings = load_settings_with(&path, |_| None);

        assert_eq!(settings.backend_url, "http://hotel.internal:9000");
        assert_eq!(settings.highlight_ttl, Duration::from_millis(1500));
        assert_eq!(settings.request_timeout, Duration::from_secs(4));
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn environment_overrides_file_and_app_prefix_wins() {
        let path = temp_settings_file("env", "backend_url = \"http://from-file:1\"\n");
        let env = |key: &str| match key {
            "BACKEND_URL" => Some("http://from-env:2".to_string()),
            "APP__BACKEND_URL" => Some("http://from-app-env:3".to_string()),
            "APP__HIGHLIGHT_TTL_MS" => Some("250".to_string()),
            _ => None,
        };

        let settings = load_settings_with(&path, env);

        assert_eq!(settings.backend_url, "http://from-app-env:3");
        assert_eq!(settings.highlight_ttl, Duration::from_millis(250));
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn invalid_numbers_keep_previous_values() {
        let path = temp_settings_file(
            "invalid",
            "highlight_ttl_ms = \"soon\"\nrequest_timeout_secs = 0\n",
        );

        let settings = load_settings_with(&path, |_| None);

        assert_eq!(settings.highlight_ttl, DEFAULT_HIGHLIGHT_TTL);
        assert_eq!(settings.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        fs::remove_file(path).expect("cleanup");
    }
}
