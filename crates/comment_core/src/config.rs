use std::{fs, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use shared::protocol::DEFAULT_PAGE_SIZE;
use tracing::warn;

use crate::sync::SyncPolicy;

pub const DEFAULT_SETTINGS_FILE: &str = "comments.toml";
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub page_size: u32,
    pub request_timeout_secs: Option<u64>,
    pub refetch_after_mutation: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: None,
            refetch_after_mutation: true,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        SyncPolicy {
            page_size: self.page_size,
            refetch_after_mutation: self.refetch_after_mutation,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
    refetch_after_mutation: Option<bool>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

/// Defaults, then the TOML file at `path`, then environment variables.
pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(
                path = %path.display(),
                "comments: ignoring unreadable settings file: {err}"
            ),
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.page_size = settings.page_size.clamp(1, MAX_PAGE_SIZE);
    settings
}

fn apply_file(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.refetch_after_mutation {
        settings.refetch_after_mutation = v;
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("COMMENTS_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = parsed_env(&var, "APP__PAGE_SIZE") {
        settings.page_size = v;
    }
    if let Some(v) = parsed_env(&var, "APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = parsed_env(&var, "APP__REFETCH_AFTER_MUTATION") {
        settings.refetch_after_mutation = v;
    }
}

fn parsed_env<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %raw, "comments: ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_settings_file(contents: &str) -> std::path::PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("comment_core_settings_{suffix}.toml"));
        fs::write(&path, contents).expect("write settings");
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings_from(Path::new("/nonexistent/comments.toml"));
        assert_eq!(settings.page_size, 3);
        assert!(settings.refetch_after_mutation);
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = temp_settings_file(concat!(
            "api_base_url = \"http://qa.example/api\"\n",
            "page_size = 500\n",
            "request_timeout_secs = 7\n",
            "refetch_after_mutation = false\n",
        ));
        let settings = load_settings_from(&path);
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.api_base_url, "http://qa.example/api");
        assert_eq!(settings.page_size, MAX_PAGE_SIZE);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(7)));
        assert!(!settings.sync_policy().refetch_after_mutation);
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let path = temp_settings_file("page_size = \"many\"");
        let settings = load_settings_from(&path);
        fs::remove_file(&path).expect("cleanup");
        assert_eq!(settings.page_size, ClientSettings::default().page_size);
    }

    #[test]
    fn app_prefixed_env_wins_and_bad_values_are_skipped() {
        let vars: HashMap<&str, &str> = [
            ("COMMENTS_API_URL", "http://legacy"),
            ("APP__API_BASE_URL", "http://preferred"),
            ("APP__PAGE_SIZE", "five"),
            ("APP__REFETCH_AFTER_MUTATION", "false"),
        ]
        .into_iter()
        .collect();
        let mut settings = ClientSettings::default();
        apply_env(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.api_base_url, "http://preferred");
        assert_eq!(settings.page_size, 3);
        assert!(!settings.refetch_after_mutation);
    }
}
