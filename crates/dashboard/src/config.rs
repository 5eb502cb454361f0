//! Dashboard configuration.

use serde::{Deserialize, Serialize};

use hrdesk_auth::{Module, PermissionPolicy};

/// Keys under which the session halves are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    pub token: String,
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: "token".to_string(),
            user: "user".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the backend API (no trailing slash).
    pub api_base_url: String,
    pub storage_keys: StorageKeys,
    /// Where the Route Guard sends anonymous visitors.
    pub login_path: String,
    /// Paths reachable without a session.
    pub public_paths: Vec<String>,
    pub installed_apps: Vec<Module>,
    /// Title shown for paths the title table does not know.
    pub default_title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            storage_keys: StorageKeys::default(),
            login_path: "/login".to_string(),
            public_paths: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/forgot-password".to_string(),
            ],
            installed_apps: Module::ALL.to_vec(),
            default_title: crate::title::DEFAULT_TITLE.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Defaults overlaid with `HRDESK_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("HRDESK_API_URL") {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = var("HRDESK_TOKEN_KEY") {
            self.storage_keys.token = key;
        }
        if let Some(key) = var("HRDESK_USER_KEY") {
            self.storage_keys.user = key;
        }
        if let Some(apps) = var("HRDESK_INSTALLED_APPS") {
            self.installed_apps = parse_installed_apps(&apps);
        }
        self
    }

    pub fn permission_policy(&self) -> PermissionPolicy {
        PermissionPolicy::new(self.installed_apps.iter().copied())
    }
}

fn parse_installed_apps(raw: &str) -> Vec<Module> {
    raw.split(',')
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .filter_map(|slug| {
            let module = Module::from_slug(slug);
            if module.is_none() {
                tracing::warn!(app = %slug, "ignoring unknown app in HRDESK_INSTALLED_APPS");
            }
            module
        })
        .collect()
}
