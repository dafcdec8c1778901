//! App settings from `pagetree.config.json` and listen address from env/CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "pagetree.config.json";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Raw directory settings. `app_root` is relative to the working directory,
/// `api_root`, `routes` and `base_template` to the app root, `reserved` to the
/// routes directory.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub app_root: String,
    pub api_root: String,
    pub routes: String,
    pub reserved: String,
    pub base_template: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_root: "./app".to_string(),
            api_root: "./api".to_string(),
            routes: "/routes".to_string(),
            reserved: "/_".to_string(),
            base_template: "/index.html".to_string(),
        }
    }
}

impl Settings {
    /// Parse a config file. Empty values keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let data = std::fs::read_to_string(path)?;
        let parsed: Settings = serde_json::from_str(&data)?;
        Ok(parsed.fill_empty())
    }

    /// `from_file`, or defaults with a warning when the file is missing or invalid.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        match Self::from_file(path) {
            Ok(settings) => {
                tracing::info!(
                    config = %path.display(),
                    app_root = %settings.app_root_dir().display(),
                    routes = %settings.routes_dir().display(),
                    reserved = %settings.reserved_dir().display(),
                    base_template = %settings.base_template_path().display(),
                    "using config"
                );
                settings
            }
            Err(e) => {
                tracing::warn!(config = %path.display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Settings rooted somewhere other than `./app`.
    pub fn with_app_root(mut self, app_root: impl Into<String>) -> Self {
        self.app_root = app_root.into();
        self
    }

    fn fill_empty(mut self) -> Self {
        let defaults = Self::default();
        for (value, default) in [
            (&mut self.app_root, defaults.app_root),
            (&mut self.api_root, defaults.api_root),
            (&mut self.routes, defaults.routes),
            (&mut self.reserved, defaults.reserved),
            (&mut self.base_template, defaults.base_template),
        ] {
            if value.trim().is_empty() {
                *value = default;
            }
        }
        self
    }

    pub fn app_root_dir(&self) -> PathBuf {
        PathBuf::from(&self.app_root)
    }

    pub fn api_dir(&self) -> PathBuf {
        join(&self.app_root_dir(), &self.api_root)
    }

    pub fn routes_dir(&self) -> PathBuf {
        join(&self.app_root_dir(), &self.routes)
    }

    pub fn reserved_dir(&self) -> PathBuf {
        join(&self.routes_dir(), &self.reserved)
    }

    pub fn base_template_path(&self) -> PathBuf {
        join(&self.app_root_dir(), &self.base_template)
    }

    /// Directory under the app root, e.g. for static files.
    pub fn app_path(&self, rel: &str) -> PathBuf {
        join(&self.app_root_dir(), rel)
    }
}

// `/routes` under `./app` is `./app/routes`, not `/routes`.
fn join(base: &Path, rel: &str) -> PathBuf {
    let rel = rel.trim_start_matches("./").trim_matches('/');
    if rel.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}

/// Host and port the server binds to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenAddr {
    pub host: String,
    pub port: u16,
}

impl Default for ListenAddr {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ListenAddr {
    /// `HOST` / `PORT` env vars over the defaults; an unparsable port is ignored.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::var("HOST").ok(), std::env::var("PORT").ok())
    }

    pub fn from_vars(host: Option<String>, port: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: host.filter(|h| !h.is_empty()).unwrap_or(defaults.host),
            port: port.and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
        }
    }

    /// Command-line values win over env.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn to_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn paths_resolve_under_app_root() {
        let settings = Settings::default();
        assert_eq!(settings.routes_dir(), PathBuf::from("./app/routes"));
        assert_eq!(settings.reserved_dir(), PathBuf::from("./app/routes/_"));
        assert_eq!(settings.api_dir(), PathBuf::from("./app/api"));
        assert_eq!(
            settings.base_template_path(),
            PathBuf::from("./app/index.html")
        );
        assert_eq!(settings.app_path("static"), PathBuf::from("./app/static"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"appRoot": "site", "routes": "", "baseTemplate": "/layout.html"}"#)
            .unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(
            settings,
            Settings {
                app_root: "site".into(),
                base_template: "/layout.html".into(),
                ..Settings::default()
            }
        );
        assert_eq!(settings.routes_dir(), PathBuf::from("site/routes"));
    }

    #[test]
    fn bad_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(Settings::load(Some(path.as_path())), Settings::default());
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Settings::from_file(&path), Err(CoreError::Json(_))));
        assert_eq!(Settings::load(Some(path.as_path())), Settings::default());
    }

    #[test]
    fn listen_addr_precedence() {
        let addr = ListenAddr::from_vars(Some("0.0.0.0".into()), Some("nope".into()));
        assert_eq!(addr.host, "0.0.0.0");
        assert_eq!(addr.port, DEFAULT_PORT);
        let addr = addr.with_overrides(None, Some(9000));
        assert_eq!(addr.to_addr_string(), "0.0.0.0:9000");
    }
}
