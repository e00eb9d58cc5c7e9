//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--url`, `--token`, `--system`, etc.)
//! 2. Explicit `--config` file
//! 3. `$HYPER_IDE_CONFIG` environment variable (path to config file)
//! 4. Project-local `.hyper-ide.toml` in the current working directory
//! 5. Global `~/.config/hyper-ide/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::ide::documents::{FileTypes, DEFAULT_EXTENSIONS};
use crate::ide::macros::DEFAULT_ROLE;
use crate::ide::WorkspaceOptions;
use crate::store::http::DEFAULT_TIMEOUT_SECS;

// ── Section configs ──────────────────────────────────────────────────────────

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the Magic backend, e.g. `https://api.example.com`.
    pub url: Option<String>,
    /// JWT bearer token.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Confirm before delete operations.
    pub confirm_delete: Option<bool>,
    /// List `/system/`, `/misc/`, `/data/` and `/config/`.
    pub show_system: Option<bool>,
}

/// Editor settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    /// Extensions opened in the editor; anything else gets fallback actions.
    pub extensions: Option<Vec<String>>,
    /// Spaces inserted by Tab.
    pub tab_width: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MacrosConfig {
    /// Role passed to `auth`/`role`/`roles` macro arguments.
    pub default_role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `hyper_ide=debug`.
    pub level: Option<String>,
    /// Directory for rolling log files.
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DownloadConfig {
    /// Local directory downloads are written to.
    pub dir: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub general: GeneralConfig,
    pub editor: EditorConfig,
    pub macros: MacrosConfig,
    pub logging: LoggingConfig,
    pub download: DownloadConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default Tab width in the editor.
pub const DEFAULT_TAB_WIDTH: usize = 3;
/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("HYPER_IDE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".hyper-ide.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("hyper-ide").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr, since
/// logging is configured from the result).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            backend: BackendConfig {
                url: other.backend.url.clone().or(self.backend.url),
                token: other.backend.token.clone().or(self.backend.token),
                timeout_secs: other.backend.timeout_secs.or(self.backend.timeout_secs),
            },
            general: GeneralConfig {
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
                show_system: other.general.show_system.or(self.general.show_system),
            },
            editor: EditorConfig {
                extensions: other
                    .editor
                    .extensions
                    .clone()
                    .or(self.editor.extensions),
                tab_width: other.editor.tab_width.or(self.editor.tab_width),
            },
            macros: MacrosConfig {
                default_role: other
                    .macros
                    .default_role
                    .clone()
                    .or(self.macros.default_role),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
                dir: other.logging.dir.clone().or(self.logging.dir),
            },
            download: DownloadConfig {
                dir: other.download.dir.clone().or(self.download.dir),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher ones overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Backend URL; required.
    pub fn backend_url(&self) -> Result<&str> {
        self.backend
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                AppError::Config("no backend URL; pass --url or set [backend] url".into())
            })
    }

    pub fn token(&self) -> Option<String> {
        self.backend.token.clone().filter(|t| !t.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    pub fn show_system(&self) -> bool {
        self.general.show_system.unwrap_or(false)
    }

    pub fn file_types(&self) -> FileTypes {
        match &self.editor.extensions {
            Some(exts) => FileTypes::new(exts),
            None => FileTypes::new(DEFAULT_EXTENSIONS.iter().copied()),
        }
    }

    pub fn tab_width(&self) -> usize {
        self.editor
            .tab_width
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_TAB_WIDTH)
    }

    pub fn default_role(&self) -> &str {
        self.macros.default_role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Log directory; defaults to `<data dir>/hyper-ide/logs`.
    pub fn log_dir(&self) -> PathBuf {
        match &self.logging.dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("hyper-ide")
                .join("logs"),
        }
    }

    /// Download directory; defaults to the user's download folder.
    pub fn download_dir(&self) -> PathBuf {
        match &self.download.dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Workspace behavior derived from this configuration.
    pub fn workspace_options(&self) -> WorkspaceOptions {
        WorkspaceOptions {
            include_system: self.show_system(),
            confirm_delete: self.confirm_delete(),
            default_role: self.default_role().to_string(),
            file_types: self.file_types(),
            download_dir: self.download_dir(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert!(cfg.backend_url().is_err());
        assert_eq!(cfg.token(), None);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert!(cfg.confirm_delete());
        assert!(!cfg.show_system());
        assert_eq!(cfg.tab_width(), 3);
        assert_eq!(cfg.default_role(), "root");
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.file_types().is_supported("/a.hl"));
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[backend]
url = "https://api.example.com"
token = "abc"
timeout_secs = 5

[general]
confirm_delete = false
show_system = true

[editor]
extensions = ["hl", "png"]
tab_width = 2

[macros]
default_role = "admin"

[logging]
level = "debug"
dir = "/tmp/hyper-logs"

[download]
dir = "/tmp/downloads"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.backend_url().unwrap(), "https://api.example.com");
        assert_eq!(cfg.token().as_deref(), Some("abc"));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert!(!cfg.confirm_delete());
        assert!(cfg.show_system());
        assert!(cfg.file_types().is_supported("/logo.png"));
        assert!(!cfg.file_types().is_supported("/x.sql"));
        assert_eq!(cfg.tab_width(), 2);
        assert_eq!(cfg.default_role(), "admin");
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.log_dir(), PathBuf::from("/tmp/hyper-logs"));
        assert_eq!(cfg.download_dir(), PathBuf::from("/tmp/downloads"));
    }

    #[test]
    fn test_toml_parsing_partial() {
        let cfg: AppConfig = toml::from_str("[general]\nshow_system = true\n").expect("parse failed");
        assert!(cfg.show_system());
        assert!(cfg.confirm_delete());
        assert_eq!(cfg.tab_width(), DEFAULT_TAB_WIDTH);
    }

    #[test]
    fn test_blank_url_and_token_are_unset() {
        let cfg: AppConfig =
            toml::from_str("[backend]\nurl = \"  \"\ntoken = \"\"\n").expect("parse failed");
        assert!(matches!(cfg.backend_url(), Err(AppError::Config(_))));
        assert_eq!(cfg.token(), None);
    }

    #[test]
    fn test_zero_tab_width_falls_back() {
        let cfg: AppConfig = toml::from_str("[editor]\ntab_width = 0\n").expect("parse failed");
        assert_eq!(cfg.tab_width(), DEFAULT_TAB_WIDTH);
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            backend: BackendConfig {
                url: Some("https://a".into()),
                token: Some("t1".into()),
                ..Default::default()
            },
            general: GeneralConfig {
                confirm_delete: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let over = AppConfig {
            backend: BackendConfig {
                url: Some("https://b".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert_eq!(merged.backend_url().unwrap(), "https://b");
        assert_eq!(merged.token().as_deref(), Some("t1"));
        assert!(!merged.confirm_delete());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[backend]
url = "http://localhost:5000"

[macros]
default_role = "admin"
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.backend_url().unwrap(), "http://localhost:5000");
        assert_eq!(cfg.default_role(), "admin");
        assert!(cfg.confirm_delete());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[backend]
url = "http://from-file"
token = "file-token"
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            backend: BackendConfig {
                url: Some("http://from-cli".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert_eq!(cfg.backend_url().unwrap(), "http://from-cli");
        assert_eq!(cfg.token().as_deref(), Some("file-token"));
    }

    #[test]
    fn test_workspace_options() {
        let cfg: AppConfig = toml::from_str(
            r#"
[general]
confirm_delete = false
show_system = true

[macros]
default_role = "admin"

[download]
dir = "/tmp/dl"
"#,
        )
        .expect("parse failed");
        let options = cfg.workspace_options();
        assert!(options.include_system);
        assert!(!options.confirm_delete);
        assert_eq!(options.default_role, "admin");
        assert_eq!(options.download_dir, PathBuf::from("/tmp/dl"));
    }
}
