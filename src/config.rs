//! Run configuration: which project, which dashboard page, which env file.

use crate::error::SupakeyError;
use crate::validation::is_valid_env_key;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PROJECT_REF: &str = "ohkueislstxomdjavyhs";
pub const DEFAULT_DASHBOARD_URL: &str =
    "https://app.supabase.com/project/{project_ref}/settings/api";
pub const DEFAULT_ENV_FILE: &str = ".env.local";
pub const DEFAULT_VARIABLE: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Everything a sync run needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub project_ref: String,
    pub dashboard_url: String,
    pub env_file: PathBuf,
    pub variable: String,
    /// `None` skips automated extraction.
    pub browser: Option<BrowserConfig>,
    /// Key supplied up front; bypasses both extraction stages.
    pub direct_key: Option<String>,
}

impl SyncConfig {
    pub fn new(project_ref: impl Into<String>, env_file: impl Into<PathBuf>) -> Self {
        let project_ref = project_ref.into();
        Self {
            dashboard_url: dashboard_url_for(DEFAULT_DASHBOARD_URL, &project_ref),
            project_ref,
            env_file: env_file.into(),
            variable: DEFAULT_VARIABLE.to_string(),
            browser: Some(BrowserConfig::default()),
            direct_key: None,
        }
    }

    /// Set the dashboard URL; `{project_ref}` is substituted.
    pub fn dashboard_url(mut self, template: &str) -> Self {
        self.dashboard_url = dashboard_url_for(template, &self.project_ref);
        self
    }

    pub fn variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    pub fn browser(mut self, browser: Option<BrowserConfig>) -> Self {
        self.browser = browser;
        self
    }

    pub fn direct_key(mut self, key: Option<String>) -> Self {
        self.direct_key = key;
        self
    }

    pub fn validate(&self) -> Result<(), SupakeyError> {
        if self.project_ref.trim().is_empty() {
            return Err(SupakeyError::Config(
                "Project reference cannot be empty".to_string(),
            ));
        }

        if !is_valid_env_key(&self.variable) {
            return Err(SupakeyError::Config(format!(
                "Invalid variable '{}' (must match [A-Za-z_][A-Za-z0-9_]*)",
                self.variable
            )));
        }

        check_http_url("dashboard URL", &self.dashboard_url)?;
        if let Some(browser) = &self.browser {
            check_http_url("WebDriver URL", &browser.webdriver_url)?;
        }

        Ok(())
    }
}

pub fn dashboard_url_for(template: &str, project_ref: &str) -> String {
    template.replace("{project_ref}", project_ref)
}

/// Resolve the env file against the project directory unless it is absolute.
pub fn resolve_env_file(project_dir: &Path, env_file: &Path) -> PathBuf {
    if env_file.is_absolute() {
        env_file.to_path_buf()
    } else {
        project_dir.join(env_file)
    }
}

fn check_http_url(what: &str, value: &str) -> Result<(), SupakeyError> {
    let url = Url::parse(value)
        .map_err(|e| SupakeyError::Config(format!("Invalid {} '{}': {}", what, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SupakeyError::Config(format!(
            "Invalid {} '{}': unsupported scheme '{}'",
            what, value, other
        ))),
    }
}

/// WebDriver session settings for automated extraction.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// WebDriver server URL (chromedriver listens on 9515 by default)
    pub webdriver_url: String,

    /// Chrome profile directory, reused across runs so a dashboard login sticks
    pub user_data_dir: PathBuf,

    /// Fixed wait after navigation for client-side rendering
    pub settle: Duration,

    pub headless: bool,

    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            user_data_dir: default_user_data_dir(),
            settle: Duration::from_secs(5),
            headless: false,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = dir.into();
        self
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn add_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Chrome command line switches for this session.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            format!("--user-data-dir={}", self.user_data_dir.display()),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

pub fn default_user_data_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("supakey").join("chrome-profile"))
        .unwrap_or_else(|| std::env::temp_dir().join("supakey-chrome-profile"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dashboard_url_uses_project_ref() {
        let config = SyncConfig::new("abc123", ".env.local");
        assert_eq!(
            config.dashboard_url,
            "https://app.supabase.com/project/abc123/settings/api"
        );
        assert_eq!(config.variable, DEFAULT_VARIABLE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_dashboard_template() {
        let config = SyncConfig::new("abc123", ".env.local")
            .dashboard_url("http://127.0.0.1:8080/{project_ref}/api");
        assert_eq!(config.dashboard_url, "http://127.0.0.1:8080/abc123/api");
    }

    #[test]
    fn test_validate_rejects_bad_variable() {
        let config = SyncConfig::new("abc123", ".env.local").variable("BAD-NAME");
        assert!(matches!(config.validate(), Err(SupakeyError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let config = SyncConfig::new("abc123", ".env.local").dashboard_url("not a url");
        assert!(config.validate().is_err());

        let config = SyncConfig::new("abc123", ".env.local").dashboard_url("ftp://x/{project_ref}");
        assert!(config.validate().is_err());

        let config = SyncConfig::new("abc123", ".env.local")
            .browser(Some(BrowserConfig::new().webdriver_url("localhost")));
        assert!(config.validate().is_err());

        // no browser, so the WebDriver URL is irrelevant
        let config = SyncConfig::new("abc123", ".env.local").browser(None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_project_ref() {
        let config = SyncConfig::new("  ", ".env.local");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_env_file() {
        assert_eq!(
            resolve_env_file(Path::new("/work/app"), Path::new(".env.local")),
            PathBuf::from("/work/app/.env.local")
        );
        assert_eq!(
            resolve_env_file(Path::new("/work/app"), Path::new("/etc/app.env")),
            PathBuf::from("/etc/app.env")
        );
    }

    #[test]
    fn test_chrome_args() {
        let args = BrowserConfig::new()
            .user_data_dir("/tmp/profile")
            .headless(true)
            .add_arg("--window-size=1280,800")
            .chrome_args();
        assert_eq!(
            args,
            vec![
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--user-data-dir=/tmp/profile",
                "--headless=new",
                "--window-size=1280,800",
            ]
        );
    }
}
