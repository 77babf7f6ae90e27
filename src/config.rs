use anyhow::{Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_QUERY: &str =
    "List-Unsubscribe OR category:promotions OR unsubscribe OR manage preferences";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";
pub const DEFAULT_CSV_PATH: &str = "services.csv";
pub const DEFAULT_LOG_PATH: &str = "unsubscribe_services.log";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub client_id: String,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    /// Gmail search expression selecting candidate messages.
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Upper bound on messages taken from the search.
    pub max_messages: Option<usize>,
    /// Emit a `Failed` row when an unsubscribe request fails instead of
    /// leaving the sender out of the results.
    #[serde(default)]
    pub record_failures: bool,
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

fn default_csv_path() -> PathBuf {
    PathBuf::from(DEFAULT_CSV_PATH)
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            user_email: None,
            redirect_uri: None,
            query: default_query(),
            csv_path: default_csv_path(),
            log_path: default_log_path(),
            max_messages: None,
            record_failures: false,
        }
    }
}

impl Config {
    fn template() -> Self {
        Self {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            user_email: Some("you@example.com".to_string()),
            redirect_uri: Some(DEFAULT_REDIRECT_URI.to_string()),
            ..Self::default()
        }
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI)
    }

    pub fn user_email(&self) -> Result<&str> {
        self.user_email
            .as_deref()
            .ok_or_else(|| anyhow!("user_email not set in config"))
    }
}

/// `<config dir>/mail_unsubscriber`, created on first use.
pub fn app_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join("mail_unsubscriber");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Reads the config at `path`. A missing file is replaced by an editable
/// template and reported as an error.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        fs::write(path, toml::to_string_pretty(&Config::template())?)?;
        return Err(anyhow!(
            "Created template config at {} - edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)
        .map_err(|e| anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

/// Config for a run. A bearer token given on the command line needs none of
/// the OAuth fields, so in that case an unusable config falls back to defaults.
pub fn config_for_run(loaded: Result<Config>, have_access_token: bool) -> Result<Config> {
    match loaded {
        Ok(cfg) => Ok(cfg),
        Err(e) if have_access_token => {
            warn!("Configuration unavailable ({e}); using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(anyhow!("Configuration error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg: Config = toml::from_str(r#"client_id = "abc""#).unwrap();
        assert_eq!(cfg.query, DEFAULT_QUERY);
        assert_eq!(cfg.csv_path, PathBuf::from("services.csv"));
        assert_eq!(cfg.log_path, PathBuf::from("unsubscribe_services.log"));
        assert_eq!(cfg.redirect_uri(), DEFAULT_REDIRECT_URI);
        assert!(!cfg.record_failures);
        assert!(cfg.max_messages.is_none());
        assert!(cfg.user_email().is_err());
    }

    #[test]
    fn missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(load_config_from(&path).is_err());
        assert!(path.exists());

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg, Config::template());
    }

    #[test]
    fn access_token_runs_without_config() {
        let cfg = config_for_run(Err(anyhow!("no file")), true).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.query, DEFAULT_QUERY);
        assert_eq!(cfg.log_path, PathBuf::from(DEFAULT_LOG_PATH));

        let err = config_for_run(Err(anyhow!("no file")), false).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));

        let own = Config {
            query: "label:news".into(),
            ..Config::default()
        };
        assert_eq!(config_for_run(Ok(own.clone()), true).unwrap(), own);
    }

    #[test]
    fn overrides_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
client_id = "id"
user_email = "me@x.com"
query = "category:promotions"
max_messages = 25
record_failures = true
"#,
        )
        .unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.query, "category:promotions");
        assert_eq!(cfg.max_messages, Some(25));
        assert!(cfg.record_failures);
        assert_eq!(cfg.user_email().unwrap(), "me@x.com");
    }
}
