//! Client configuration
//!
//! Provisioning takes an explicit [`ClientConfig`]; nothing reads process
//! environment implicitly. [`ClientConfig::from_env`] is the opt-in reader
//! for serverless deployments that configure credentials through variables.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming a service-account key file
pub const CREDENTIALS_ENV_VAR: &str = "SECRET_ACCOUNT_KEY";

/// Environment variable naming a local emulator (`host:port`)
pub const EMULATOR_HOST_ENV_VAR: &str = "FIRESTORE_EMULATOR_HOST";

/// Database id used when none is configured
pub const DEFAULT_DATABASE: &str = "(default)";

/// Transport settings for the REST client
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Host of the Firestore backend to connect to
    ///
    /// Default: "firestore.googleapis.com"
    pub host: String,

    /// Whether to use SSL for communication
    ///
    /// Default: true
    pub ssl_enabled: bool,

    /// Per-request timeout
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Connection establishment timeout
    ///
    /// Default: 10 seconds
    pub connect_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "firestore.googleapis.com".to_string(),
            ssl_enabled: true,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    /// Creates default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// REST API root, e.g. `https://firestore.googleapis.com/v1`
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl_enabled { "https" } else { "http" };
        format!("{}://{}/v1", scheme, self.host.trim_end_matches('/'))
    }
}

/// Where access tokens come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// Application default credentials
    ///
    /// Uses the key file named by `GOOGLE_APPLICATION_CREDENTIALS` if set,
    /// otherwise the metadata server of the hosting Google Cloud runtime.
    Ambient,

    /// Service-account key file
    FilePath(PathBuf),

    /// No credentials (local emulator)
    None,
}

/// Everything needed to provision a client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Google Cloud project id
    pub project_id: String,
    /// Database id within the project
    pub database_id: String,
    /// Token source
    pub credentials: CredentialsSource,
    /// Transport settings
    pub settings: Settings,
}

impl ClientConfig {
    /// Config for `project_id` using ambient credentials and the default database
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE.to_string(),
            credentials: CredentialsSource::Ambient,
            settings: Settings::default(),
        }
    }

    /// Config pointing at a local emulator without credentials
    pub fn emulator(project_id: impl Into<String>, host: impl Into<String>) -> Self {
        Self::new(project_id)
            .with_credentials(CredentialsSource::None)
            .with_settings(Settings {
                host: host.into(),
                ssl_enabled: false,
                ..Settings::default()
            })
    }

    /// Build a config from `SECRET_ACCOUNT_KEY` and `FIRESTORE_EMULATOR_HOST`
    ///
    /// The emulator wins when both are set. Without either, ambient
    /// credentials are used.
    pub fn from_env(project_id: impl Into<String>) -> Self {
        let key_file = std::env::var(CREDENTIALS_ENV_VAR).ok().filter(|v| !v.is_empty());
        let emulator = std::env::var(EMULATOR_HOST_ENV_VAR).ok().filter(|v| !v.is_empty());
        Self::from_values(project_id, key_file, emulator)
    }

    fn from_values(project_id: impl Into<String>, key_file: Option<String>, emulator: Option<String>) -> Self {
        if let Some(host) = emulator {
            return Self::emulator(project_id, host);
        }
        match key_file {
            Some(path) => Self::new(project_id).with_credentials(CredentialsSource::FilePath(PathBuf::from(path))),
            None => Self::new(project_id),
        }
    }

    /// Use a different database
    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Use a different token source
    pub fn with_credentials(mut self, credentials: CredentialsSource) -> Self {
        self.credentials = credentials;
        self
    }

    /// Use different transport settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// `projects/{project}/databases/{database}`
    pub fn database_path(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }
}
